//! Chunked streaming of sample buffers.
//!
//! A channel transfer becomes a run of channel-data messages. Every message
//! leads with an `Int32` holding the absolute index of its first sample,
//! followed by up to `chunk_limit` `Float32` samples. Chunk boundaries sit on
//! absolute multiples of `chunk_limit`, so the peer can place every chunk
//! without tracking order.

use oscrelay_transport::DatagramTransport;
use oscrelay_wire::{MessageWriter, TypedValue};
use tracing::{debug, trace};

use crate::config::StreamConfig;
use crate::error::{RelayError, Result};
use crate::router;
use crate::sample::Channel;

/// Position of an in-flight channel transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCursor {
    pub channel: Channel,
    /// Absolute index of the next sample to send.
    pub next_index: usize,
}

impl ChunkCursor {
    fn at_boundary(&self, chunk_limit: usize) -> bool {
        self.next_index % chunk_limit == 0
    }

    fn slot(&self) -> Result<TypedValue> {
        i32::try_from(self.next_index)
            .map(TypedValue::Int32)
            .map_err(|_| {
                RelayError::InvalidArgumentType(format!(
                    "sample index {} does not fit Int32",
                    self.next_index
                ))
            })
    }
}

/// Outcome of one channel transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub channel: Channel,
    pub chunks_sent: usize,
    pub samples_sent: usize,
    /// Trailing samples left unsent because tail flushing is off.
    pub samples_dropped: usize,
    pub next_index: usize,
}

/// Splits one channel's samples into paced chunks and sends them.
///
/// The encoder borrows the session's writer for the duration of a transfer,
/// so nothing else can interleave messages on that session meanwhile.
pub struct ChunkedStreamEncoder<'a, T> {
    writer: &'a mut MessageWriter<T>,
    config: &'a StreamConfig,
}

impl<'a, T: DatagramTransport> ChunkedStreamEncoder<'a, T> {
    pub fn new(writer: &'a mut MessageWriter<T>, config: &'a StreamConfig) -> Self {
        Self { writer, config }
    }

    /// Send `samples[start_index..]` on `channel`.
    ///
    /// A transport failure aborts the transfer; chunks already sent stay sent.
    pub async fn stream(
        &mut self,
        channel: Channel,
        start_index: usize,
        samples: &[f32],
    ) -> Result<StreamReport> {
        let limit = self.config.chunk_limit.max(1);
        let mut cursor = ChunkCursor {
            channel,
            next_index: start_index,
        };
        let mut report = StreamReport {
            channel,
            chunks_sent: 0,
            samples_sent: 0,
            samples_dropped: 0,
            next_index: start_index,
        };

        let mut args = Vec::with_capacity(limit + 1);
        args.push(cursor.slot()?);

        for &sample in samples.iter().skip(start_index) {
            args.push(TypedValue::Float32(sample));
            cursor.next_index += 1;

            if cursor.at_boundary(limit) {
                self.emit(&cursor, &mut args, &mut report)?;
                tokio::time::sleep(self.config.pacing).await;
                args.push(cursor.slot()?);
            }
        }

        let pending = args.len().saturating_sub(1);
        if pending > 0 {
            if self.config.flush_tail {
                self.emit(&cursor, &mut args, &mut report)?;
            } else {
                report.samples_dropped = pending;
                debug!(
                    channel = %channel,
                    dropped = pending,
                    "trailing partial chunk dropped"
                );
            }
        }

        report.next_index = cursor.next_index;
        debug!(
            channel = %channel,
            chunks = report.chunks_sent,
            samples = report.samples_sent,
            "channel transfer finished"
        );
        Ok(report)
    }

    fn emit(
        &mut self,
        cursor: &ChunkCursor,
        args: &mut Vec<TypedValue>,
        report: &mut StreamReport,
    ) -> Result<()> {
        let samples = args.len() - 1;
        let message = router::channel_chunk(cursor.channel, std::mem::take(args))?;
        self.writer.send(&message)?;
        report.chunks_sent += 1;
        report.samples_sent += samples;
        trace!(
            channel = %cursor.channel,
            first_index = cursor.next_index - samples,
            samples,
            "chunk sent"
        );
        Ok(())
    }
}

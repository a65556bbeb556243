use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use oscrelay_wire::address::address_label;
use oscrelay_wire::{TypedValue, WireMessage};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Longest argument list shown in table and pretty output.
const ARG_PREVIEW: usize = 8;

#[derive(Serialize)]
struct MessageOutput<'a> {
    address: &'a str,
    label: &'static str,
    type_tags: String,
    args: &'a [TypedValue],
    remote: String,
    timestamp: String,
}

/// Print one message; `remote` is where it came from or went to.
pub fn print_message(msg: &WireMessage, remote: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                address: msg.address(),
                label: address_label(msg.address()),
                type_tags: msg.type_tags(),
                args: msg.args(),
                remote: remote.to_string(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "TAGS", "ARGS", "REMOTE"])
                .add_row(vec![
                    msg.address().to_string(),
                    msg.type_tags(),
                    args_preview(msg.args()),
                    remote.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} ({}) args={} [{}] remote={}",
                msg.address(),
                address_label(msg.address()),
                msg.args().len(),
                args_preview(msg.args()),
                remote
            );
        }
        OutputFormat::Raw => print_raw(&format!("{msg}\n")),
    }
}

pub fn print_raw(text: &str) {
    let mut out = std::io::stdout();
    let _ = out.write_all(text.as_bytes());
    let _ = out.flush();
}

fn args_preview(args: &[TypedValue]) -> String {
    let mut shown: Vec<String> = args.iter().take(ARG_PREVIEW).map(|a| a.to_string()).collect();
    if args.len() > ARG_PREVIEW {
        shown.push(format!("... +{}", args.len() - ARG_PREVIEW));
    }
    shown.join(" ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

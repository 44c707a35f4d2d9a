use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use lpc_packet::Command;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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

/// One decoded packet of a packet file.
#[derive(Debug, Serialize)]
pub struct PacketRow {
    pub index: usize,
    pub name: &'static str,
    /// Unframed packet bytes as hex.
    pub payload: String,
    pub command: Command,
}

impl PacketRow {
    pub fn new(index: usize, payload: &[u8], command: Command) -> Self {
        Self {
            index,
            name: command.name(),
            payload: hex(payload),
            command,
        }
    }

    fn address(&self) -> String {
        self.command
            .address()
            .map_or_else(|| "-".to_string(), |mask| mask.to_string())
    }

    /// `key=value` pairs for every field except the address.
    pub fn fields(&self) -> String {
        let mut pairs = Vec::new();
        if let Ok(value) = serde_json::to_value(&self.command) {
            flatten(&value, &mut pairs);
        }
        pairs.join(" ")
    }
}

fn flatten(value: &Value, pairs: &mut Vec<String>) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, value) in map {
        match (key.as_str(), value) {
            ("kind" | "op" | "address", _) => {}
            (_, Value::Object(_)) => flatten(value, pairs),
            (_, Value::String(text)) => pairs.push(format!("{key}={text:?}")),
            _ => pairs.push(format!("{key}={value}")),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_packets(rows: &[PacketRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "COMMAND", "ADDRESS", "FIELDS"]);
            for row in rows {
                table.add_row(vec![
                    row.index.to_string(),
                    row.name.to_string(),
                    row.address(),
                    row.fields(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!(
                    "{:>5} {:<15} {:<8} {}",
                    row.index,
                    row.name,
                    row.address(),
                    row.fields()
                );
            }
        }
    }
}

//! CLI output helpers: message prefixes, value formats and the listing table.

use std::io::{self, Write};

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use crate::transient::Listing;

// == Format ==
/// How values are printed (or parsed, for writes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Strings verbatim, anything else as pretty JSON
    #[default]
    Plain,
    /// Aligned columns (listings only)
    Table,
    Json,
    Yaml,
}

// == Console ==
/// Where command output goes. Messages go to `out`, warnings to `err`.
pub struct Console<'a> {
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self { out, err }
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "Success: {text}")
    }

    pub fn warning(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.err, "Warning: {text}")
    }
}

// == Values ==
/// Renders a single value in `format`.
pub fn render_value(value: &Value, format: Format) -> Result<String> {
    let rendered = match format {
        Format::Plain | Format::Table => match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other)?,
        },
        Format::Json => serde_json::to_string(value)?,
        Format::Yaml => serde_yaml::to_string(value)?.trim_end().to_string(),
    };
    Ok(rendered)
}

/// Reads a command-line value: JSON when asked for, a plain string otherwise.
pub fn parse_value(raw: &str, format: Format) -> Result<Value> {
    match format {
        Format::Json => Ok(serde_json::from_str(raw)?),
        Format::Yaml => Ok(serde_yaml::from_str(raw)?),
        Format::Plain | Format::Table => Ok(Value::String(raw.to_string())),
    }
}

// == Listing ==
#[derive(Debug, Clone, Serialize)]
struct ListingRow {
    key: String,
    value: Value,
    expiration: String,
}

/// Renders a listing as a table, or as a JSON / YAML array of rows.
pub fn render_listing(listing: Vec<Listing>, now: i64, format: Format) -> Result<String> {
    let rows: Vec<ListingRow> = listing
        .into_iter()
        .map(|entry| ListingRow {
            expiration: expiration_label(entry.timeout, now),
            key: entry.key,
            value: entry.value,
        })
        .collect();

    match format {
        Format::Json => Ok(serde_json::to_string(&rows)?),
        Format::Yaml => Ok(serde_yaml::to_string(&rows)?.trim_end().to_string()),
        Format::Plain | Format::Table => Ok(render_table(&rows)),
    }
}

fn render_table(rows: &[ListingRow]) -> String {
    let cells: Vec<[String; 3]> = rows
        .iter()
        .map(|row| {
            let value = match &row.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            [row.key.clone(), value, row.expiration.clone()]
        })
        .collect();

    let header = ["key", "value", "expiration"];
    let mut widths = header.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let divider = format!(
        "+-{}-+-{}-+-{}-+",
        "-".repeat(widths[0]),
        "-".repeat(widths[1]),
        "-".repeat(widths[2])
    );
    let format_row = |row: [&str; 3]| {
        format!(
            "| {:<w0$} | {:<w1$} | {:<w2$} |",
            row[0],
            row[1],
            row[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )
    };

    let mut lines = vec![divider.clone(), format_row(header), divider.clone()];
    for row in &cells {
        lines.push(format_row([row[0].as_str(), row[1].as_str(), row[2].as_str()]));
    }
    lines.push(divider);
    lines.join("\n")
}

// == Time ==
/// Describes a timeout relative to `now`.
pub fn expiration_label(timeout: Option<i64>, now: i64) -> String {
    match timeout {
        None => "No Timeout".to_string(),
        Some(at) if at > now => format!("in {}", humanize(chrono::Duration::seconds(at - now))),
        Some(at) => format!("expired {} ago", humanize(chrono::Duration::seconds(now - at))),
    }
}

/// Coarse human-readable duration, e.g. "5 mins" or "2 days".
pub fn humanize(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(1);

    let (amount, unit) = if secs < 60 {
        (secs, "sec")
    } else if secs < 3_600 {
        (round_div(secs, 60), "min")
    } else if secs < 86_400 {
        (round_div(secs, 3_600), "hour")
    } else if secs < 7 * 86_400 {
        (round_div(secs, 86_400), "day")
    } else if secs < 30 * 86_400 {
        (round_div(secs, 7 * 86_400), "week")
    } else if secs < 365 * 86_400 {
        (round_div(secs, 30 * 86_400), "month")
    } else {
        (round_div(secs, 365 * 86_400), "year")
    };

    let amount = amount.max(1);
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

fn round_div(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

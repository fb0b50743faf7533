//! Reading and writing record batches as CSV or JSON.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde_json::{Map, Value};

use ferry_core::models::{FieldValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    /// Guess the format from a file extension; anything but `.json` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Csv,
        }
    }
}

/// A loaded batch plus whatever is needed to write it back in its own shape.
pub enum Batch {
    /// CSV rows; the header keeps the input column order.
    Csv {
        headers: Vec<String>,
        records: Vec<Record>,
    },
    /// JSON objects. Only string and null members become record fields;
    /// numbers, booleans and nested values pass through untouched.
    Json {
        rows: Vec<Map<String, Value>>,
        records: Vec<Record>,
    },
}

impl Batch {
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        match self {
            Batch::Csv { records, .. } | Batch::Json { records, .. } => records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Batch::Csv { records, .. } | Batch::Json { records, .. } => records.len(),
        }
    }
}

pub fn read_batch(reader: impl Read, format: Format) -> Result<Batch> {
    match format {
        Format::Csv => read_csv(reader),
        Format::Json => read_json(reader),
    }
}

pub fn write_batch(batch: &Batch, writer: impl Write) -> Result<()> {
    match batch {
        Batch::Csv { headers, records } => write_csv(headers, records, writer),
        Batch::Json { rows, records } => write_json(rows, records, writer),
    }
}

fn read_csv(reader: impl Read) -> Result<Batch> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (line, row) in csv_reader.records().enumerate() {
        let row = row.with_context(|| format!("Invalid CSV row {}", line + 2))?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.as_str(), cell))
                .collect::<Record>(),
        );
    }

    Ok(Batch::Csv { headers, records })
}

fn write_csv(headers: &[String], records: &[Record], writer: impl Write) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(headers)?;
    for record in records {
        csv_writer.write_record(
            headers
                .iter()
                .map(|header| record.get(header).map(FieldValue::to_string).unwrap_or_default()),
        )?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn read_json(reader: impl Read) -> Result<Batch> {
    let value: Value = serde_json::from_reader(reader).context("Invalid JSON input")?;
    let Value::Array(items) = value else {
        bail!("JSON input must be an array of objects");
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => rows.push(map),
            other => bail!("JSON item {index} is not an object: {other}"),
        }
    }

    let records = rows.iter().map(record_from_object).collect();
    Ok(Batch::Json { rows, records })
}

fn record_from_object(object: &Map<String, Value>) -> Record {
    object
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key.as_str(), FieldValue::Text(s.clone()))),
            Value::Null => Some((key.as_str(), FieldValue::Null)),
            _ => None,
        })
        .collect()
}

fn write_json(rows: &[Map<String, Value>], records: &[Record], mut writer: impl Write) -> Result<()> {
    let merged: Vec<Map<String, Value>> = rows
        .iter()
        .zip(records)
        .map(|(row, record)| {
            let mut row = row.clone();
            for (key, value) in record.iter() {
                let json = match value {
                    FieldValue::Null => Value::Null,
                    other => Value::String(other.to_string()),
                };
                row.insert(key.clone(), json);
            }
            row
        })
        .collect();

    serde_json::to_writer_pretty(&mut writer, &merged)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

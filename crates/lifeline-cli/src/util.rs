use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde_json::{Map, Value};

/// Field that wraps the payload in request envelopes such as `{"data": {...}}`.
const ENVELOPE_FIELD: &str = "data";

pub type Record = Map<String, Value>;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        if let Output::File { path, .. } = self {
            tracing::info!(path = %path.display(), "output written");
        }
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Reads training records from a JSON array, a `{"data": [...]}` envelope, or JSON lines.
pub fn read_records_file(path: &Path) -> anyhow::Result<Vec<Record>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open records file: {}", path.display()))?;
    parse_records(&text)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))
}

/// Reads a single record, optionally wrapped in a `{"data": {...}}` envelope.
pub fn read_record_file(path: &Path) -> anyhow::Result<Record> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open record file: {}", path.display()))?;
    parse_record(&text).with_context(|| format!("Failed to parse record file: {}", path.display()))
}

pub fn parse_record(text: &str) -> anyhow::Result<Record> {
    let value = serde_json::from_str(text).context("Invalid JSON")?;
    match unwrap_envelope(value) {
        Value::Object(record) => Ok(record),
        other => anyhow::bail!("expected a JSON object, found {}", kind(&other)),
    }
}

pub fn parse_records(text: &str) -> anyhow::Result<Vec<Record>> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return match unwrap_envelope(value) {
            Value::Array(values) => values
                .into_iter()
                .enumerate()
                .map(|(i, value)| into_record(value).with_context(|| format!("record {i}")))
                .collect(),
            Value::Object(record) => Ok(vec![record]),
            other => anyhow::bail!("expected a JSON array, found {}", kind(&other)),
        };
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value = serde_json::from_str(line)
                .with_context(|| format!("Invalid JSON on line {}", i + 1))?;
            into_record(value).with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

fn into_record(value: Value) -> anyhow::Result<Record> {
    match value {
        Value::Object(record) => Ok(record),
        other => anyhow::bail!("expected a JSON object, found {}", kind(&other)),
    }
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(ENVELOPE_FIELD) => map
            .remove(ENVELOPE_FIELD)
            .unwrap_or(Value::Object(Map::new())),
        other => other,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

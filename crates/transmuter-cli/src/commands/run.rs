//! Run a definition over a file of records

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use transmuter_core::{Definition, Fields};

/// Run the run command
pub fn run(
    definition_path: &Path,
    input_path: &Path,
    output_path: Option<&Path>,
    context_path: Option<&Path>,
) -> Result<()> {
    let definition = Definition::load(definition_path).context("Failed to load definition")?;
    let context = context_path.map(read_context).transpose()?;
    let compiled = definition
        .compile_with_context(context)
        .with_context(|| format!("Definition '{}' is invalid", definition.name))?;

    let records = read_records(input_path)?;
    tracing::info!(
        "Running '{}' over {} records from {}",
        definition.name,
        records.len(),
        input_path.display()
    );

    let output = compiled
        .run(records)
        .with_context(|| format!("Failed to run '{}'", definition.name))?;

    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_records(BufWriter::new(file), &output)?;
            tracing::info!("Wrote {} records to {}", output.len(), path.display());
        }
        None => {
            write_records(std::io::stdout().lock(), &output)?;
        }
    }

    Ok(())
}

/// Read a JSON array, or one JSON value per non-empty line
fn read_records(path: &Path) -> Result<Vec<Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input {}", path.display()))?;

    if contents.trim_start().starts_with('[') {
        return serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON array in {}", path.display()));
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid JSON on line {} of {}", index + 1, path.display()))
        })
        .collect()
}

fn read_context(path: &Path) -> Result<Fields> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context {}", path.display()))?;
    match serde_json::from_str(&contents)? {
        Value::Object(fields) => Ok(fields),
        other => bail!("Context must be a JSON object, got {}", other),
    }
}

fn write_records<W: Write>(mut writer: W, records: &[Value]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

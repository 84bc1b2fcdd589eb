//! Validate definition command

use anyhow::{Context, Result};
use std::path::Path;
use transmuter_core::{Compiled, Definition, TargetSchema};

/// Run the validate command
pub fn run(definition_path: &Path) -> Result<()> {
    tracing::info!("Validating definition: {}", definition_path.display());

    let definition = Definition::load(definition_path).context("Failed to load definition")?;
    let compiled = definition
        .compile()
        .with_context(|| format!("Definition '{}' is invalid", definition.name))?;

    tracing::info!("✓ Definition: {}", definition.name);
    tracing::info!("✓ Kind: {:?}", compiled.kind());
    tracing::info!("✓ Target: {}", compiled.target().name());

    match &compiled {
        Compiled::Mapper(mapper) => {
            tracing::info!("✓ Mapping: {} fields", mapper.config().mapping().len());
        }
        Compiled::Aggregator(aggregator) => {
            tracing::info!(
                "✓ Mappings: {} fields, aggregations: {} fields",
                aggregator.config().mappings().len(),
                aggregator.config().aggregations().len()
            );
        }
    }

    tracing::info!("✓ Definition is valid");
    Ok(())
}

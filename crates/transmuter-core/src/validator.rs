//! Construction-time validation of transformer instructions
//!
//! A transformer is constructible iff its declared field set `D` satisfies
//! `required ⊆ D ⊆ all` for its target schema. Aggregators additionally
//! require mapping and aggregation keys to be disjoint.

use std::collections::BTreeSet;

use crate::error::ConfigurationError;
use crate::schema::TargetSchema;

/// Validate the instruction set of a 1:1 mapper
pub fn validate_mapper<'a, T>(
    target: &T,
    mapping: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigurationError>
where
    T: TargetSchema + ?Sized,
{
    let declared: BTreeSet<String> = mapping.into_iter().map(str::to_string).collect();
    if declared.is_empty() {
        return Err(ConfigurationError::EmptyInstructions {
            target: target.name().to_string(),
        });
    }
    check_coverage(target, &declared)
}

/// Validate the instruction sets of an N:1 aggregator
pub fn validate_aggregator<'a, T>(
    target: &T,
    mappings: impl IntoIterator<Item = &'a str>,
    aggregations: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigurationError>
where
    T: TargetSchema + ?Sized,
{
    let mapped: BTreeSet<String> = mappings.into_iter().map(str::to_string).collect();
    let aggregated: BTreeSet<String> = aggregations.into_iter().map(str::to_string).collect();

    if mapped.is_empty() && aggregated.is_empty() {
        return Err(ConfigurationError::EmptyInstructions {
            target: target.name().to_string(),
        });
    }

    let overlapping: Vec<String> = mapped.intersection(&aggregated).cloned().collect();
    if !overlapping.is_empty() {
        return Err(ConfigurationError::OverlappingFields {
            target: target.name().to_string(),
            fields: overlapping,
        });
    }

    let declared: BTreeSet<String> = mapped.union(&aggregated).cloned().collect();
    check_coverage(target, &declared)
}

fn check_coverage<T>(target: &T, declared: &BTreeSet<String>) -> Result<(), ConfigurationError>
where
    T: TargetSchema + ?Sized,
{
    let missing: Vec<String> = target
        .required_fields()
        .difference(declared)
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ConfigurationError::MissingFields {
            target: target.name().to_string(),
            fields: missing,
        });
    }

    let unknown: Vec<String> = declared
        .difference(&target.all_fields())
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ConfigurationError::UnknownFields {
            target: target.name().to_string(),
            fields: unknown,
        });
    }

    Ok(())
}

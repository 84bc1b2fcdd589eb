//! N:1 grouping and aggregation
//!
//! [`Aggregator::aggregate`] runs the pipeline:
//!
//! ```text
//! records ──▶ sort (sort_by) ──▶ group (group_by) ──▶ resolve per group ──▶ targets
//! ```
//!
//! - `mappings` produce one list per group, one element per member, in group order
//! - `aggregations` produce one value per group
//!
//! Without `group_by` all records form a single group; an empty input
//! produces no groups at all.

use std::fmt;
use std::sync::Arc;

use crate::binding::Instance;
use crate::error::{ConfigurationError, ResolutionError};
use crate::instruction::{AggregationSpec, FieldSpec, Instructions, KeySelector};
use crate::ordering::{group_by_keys, sort_by_keys};
use crate::record::{Context, Fields, Record, Value};
use crate::resolver::FieldResolver;
use crate::schema::TargetSchema;
use crate::validator::validate_aggregator;

/// Class-wide configuration of an [`Aggregator`]
pub struct AggregatorConfig<S, T> {
    target: T,
    mappings: Instructions<FieldSpec<S>>,
    aggregations: Instructions<AggregationSpec<S>>,
    group_by: Option<Vec<KeySelector<S>>>,
    sort_by: Option<Vec<KeySelector<S>>>,
    constants: Fields,
}

impl<S, T: TargetSchema> AggregatorConfig<S, T> {
    /// Start a configuration producing `target`
    pub fn new(target: T) -> Self {
        Self {
            target,
            mappings: Instructions::new(),
            aggregations: Instructions::new(),
            group_by: None,
            sort_by: None,
            constants: Fields::new(),
        }
    }

    /// Declare a per-member mapping; the target field receives a list
    pub fn map(mut self, field: impl Into<String>, spec: impl Into<FieldSpec<S>>) -> Self {
        self.mappings.insert(field, spec.into());
        self
    }

    /// Declare a per-group aggregation; the target field receives one value
    pub fn aggregate(mut self, field: impl Into<String>, spec: AggregationSpec<S>) -> Self {
        self.aggregations.insert(field, spec);
        self
    }

    /// Group records by the tuple of these selectors
    pub fn group_by<I>(mut self, selectors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<KeySelector<S>>,
    {
        self.group_by = Some(selectors.into_iter().map(Into::into).collect());
        self
    }

    /// Sort records by the tuple of these selectors before grouping
    pub fn sort_by<I>(mut self, selectors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<KeySelector<S>>,
    {
        self.sort_by = Some(selectors.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a class-wide constant readable by method and class functions
    pub fn constant(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(key.into(), value.into());
        self
    }

    /// Target schema
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Per-member mappings
    pub fn mappings(&self) -> &Instructions<FieldSpec<S>> {
        &self.mappings
    }

    /// Per-group aggregations
    pub fn aggregations(&self) -> &Instructions<AggregationSpec<S>> {
        &self.aggregations
    }
}

impl<S, T: fmt::Debug> fmt::Debug for AggregatorConfig<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatorConfig")
            .field("target", &self.target)
            .field("mappings", &self.mappings.fields().collect::<Vec<_>>())
            .field("aggregations", &self.aggregations.fields().collect::<Vec<_>>())
            .field("group_by", &self.group_by.as_ref().map(Vec::len))
            .field("sort_by", &self.sort_by.as_ref().map(Vec::len))
            .field("constants", &self.constants)
            .finish()
    }
}

/// Reduces groups of source records to one target record each
pub struct Aggregator<S, T> {
    config: Arc<AggregatorConfig<S, T>>,
    context: Context,
}

impl<S: Record, T: TargetSchema> Aggregator<S, T> {
    /// Validate `config` against its target schema and bind `context`
    pub fn new(
        config: impl Into<Arc<AggregatorConfig<S, T>>>,
        context: Option<Fields>,
    ) -> Result<Self, ConfigurationError> {
        let config = config.into();
        validate_aggregator(
            &config.target,
            config.mappings.fields(),
            config.aggregations.fields(),
        )?;

        tracing::debug!(
            "Constructed aggregator for '{}' with {} mappings and {} aggregations",
            config.target.name(),
            config.mappings.len(),
            config.aggregations.len()
        );

        Ok(Self {
            config,
            context: Context::from(context),
        })
    }

    /// Shared configuration
    pub fn config(&self) -> &Arc<AggregatorConfig<S, T>> {
        &self.config
    }

    /// Instance context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Sort, group and reduce `records` into target records, one per group
    pub fn aggregate<I>(&self, records: I) -> Result<Vec<T::Output>, ResolutionError>
    where
        I: IntoIterator<Item = S>,
    {
        let instance = Instance::new(&self.context, &self.config.constants);
        let resolver = FieldResolver::new(instance);

        let groups = self.group(&resolver, records.into_iter().collect())?;
        tracing::debug!(
            "Aggregating {} groups into '{}'",
            groups.len(),
            self.config.target.name()
        );

        groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                tracing::trace!("Resolving group {} with {} records", index, group.len());
                self.resolve_group(&resolver, group)
            })
            .collect()
    }

    /// Sort and partition `records` into groups in emission order
    fn group(
        &self,
        resolver: &FieldResolver<'_>,
        mut records: Vec<S>,
    ) -> Result<Vec<Vec<S>>, ResolutionError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(sort_by) = &self.config.sort_by {
            let keys = Self::keys(resolver, "sort_by", sort_by, &records)?;
            records = sort_by_keys(records, keys)?;
        }

        match &self.config.group_by {
            Some(group_by) => {
                let keys = Self::keys(resolver, "group_by", group_by, &records)?;
                Ok(group_by_keys(records, keys))
            }
            None => Ok(vec![records]),
        }
    }

    fn keys(
        resolver: &FieldResolver<'_>,
        purpose: &str,
        selectors: &[KeySelector<S>],
        records: &[S],
    ) -> Result<Vec<Vec<Value>>, ResolutionError> {
        records
            .iter()
            .map(|record| resolver.key(purpose, selectors, record))
            .collect()
    }

    fn resolve_group(
        &self,
        resolver: &FieldResolver<'_>,
        group: &[S],
    ) -> Result<T::Output, ResolutionError> {
        let mut fields = Fields::new();

        for (target, spec) in self.config.aggregations.iter() {
            fields.insert(
                target.to_string(),
                resolver.resolve_aggregation(target, spec, group)?,
            );
        }

        for (target, spec) in self.config.mappings.iter() {
            let values = group
                .iter()
                .map(|record| resolver.resolve(target, spec, record))
                .collect::<Result<Vec<_>, _>>()?;
            fields.insert(target.to_string(), Value::Array(values));
        }

        self.config
            .target
            .construct(fields)
            .map_err(|source| ResolutionError::Construct {
                target: self.config.target.name().to_string(),
                source,
            })
    }
}

impl<S, T: fmt::Debug> fmt::Debug for Aggregator<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("config", &self.config)
            .field("context", &self.context)
            .finish()
    }
}

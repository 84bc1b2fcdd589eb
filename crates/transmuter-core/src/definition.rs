//! Declarative transformer definitions
//!
//! A definition describes one transformer over JSON records in YAML, using
//! the built-in [`functions`](crate::functions) for anything beyond plain
//! field copies.
//!
//! # Example
//!
//! ```yaml
//! name: children_by_parent
//! kind: aggregator
//! target:
//!   name: Parent
//!   fields:
//!     - parent
//!     - children
//!     - size
//! group_by: [parent]
//! sort_by: [age]
//! mappings:
//!   children: { template: "{{ first_name }} {{ last_name }}" }
//! aggregations:
//!   parent: { field: parent, reduce: first }
//!   size: { reduce: count }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::aggregator::{Aggregator, AggregatorConfig};
use crate::error::{Error, Result};
use crate::functions::{
    group_function, list_function, path_extractor, template_extractor, value_function,
};
use crate::instruction::{AggregationSpec, FieldSpec, KeySelector};
use crate::mapper::{Mapper, MapperConfig};
use crate::record::{Fields, Value};
use crate::schema::{Schema, TargetSchema};

/// Transformer flavour
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// One target record per source record
    Mapper,
    /// One target record per group of source records
    Aggregator,
}

/// Per-record instruction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldConfig {
    /// Copy a source field
    Direct(String),
    /// Copy a source field through a value function
    Transform {
        /// Source field
        field: String,
        /// Value function name
        apply: String,
    },
    /// Render a Jinja template against the record
    Template {
        /// Template source
        template: String,
    },
    /// Follow a dotted path into the record
    Path {
        /// Dotted path
        path: String,
    },
}

/// Per-group instruction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AggregationConfig {
    /// Reduce the values of one field
    Field {
        /// Source field
        field: String,
        /// List reducer name
        reduce: String,
    },
    /// Reduce the records themselves
    Group {
        /// Group reducer name
        reduce: String,
    },
}

/// Sort or group key component
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KeyConfig {
    /// Source field
    Field(String),
    /// Jinja template rendered against the record
    Template {
        /// Template source
        template: String,
    },
    /// Dotted path into the record
    Path {
        /// Dotted path
        path: String,
    },
}

/// A transformer definition as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    /// Definition name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Transformer flavour, inferred from the instructions when omitted
    #[serde(default)]
    pub kind: Option<Kind>,

    /// Target schema
    pub target: Schema,

    /// Mapper instructions
    #[serde(default)]
    pub mapping: Option<BTreeMap<String, FieldConfig>>,

    /// Aggregator per-member instructions
    #[serde(default)]
    pub mappings: Option<BTreeMap<String, FieldConfig>>,

    /// Aggregator per-group instructions
    #[serde(default)]
    pub aggregations: Option<BTreeMap<String, AggregationConfig>>,

    /// Aggregator group key
    #[serde(default)]
    pub group_by: Option<Vec<KeyConfig>>,

    /// Aggregator sort key
    #[serde(default)]
    pub sort_by: Option<Vec<KeyConfig>>,

    /// Class-wide constants
    #[serde(default)]
    pub constants: Fields,

    /// Default instance context
    #[serde(default)]
    pub context: Fields,
}

/// A definition turned into a ready-to-run transformer
#[derive(Debug)]
pub enum Compiled {
    /// 1:1 transformer
    Mapper(Mapper<Value, Schema>),
    /// N:1 transformer
    Aggregator(Aggregator<Value, Schema>),
}

impl Compiled {
    /// Run the transformer over `records`
    pub fn run(&self, records: Vec<Value>) -> Result<Vec<Value>> {
        match self {
            Self::Mapper(mapper) => Ok(mapper.map_list(&records)?),
            Self::Aggregator(aggregator) => Ok(aggregator.aggregate(records)?),
        }
    }

    /// Target schema
    pub fn target(&self) -> &Schema {
        match self {
            Self::Mapper(mapper) => mapper.config().target(),
            Self::Aggregator(aggregator) => aggregator.config().target(),
        }
    }

    /// Transformer flavour
    pub fn kind(&self) -> Kind {
        match self {
            Self::Mapper(_) => Kind::Mapper,
            Self::Aggregator(_) => Kind::Aggregator,
        }
    }
}

impl Definition {
    /// Load a definition from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::DefinitionNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a definition from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Effective transformer flavour
    pub fn kind(&self) -> Kind {
        self.kind.unwrap_or(if self.mapping.is_some() {
            Kind::Mapper
        } else {
            Kind::Aggregator
        })
    }

    /// Build the transformer with the definition's own context
    pub fn compile(&self) -> Result<Compiled> {
        self.compile_with_context(None)
    }

    /// Build the transformer, layering `overrides` over the definition's context
    pub fn compile_with_context(&self, overrides: Option<Fields>) -> Result<Compiled> {
        let mut context = self.context.clone();
        context.extend(overrides.unwrap_or_default());

        let compiled = match self.kind() {
            Kind::Mapper => Compiled::Mapper(self.compile_mapper(context)?),
            Kind::Aggregator => Compiled::Aggregator(self.compile_aggregator(context)?),
        };

        tracing::debug!(
            "Compiled {:?} '{}' targeting '{}'",
            compiled.kind(),
            self.name,
            compiled.target().name()
        );
        Ok(compiled)
    }

    fn compile_mapper(&self, context: Fields) -> Result<Mapper<Value, Schema>> {
        if self.mappings.is_some()
            || self.aggregations.is_some()
            || self.group_by.is_some()
            || self.sort_by.is_some()
        {
            return Err(self.invalid(
                "a mapper only accepts 'mapping'; mappings, aggregations, group_by and sort_by belong to aggregators",
            ));
        }

        let mut config = MapperConfig::new(self.target.clone());
        for (key, value) in &self.constants {
            config = config.constant(key.clone(), value.clone());
        }
        for (field, spec) in self.mapping.iter().flatten() {
            config = config.map(field.clone(), field_spec(spec)?);
        }

        Ok(Mapper::new(config, Some(context))?)
    }

    fn compile_aggregator(&self, context: Fields) -> Result<Aggregator<Value, Schema>> {
        if self.mapping.is_some() {
            return Err(self.invalid(
                "an aggregator uses 'mappings' and 'aggregations', not 'mapping'",
            ));
        }

        let mut config = AggregatorConfig::new(self.target.clone());
        for (key, value) in &self.constants {
            config = config.constant(key.clone(), value.clone());
        }
        for (field, spec) in self.mappings.iter().flatten() {
            config = config.map(field.clone(), field_spec(spec)?);
        }
        for (field, spec) in self.aggregations.iter().flatten() {
            config = config.aggregate(field.clone(), aggregation_spec(spec)?);
        }
        if let Some(group_by) = &self.group_by {
            config = config.group_by(key_selectors(group_by)?);
        }
        if let Some(sort_by) = &self.sort_by {
            config = config.sort_by(key_selectors(sort_by)?);
        }

        Ok(Aggregator::new(config, Some(context))?)
    }

    fn invalid(&self, message: &str) -> Error {
        Error::DefinitionInvalid {
            name: self.name.clone(),
            message: message.to_string(),
        }
    }
}

fn field_spec(config: &FieldConfig) -> Result<FieldSpec<Value>> {
    Ok(match config {
        FieldConfig::Direct(field) => FieldSpec::Direct(field.clone()),
        FieldConfig::Transform { field, apply } => {
            FieldSpec::Transform(field.clone(), value_function(apply)?)
        }
        FieldConfig::Template { template } => FieldSpec::Extractor(template_extractor(template)?),
        FieldConfig::Path { path } => FieldSpec::Extractor(path_extractor(path)),
    })
}

fn aggregation_spec(config: &AggregationConfig) -> Result<AggregationSpec<Value>> {
    Ok(match config {
        AggregationConfig::Field { field, reduce } => {
            AggregationSpec::ReducedField(field.clone(), list_function(reduce)?)
        }
        AggregationConfig::Group { reduce } => AggregationSpec::ReducedGroup(group_function(reduce)?),
    })
}

fn key_selectors(configs: &[KeyConfig]) -> Result<Vec<KeySelector<Value>>> {
    configs
        .iter()
        .map(|config| {
            Ok(match config {
                KeyConfig::Field(field) => KeySelector::Field(field.clone()),
                KeyConfig::Template { template } => {
                    KeySelector::Extractor(template_extractor(template)?)
                }
                KeyConfig::Path { path } => KeySelector::Extractor(path_extractor(path)),
            })
        })
        .collect()
}

//! Transmuter Core Library
//!
//! This crate turns source records into target records from declarative
//! per-field instructions:
//! - [`Mapper`] maps each source record to exactly one target record
//! - [`Aggregator`] sorts, groups and reduces source records, one target per group
//! - [`Definition`] builds either transformer from a YAML file
//!
//! Instructions are checked against the target schema when a transformer is
//! constructed, so a transformer that exists always covers every required
//! target field and nothing the target does not declare.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Definition  │────▶│  Validator  │────▶│  Resolver   │────▶│   Target    │
//! │ or Config   │     │ (coverage)  │     │ (per field) │     │   Schema    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use transmuter_core::{AggregationSpec, Aggregator, AggregatorConfig, Schema};
//!
//! let config = AggregatorConfig::new(Schema::new("Parent").required("parent").required("children"))
//!     .group_by(["parent"])
//!     .sort_by(["age"])
//!     .map("children", "name")
//!     .aggregate("parent", AggregationSpec::field("parent", |values| Ok(values[0].clone())));
//!
//! let aggregator = Aggregator::new(config, None).unwrap();
//! let parents = aggregator
//!     .aggregate(vec![
//!         json!({"parent": "p1", "name": "Tom", "age": 9}),
//!         json!({"parent": "p1", "name": "Ann", "age": 4}),
//!     ])
//!     .unwrap();
//! assert_eq!(parents, vec![json!({"parent": "p1", "children": ["Ann", "Tom"]})]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod binding;
pub mod definition;
pub mod error;
pub mod functions;
pub mod instruction;
pub mod mapper;
pub mod ordering;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod validator;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use binding::{Callable, FnResult, Instance};
pub use definition::{Compiled, Definition, Kind};
pub use error::{BoxError, ConfigurationError, Error, ResolutionError, Result};
pub use instruction::{AggregationSpec, FieldSpec, Instructions, KeySelector};
pub use mapper::{Mapper, MapperConfig};
pub use record::{Context, Fields, Record, Value};
pub use resolver::FieldResolver;
pub use schema::{FieldDef, Schema, SchemaError, TargetSchema, Typed};

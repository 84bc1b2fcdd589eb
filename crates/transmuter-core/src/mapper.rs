//! 1:1 record mapping
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use transmuter_core::{FieldSpec, Mapper, MapperConfig, Schema};
//!
//! let config = MapperConfig::new(Schema::new("B").required("id").required("label"))
//!     .map("id", "id")
//!     .map("label", FieldSpec::transform("id", |id| Ok(json!(format!("#{}", id)))));
//!
//! let mapper = Mapper::new(config, None).unwrap();
//! let b = mapper.map(&json!({"id": 1})).unwrap();
//! assert_eq!(b, json!({"id": 1, "label": "#1"}));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::binding::Instance;
use crate::error::{ConfigurationError, ResolutionError};
use crate::instruction::{FieldSpec, Instructions};
use crate::record::{Context, Fields, Record, Value};
use crate::resolver::FieldResolver;
use crate::schema::TargetSchema;
use crate::validator::validate_mapper;

/// Class-wide configuration of a [`Mapper`]
pub struct MapperConfig<S, T> {
    target: T,
    mapping: Instructions<FieldSpec<S>>,
    constants: Fields,
}

impl<S, T: TargetSchema> MapperConfig<S, T> {
    /// Start a configuration producing `target`
    pub fn new(target: T) -> Self {
        Self {
            target,
            mapping: Instructions::new(),
            constants: Fields::new(),
        }
    }

    /// Declare how `field` of the target is computed
    pub fn map(mut self, field: impl Into<String>, spec: impl Into<FieldSpec<S>>) -> Self {
        self.mapping.insert(field, spec.into());
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

    /// Declared instructions
    pub fn mapping(&self) -> &Instructions<FieldSpec<S>> {
        &self.mapping
    }

    /// Class-wide constants
    pub fn constants(&self) -> &Fields {
        &self.constants
    }
}

impl<S, T: fmt::Debug> fmt::Debug for MapperConfig<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig")
            .field("target", &self.target)
            .field("mapping", &self.mapping.fields().collect::<Vec<_>>())
            .field("constants", &self.constants)
            .finish()
    }
}

/// Maps each source record to exactly one target record
pub struct Mapper<S, T> {
    config: Arc<MapperConfig<S, T>>,
    context: Context,
}

impl<S: Record, T: TargetSchema> Mapper<S, T> {
    /// Validate `config` against its target schema and bind `context`
    pub fn new(
        config: impl Into<Arc<MapperConfig<S, T>>>,
        context: Option<Fields>,
    ) -> Result<Self, ConfigurationError> {
        let config = config.into();
        validate_mapper(&config.target, config.mapping.fields())?;

        tracing::debug!(
            "Constructed mapper for '{}' with {} instructions",
            config.target.name(),
            config.mapping.len()
        );

        Ok(Self {
            config,
            context: Context::from(context),
        })
    }

    /// Shared configuration
    pub fn config(&self) -> &Arc<MapperConfig<S, T>> {
        &self.config
    }

    /// Instance context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Map one source record
    pub fn map(&self, record: &S) -> Result<T::Output, ResolutionError> {
        let instance = Instance::new(&self.context, &self.config.constants);
        self.map_with(&FieldResolver::new(instance), record)
    }

    /// Map every record, preserving order and cardinality
    pub fn map_list(&self, records: &[S]) -> Result<Vec<T::Output>, ResolutionError> {
        let instance = Instance::new(&self.context, &self.config.constants);
        let resolver = FieldResolver::new(instance);

        let mapped = records
            .iter()
            .map(|record| self.map_with(&resolver, record))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Mapped {} records to '{}'",
            mapped.len(),
            self.config.target.name()
        );
        Ok(mapped)
    }

    fn map_with(
        &self,
        resolver: &FieldResolver<'_>,
        record: &S,
    ) -> Result<T::Output, ResolutionError> {
        let mut fields = Fields::new();
        for (target, spec) in self.config.mapping.iter() {
            fields.insert(target.to_string(), resolver.resolve(target, spec, record)?);
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

impl<S, T: fmt::Debug> fmt::Debug for Mapper<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Callable;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_map_direct_field() {
        let config = MapperConfig::new(Schema::new("B").required("id")).map("id", "id");
        let mapper = Mapper::new(config, None).unwrap();
        assert_eq!(mapper.map(&json!({"id": 1})).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_construction_fails_on_missing_field() {
        let config: MapperConfig<Value, _> =
            MapperConfig::new(Schema::new("B").required("id").required("name")).map("id", "id");
        let err = Mapper::new(config, None).unwrap_err();
        assert_eq!(err.fields(), ["name"]);
    }

    #[test]
    fn test_context_is_bound_per_instance() {
        let config = Arc::new(
            MapperConfig::new(Schema::new("B").required("price")).map(
                "price",
                FieldSpec::Transform(
                    "price".to_string(),
                    Callable::method(|this, price: &Value| {
                        let rate = this.context().get("rate").and_then(Value::as_f64).unwrap_or(1.0);
                        Ok(json!(price.as_f64().unwrap_or(0.0) * rate))
                    }),
                ),
            ),
        );

        let euro = Mapper::new(Arc::clone(&config), json!({"rate": 0.5}).as_object().cloned())
            .unwrap();
        let plain = Mapper::new(config, None).unwrap();

        let record = json!({"price": 10.0});
        assert_eq!(euro.map(&record).unwrap(), json!({"price": 5.0}));
        assert_eq!(plain.map(&record).unwrap(), json!({"price": 10.0}));
    }

    #[test]
    fn test_class_function_reads_constants() {
        let config = MapperConfig::new(Schema::new("B").required("greeting"))
            .constant("prefix", "Hello")
            .map(
                "greeting",
                FieldSpec::Extractor(Callable::class(|constants, record: &Value| {
                    Ok(json!(format!(
                        "{} {}",
                        constants["prefix"].as_str().unwrap_or_default(),
                        record["name"].as_str().unwrap_or_default()
                    )))
                })),
            );
        let mapper = Mapper::new(config, None).unwrap();
        assert_eq!(
            mapper.map(&json!({"name": "Tom"})).unwrap(),
            json!({"greeting": "Hello Tom"})
        );
    }

    #[test]
    fn test_map_list_fails_as_a_whole() {
        let config = MapperConfig::new(Schema::new("B").required("id")).map("id", "id");
        let mapper = Mapper::new(config, None).unwrap();
        let result = mapper.map_list(&[json!({"id": 1}), json!({"other": 2})]);
        assert!(matches!(result, Err(ResolutionError::MissingField { .. })));
    }

    #[test]
    fn test_schema_rejection_is_propagated() {
        let config = MapperConfig::new(Schema::new("B").required("id")).map("id", "id");
        let mapper = Mapper::new(config, None).unwrap();
        let err = mapper.map(&json!({"id": null})).unwrap_err();
        assert!(matches!(err, ResolutionError::Construct { target, .. } if target == "B"));
    }
}

//! Target schemas
//!
//! A transformer only needs three things from the schema it produces:
//! the names of all declared fields, which of them are mandatory, and a way
//! to build an instance from a complete field mapping. [`TargetSchema`]
//! captures exactly that.
//!
//! Two implementations ship with the crate:
//! - [`Schema`] - a runtime descriptor producing JSON objects
//! - [`Typed`] - a descriptor paired with a serde-deserializable struct

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::BoxError;
use crate::record::{Fields, Value};

/// The schema a transformer constructs its output from
pub trait TargetSchema {
    /// Constructed target record
    type Output;

    /// Schema name, used in diagnostics
    fn name(&self) -> &str;

    /// Every declared field
    fn all_fields(&self) -> BTreeSet<String>;

    /// Mandatory fields
    fn required_fields(&self) -> BTreeSet<String>;

    /// Build a target record, applying the schema's own validation
    fn construct(&self, fields: Fields) -> Result<Self::Output, BoxError>;
}

/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFieldDef")]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Whether a value must be present and non-null
    pub required: bool,
}

/// Fields may be written as a bare name (required) or as a full entry
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldDef {
    Name(String),
    Full {
        name: String,
        #[serde(default = "default_required")]
        required: bool,
    },
}

fn default_required() -> bool {
    true
}

impl From<RawFieldDef> for FieldDef {
    fn from(raw: RawFieldDef) -> Self {
        match raw {
            RawFieldDef::Name(name) => Self {
                name,
                required: true,
            },
            RawFieldDef::Full { name, required } => Self { name, required },
        }
    }
}

/// Validation failures raised by [`Schema::construct`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A required field is absent or null
    #[error("field '{field}' of '{schema}' is required")]
    Required {
        /// Schema name
        schema: String,
        /// Field name
        field: String,
    },

    /// A field the schema does not declare
    #[error("field '{field}' is not declared by '{schema}'")]
    Undeclared {
        /// Schema name
        schema: String,
        /// Field name
        field: String,
    },
}

/// Runtime schema descriptor producing JSON objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name
    pub name: String,
    /// Declared fields, in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Create a schema with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a mandatory field
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            required: true,
        });
        self
    }

    /// Declare an optional field
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            required: false,
        });
        self
    }

    /// Pair this descriptor with a struct deserialized from the resolved fields
    pub fn typed<T: DeserializeOwned>(self) -> Typed<T> {
        Typed {
            schema: self,
            _marker: PhantomData,
        }
    }

    fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

impl TargetSchema for Schema {
    type Output = Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn all_fields(&self) -> BTreeSet<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    fn required_fields(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect()
    }

    fn construct(&self, mut fields: Fields) -> Result<Value, BoxError> {
        if let Some(field) = fields.keys().find(|k| !self.declares(k)) {
            return Err(Box::new(SchemaError::Undeclared {
                schema: self.name.clone(),
                field: field.clone(),
            }));
        }

        for def in &self.fields {
            match fields.get(&def.name) {
                Some(Value::Null) | None if def.required => {
                    return Err(Box::new(SchemaError::Required {
                        schema: self.name.clone(),
                        field: def.name.clone(),
                    }));
                }
                None => {
                    fields.insert(def.name.clone(), Value::Null);
                }
                Some(_) => {}
            }
        }

        Ok(Value::Object(fields))
    }
}

/// A [`Schema`] whose records are deserialized into `T`
pub struct Typed<T> {
    schema: Schema,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    /// The underlying descriptor
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("schema", &self.schema)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> TargetSchema for Typed<T> {
    type Output = T;

    fn name(&self) -> &str {
        &self.schema.name
    }

    fn all_fields(&self) -> BTreeSet<String> {
        self.schema.all_fields()
    }

    fn required_fields(&self) -> BTreeSet<String> {
        self.schema.required_fields()
    }

    fn construct(&self, fields: Fields) -> Result<T, BoxError> {
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_and_all_fields() {
        let schema = Schema::new("Parent").required("name").optional("nickname");
        assert_eq!(schema.all_fields().len(), 2);
        assert!(schema.required_fields().contains("name"));
        assert!(!schema.required_fields().contains("nickname"));
    }

    #[test]
    fn test_construct_fills_optional_with_null() {
        let schema = Schema::new("Parent").required("name").optional("nickname");
        let record = schema.construct(fields(json!({"name": "Tom"}))).unwrap();
        assert_eq!(record, json!({"name": "Tom", "nickname": null}));
    }

    #[test]
    fn test_construct_rejects_null_required() {
        let schema = Schema::new("Parent").required("name");
        let err = schema.construct(fields(json!({"name": null}))).unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_construct_rejects_undeclared() {
        let schema = Schema::new("Parent").required("name");
        let err = schema
            .construct(fields(json!({"name": "Tom", "age": 3})))
            .unwrap_err();
        assert!(err.to_string().contains("'age'"));
    }

    #[test]
    fn test_typed_construct_uses_serde() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct B {
            ids: Vec<i64>,
        }

        let schema = Schema::new("B").required("ids").typed::<B>();
        let b = schema.construct(fields(json!({"ids": [1, 2]}))).unwrap();
        assert_eq!(b, B { ids: vec![1, 2] });

        assert!(schema.construct(fields(json!({"ids": "nope"}))).is_err());
    }

    #[test]
    fn test_parse_field_shorthand() {
        let yaml = r#"
name: Parent
fields:
  - name
  - { name: nickname, required: false }
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            schema.fields,
            vec![
                FieldDef {
                    name: "name".to_string(),
                    required: true
                },
                FieldDef {
                    name: "nickname".to_string(),
                    required: false
                },
            ]
        );
    }
}

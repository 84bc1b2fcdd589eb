//! Records and per-instance context
//!
//! The engine never looks inside a source record beyond asking for a field
//! by name, so any type implementing [`Record`] can be transformed.

use serde::{Deserialize, Serialize};

/// Dynamic field value
pub type Value = serde_json::Value;

/// Field name to value mapping used to construct target records
pub type Fields = serde_json::Map<String, Value>;

/// A structured value addressable by field name
pub trait Record {
    /// Read the named field, `None` when the record has no such field
    fn field(&self, name: &str) -> Option<Value>;
}

impl Record for Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.as_object().and_then(|obj| obj.get(name)).cloned()
    }
}

impl Record for Fields {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

/// Instance-specific values handed to a transformer at construction
///
/// Read-only after construction. Functions declared as
/// [`Callable::Method`](crate::binding::Callable::Method) receive it through
/// their [`Instance`](crate::binding::Instance).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Fields);

impl Context {
    /// Create a context from a field mapping
    pub fn new(values: Fields) -> Self {
        Self(values)
    }

    /// Look up a context value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether no values were supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying mapping
    pub fn as_fields(&self) -> &Fields {
        &self.0
    }
}

impl From<Fields> for Context {
    fn from(values: Fields) -> Self {
        Self(values)
    }
}

impl From<Option<Fields>> for Context {
    fn from(values: Option<Fields>) -> Self {
        Self(values.unwrap_or_default())
    }
}

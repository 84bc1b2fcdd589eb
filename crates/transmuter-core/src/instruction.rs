//! Instructions declaring how each target field is computed

use crate::binding::{Callable, FnResult, Instance};
use crate::record::Value;

/// How one target field is computed from one source record
#[derive(Debug)]
pub enum FieldSpec<S> {
    /// Read the named source field unchanged
    Direct(String),
    /// Read the named source field and pass it through a function
    Transform(String, Callable<Value>),
    /// Pass the whole source record through a function
    Extractor(Callable<S>),
}

impl<S> FieldSpec<S> {
    /// Read `field` unchanged
    pub fn direct(field: impl Into<String>) -> Self {
        Self::Direct(field.into())
    }

    /// Read `field` and pass it through a free function
    pub fn transform<F>(field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> FnResult + Send + Sync + 'static,
    {
        Self::Transform(field.into(), Callable::function(f))
    }

    /// Pass the record through a free function
    pub fn extractor<F>(f: F) -> Self
    where
        F: Fn(&S) -> FnResult + Send + Sync + 'static,
    {
        Self::Extractor(Callable::function(f))
    }

    /// Pass the record through a function reading the owning instance
    pub fn extractor_method<F>(f: F) -> Self
    where
        F: Fn(&Instance<'_>, &S) -> FnResult + Send + Sync + 'static,
    {
        Self::Extractor(Callable::method(f))
    }
}

impl<S> Clone for FieldSpec<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct(field) => Self::Direct(field.clone()),
            Self::Transform(field, f) => Self::Transform(field.clone(), f.clone()),
            Self::Extractor(f) => Self::Extractor(f.clone()),
        }
    }
}

impl<S> From<&str> for FieldSpec<S> {
    fn from(field: &str) -> Self {
        Self::Direct(field.to_string())
    }
}

/// How one target field is computed from a whole group of source records
#[derive(Debug)]
pub enum AggregationSpec<S> {
    /// Collect the named field from every record in group order, then reduce
    ReducedField(String, Callable<[Value]>),
    /// Reduce the group itself
    ReducedGroup(Callable<[S]>),
}

impl<S> AggregationSpec<S> {
    /// Reduce the values of `field` with a free function
    pub fn field<F>(field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> FnResult + Send + Sync + 'static,
    {
        Self::ReducedField(field.into(), Callable::function(f))
    }

    /// Reduce the whole group with a free function
    pub fn group<F>(f: F) -> Self
    where
        F: Fn(&[S]) -> FnResult + Send + Sync + 'static,
    {
        Self::ReducedGroup(Callable::function(f))
    }
}

impl<S> Clone for AggregationSpec<S> {
    fn clone(&self) -> Self {
        match self {
            Self::ReducedField(field, f) => Self::ReducedField(field.clone(), f.clone()),
            Self::ReducedGroup(f) => Self::ReducedGroup(f.clone()),
        }
    }
}

/// One component of a sort or group key
#[derive(Debug)]
pub enum KeySelector<S> {
    /// Read the named field
    Field(String),
    /// Compute the component from the whole record
    Extractor(Callable<S>),
}

impl<S> KeySelector<S> {
    /// Select by field name
    pub fn field(field: impl Into<String>) -> Self {
        Self::Field(field.into())
    }

    /// Select through a free function
    pub fn extractor<F>(f: F) -> Self
    where
        F: Fn(&S) -> FnResult + Send + Sync + 'static,
    {
        Self::Extractor(Callable::function(f))
    }
}

impl<S> Clone for KeySelector<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(field) => Self::Field(field.clone()),
            Self::Extractor(f) => Self::Extractor(f.clone()),
        }
    }
}

impl<S> From<&str> for KeySelector<S> {
    fn from(field: &str) -> Self {
        Self::Field(field.to_string())
    }
}

/// Ordered target-field to instruction list with map semantics
///
/// Declaring a field twice replaces the earlier instruction in place.
#[derive(Debug)]
pub struct Instructions<I> {
    entries: Vec<(String, I)>,
}

impl<I> Instructions<I> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declare `field`, replacing any earlier declaration
    pub fn insert(&mut self, field: impl Into<String>, instruction: I) {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = instruction,
            None => self.entries.push((field, instruction)),
        }
    }

    /// Declared target field names, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Declarations in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &I)> {
        self.entries.iter().map(|(name, i)| (name.as_str(), i))
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I> Default for Instructions<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Clone> Clone for Instructions<I> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K: Into<String>, I> FromIterator<(K, I)> for Instructions<I> {
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut instructions = Self::new();
        for (field, instruction) in iter {
            instructions.insert(field, instruction);
        }
        instructions
    }
}

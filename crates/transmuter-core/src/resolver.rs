//! Field resolution
//!
//! Turns a single instruction plus a record (or a group of records) into one
//! value. Every call re-binds its callable; nothing is cached between calls.

use crate::binding::{Callable, Instance};
use crate::error::ResolutionError;
use crate::instruction::{AggregationSpec, FieldSpec, KeySelector};
use crate::record::{Record, Value};

/// Resolves instructions on behalf of one transformer instance
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    instance: Instance<'a>,
}

impl<'a> FieldResolver<'a> {
    /// Create a resolver binding callables against `instance`
    pub fn new(instance: Instance<'a>) -> Self {
        Self { instance }
    }

    /// Compute the value of `target` for a single record
    pub fn resolve<S: Record>(
        &self,
        target: &str,
        spec: &FieldSpec<S>,
        record: &S,
    ) -> Result<Value, ResolutionError> {
        match spec {
            FieldSpec::Direct(field) => read(record, field),
            FieldSpec::Transform(field, f) => {
                let value = read(record, field)?;
                self.call(target, f, &value)
            }
            FieldSpec::Extractor(f) => self.call(target, f, record),
        }
    }

    /// Compute the value of `target` for a whole group, in group order
    pub fn resolve_aggregation<S: Record>(
        &self,
        target: &str,
        spec: &AggregationSpec<S>,
        group: &[S],
    ) -> Result<Value, ResolutionError> {
        match spec {
            AggregationSpec::ReducedField(field, f) => {
                let values = group
                    .iter()
                    .map(|record| read(record, field))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(target, f, values.as_slice())
            }
            AggregationSpec::ReducedGroup(f) => self.call(target, f, group),
        }
    }

    /// Build the tuple key of `record` from sort or group selectors
    pub fn key<S: Record>(
        &self,
        purpose: &str,
        selectors: &[KeySelector<S>],
        record: &S,
    ) -> Result<Vec<Value>, ResolutionError> {
        selectors
            .iter()
            .map(|selector| match selector {
                KeySelector::Field(field) => read(record, field),
                KeySelector::Extractor(f) => self.call(purpose, f, record),
            })
            .collect()
    }

    fn call<A: ?Sized>(
        &self,
        instruction: &str,
        callable: &Callable<A>,
        arg: &A,
    ) -> Result<Value, ResolutionError> {
        self.instance.bind(callable)(arg).map_err(|source| ResolutionError::Function {
            instruction: instruction.to_string(),
            source,
        })
    }
}

fn read<S: Record>(record: &S, field: &str) -> Result<Value, ResolutionError> {
    record.field(field).ok_or_else(|| ResolutionError::MissingField {
        field: field.to_string(),
    })
}

//! Callable binding
//!
//! Instructions may carry functions that need something from the transformer
//! they belong to: the per-instance [`Context`], or the class-wide constants
//! declared next to the instructions. Each function is tagged with what it
//! expects when it is declared, and [`Instance::bind`] turns it into a plain
//! single-argument closure.

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::record::{Context, Fields, Value};

/// Result of every user supplied function
pub type FnResult = std::result::Result<Value, BoxError>;

type FreeFn<A> = Arc<dyn Fn(&A) -> FnResult + Send + Sync>;
type MethodFn<A> = Arc<dyn Fn(&Instance<'_>, &A) -> FnResult + Send + Sync>;
type ClassFn<A> = Arc<dyn Fn(&Fields, &A) -> FnResult + Send + Sync>;

/// A function taking `&A`, tagged with how it must be invoked
pub enum Callable<A: ?Sized> {
    /// Free function or closure, invoked as is
    Function(FreeFn<A>),
    /// Function declared on the transformer that needs no receiver
    Static(FreeFn<A>),
    /// Receives the owning transformer instance
    Method(MethodFn<A>),
    /// Receives the class-wide constants of the transformer
    Class(ClassFn<A>),
}

impl<A: ?Sized> Callable<A> {
    /// Wrap a free function or closure
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&A) -> FnResult + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Wrap a function declared on the transformer without a receiver
    pub fn static_fn<F>(f: F) -> Self
    where
        F: Fn(&A) -> FnResult + Send + Sync + 'static,
    {
        Self::Static(Arc::new(f))
    }

    /// Wrap a function that reads the owning instance
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&Instance<'_>, &A) -> FnResult + Send + Sync + 'static,
    {
        Self::Method(Arc::new(f))
    }

    /// Wrap a function that reads the class-wide constants
    pub fn class<F>(f: F) -> Self
    where
        F: Fn(&Fields, &A) -> FnResult + Send + Sync + 'static,
    {
        Self::Class(Arc::new(f))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Static(_) => "static",
            Self::Method(_) => "method",
            Self::Class(_) => "class",
        }
    }
}

impl<A: ?Sized> Clone for Callable<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Function(f) => Self::Function(Arc::clone(f)),
            Self::Static(f) => Self::Static(Arc::clone(f)),
            Self::Method(f) => Self::Method(Arc::clone(f)),
            Self::Class(f) => Self::Class(Arc::clone(f)),
        }
    }
}

impl<A: ?Sized> fmt::Debug for Callable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable::{}", self.kind())
    }
}

/// Invocation-ready form of a [`Callable`]
pub type Bound<'a, A> = Box<dyn Fn(&A) -> FnResult + 'a>;

/// View of a transformer instance handed to [`Callable::Method`] functions
#[derive(Debug, Clone, Copy)]
pub struct Instance<'a> {
    context: &'a Context,
    constants: &'a Fields,
}

impl<'a> Instance<'a> {
    /// Create an instance view
    pub fn new(context: &'a Context, constants: &'a Fields) -> Self {
        Self { context, constants }
    }

    /// Instance-specific context
    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// Class-wide constants
    pub fn constants(&self) -> &'a Fields {
        self.constants
    }

    /// Supply whatever receiver `callable` was declared with
    pub fn bind<'c, A: ?Sized>(&'c self, callable: &'c Callable<A>) -> Bound<'c, A> {
        match callable {
            Callable::Function(f) | Callable::Static(f) => Box::new(move |arg: &A| f(arg)),
            Callable::Method(f) => Box::new(move |arg: &A| f(self, arg)),
            Callable::Class(f) => {
                let constants = self.constants;
                Box::new(move |arg: &A| f(constants, arg))
            }
        }
    }
}

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{adaptation::error::AdaptationError, types::TypeTag, types::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdaptationKey {
    pub adapted: TypeTag,
    pub provided: TypeTag,
}

impl AdaptationKey {
    pub fn new(adapted: TypeTag, provided: TypeTag) -> Self {
        Self { adapted, provided }
    }

    pub fn of<A: ?Sized + 'static, P: ?Sized + 'static>() -> Self {
        Self::new(TypeTag::of::<A>(), TypeTag::of::<P>())
    }
}

impl fmt::Display for AdaptationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.adapted, self.provided)
    }
}

type ConvertFn = dyn Fn(Value) -> Result<Value, AdaptationError> + Send + Sync;

/// Shared conversion function. Clones are the same converter; use
/// [`Converter::ptr_eq`] to observe that.
#[derive(Clone)]
pub struct Converter {
    func: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, AdaptationError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    pub fn convert(&self, value: Value) -> Result<Value, AdaptationError> {
        (self.func)(value)
    }

    /// `x -> next(self(x))`
    pub fn then(&self, next: &Converter) -> Converter {
        let first = Arc::clone(&self.func);
        let second = Arc::clone(&next.func);
        Converter::new(move |value| second(first(value)?))
    }

    pub fn ptr_eq(lhs: &Converter, rhs: &Converter) -> bool {
        Arc::ptr_eq(&lhs.func, &rhs.func)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Converter({:p})", Arc::as_ptr(&self.func))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Candidates whose output satisfies more of the other candidates' outputs
    /// are tried first; registration order decides among equals.
    #[default]
    MostSpecific,
    RegistrationOrder,
}

fn default_max_chain_depth() -> usize {
    16
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: default_max_chain_depth(),
            tie_break: TieBreak::default(),
        }
    }
}

use thiserror::Error;

use crate::types::TypeTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationErrorKind {
    NoAdaptation,
    ChainTooDeep,
    InputMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AdaptationError {
    pub kind: AdaptationErrorKind,
    pub from: TypeTag,
    pub to: TypeTag,
    pub message: String,
}

impl AdaptationError {
    pub fn new(
        kind: AdaptationErrorKind,
        from: TypeTag,
        to: TypeTag,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            from,
            to,
            message: message.into(),
        }
    }
}

pub fn no_adaptation(from: TypeTag, to: TypeTag) -> AdaptationError {
    AdaptationError::new(
        AdaptationErrorKind::NoAdaptation,
        from,
        to,
        format!("no adaptation known for {from} -> {to}"),
    )
}

pub fn chain_too_deep(from: TypeTag, to: TypeTag, max_depth: usize) -> AdaptationError {
    AdaptationError::new(
        AdaptationErrorKind::ChainTooDeep,
        from,
        to,
        format!("adaptation {from} -> {to} needs a chain deeper than {max_depth}"),
    )
}

pub fn input_mismatch(received: TypeTag, expected: TypeTag) -> AdaptationError {
    AdaptationError::new(
        AdaptationErrorKind::InputMismatch,
        received,
        expected,
        format!("converter expects {expected} but received {received}"),
    )
}

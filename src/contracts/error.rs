use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    Validation,
    ConstraintViolation,
    ArgumentTypeViolation,
    ReturnTypeViolation,
    PreconditionViolation,
    PostconditionViolation,
    InvariantViolation,
    Protocol,
    Binding,
    UnknownMember,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
    pub type_name: String,
    pub capability: Option<String>,
    pub member: Option<String>,
}

impl ContractError {
    pub fn new(
        kind: ContractErrorKind,
        type_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            type_name: type_name.into(),
            capability: None,
            member: None,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }
}

/// Failure reported by a precondition, postcondition, or invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Violation(pub String);

pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), Violation> {
    if condition {
        Ok(())
    } else {
        Err(Violation(message.into()))
    }
}

pub mod capability;
mod diagnostics;
pub mod engine;
pub mod error;
pub mod ports;
pub mod session;
pub mod shape;
pub mod slots;
pub mod types;

pub use capability::{AttributeConstraint, Capability, MethodSpec, ParamSpec, TypeConstraint};
pub use engine::ContractEngine;
pub use error::{ContractError, ContractErrorKind, Violation, ensure};
pub use ports::{Contract, Implementer, Subject};
pub use session::{Arguments, Call, EnforcementSession, MethodEnforcer, SessionPhase};
pub use shape::{Member, Shape};
pub use slots::Slots;
pub use types::{ContractsConfig, DeclareOptions, Declaration};

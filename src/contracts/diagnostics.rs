use std::{fmt::Debug, ops::Range};

use crate::contracts::error::{ContractError, ContractErrorKind, Violation};

/// Names everything a contract message has to mention: the concrete type, the
/// capability being enforced, and the member involved.
pub(crate) struct Report<'a> {
    pub type_name: String,
    pub capability: &'a str,
    pub member: &'a str,
    pub width: usize,
}

impl Report<'_> {
    fn error(&self, kind: ContractErrorKind, summary: &str, details: &str) -> ContractError {
        let error = ContractError::new(
            kind,
            self.type_name.clone(),
            compose(summary, details, self.width),
        )
        .with_member(self.member);
        if self.capability.is_empty() {
            error
        } else {
            error.with_capability(self.capability)
        }
    }

    pub fn missing_member(&self) -> ContractError {
        self.error(
            ContractErrorKind::Validation,
            "expected attribute or method missing",
            &format!(
                "{}.{} must be present to correctly implement the {} interface.",
                self.type_name, self.member, self.capability
            ),
        )
    }

    pub fn not_a_method(&self) -> ContractError {
        self.error(
            ContractErrorKind::Validation,
            "attribute expected to be a method",
            &format!(
                "{}.{}() must be a function to correctly implement the {} interface.",
                self.type_name, self.member, self.capability
            ),
        )
    }

    pub fn not_an_attribute(&self) -> ContractError {
        self.error(
            ContractErrorKind::Validation,
            "method found where an attribute was expected",
            &format!(
                "{}.{} must be a plain attribute to correctly implement the {} interface.",
                self.type_name, self.member, self.capability
            ),
        )
    }

    pub fn missing_arguments(
        &self,
        concrete: &str,
        abstract_signature: &str,
        missing: &[&str],
    ) -> ContractError {
        self.error(
            ContractErrorKind::Validation,
            "method is missing expected arguments",
            &format!(
                "{}.{}{} must be compatible with the signature {}{} to correctly implement \
                 the {} interface, but is missing the arguments {}.",
                self.type_name,
                self.member,
                concrete,
                self.member,
                abstract_signature,
                self.capability,
                missing.join(", ")
            ),
        )
    }

    pub fn unexpected_attribute_type(
        &self,
        expected: &str,
        value: &dyn Debug,
        value_type: &str,
    ) -> ContractError {
        self.error(
            ContractErrorKind::ConstraintViolation,
            "tried to set an attribute to an unexpected type",
            &format!(
                "{}.{} must be an instance of {} to correctly implement the {} interface, \
                 but {:?} is a {}.",
                self.type_name, self.member, expected, self.capability, value, value_type
            ),
        )
    }

    pub fn attribute_out_of_range(&self, range: &Range<i64>, value: &dyn Debug) -> ContractError {
        self.error(
            ContractErrorKind::ConstraintViolation,
            "tried to set an attribute out of expected range",
            &format!(
                "{}.{} must be in {:?} to correctly implement the {} interface, but {:?} is not.",
                self.type_name, self.member, range, self.capability, value
            ),
        )
    }

    pub fn unexpected_argument_type(
        &self,
        argument: &str,
        value: &dyn Debug,
        expected: &str,
    ) -> ContractError {
        self.error(
            ContractErrorKind::ArgumentTypeViolation,
            "method called with argument of unexpected type",
            &format!(
                "{}.{}() was called with {}={:?}, but the {} interface suggests the argument \
                 must be an instance of {}.",
                self.type_name, self.member, argument, value, self.capability, expected
            ),
        )
    }

    pub fn unexpected_return_type(&self, value: &dyn Debug, expected: &str) -> ContractError {
        self.error(
            ContractErrorKind::ReturnTypeViolation,
            "method returned a value of unexpected type",
            &format!(
                "{}.{}() returned {:?}, but the {} interface suggests the result must be an \
                 instance of {}.",
                self.type_name, self.member, value, self.capability, expected
            ),
        )
    }

    pub fn unbound_argument(&self, argument: &str) -> ContractError {
        self.error(
            ContractErrorKind::Binding,
            "method called without an expected argument",
            &format!(
                "{}.{}() was called without binding {}, which the {} interface constrains.",
                self.type_name, self.member, argument, self.capability
            ),
        )
    }

    pub fn precondition_failed(&self, violation: &Violation) -> ContractError {
        self.error(
            ContractErrorKind::PreconditionViolation,
            &format!("method precondition failed: {violation}"),
            &format!(
                "{}.{}() was called in a state the {} interface does not allow.",
                self.type_name, self.member, self.capability
            ),
        )
    }

    pub fn postcondition_failed(&self, violation: &Violation) -> ContractError {
        self.error(
            ContractErrorKind::PostconditionViolation,
            &format!("method postcondition failed: {violation}"),
            &format!(
                "{}.{}() produced a result the {} interface does not allow.",
                self.type_name, self.member, self.capability
            ),
        )
    }

    pub fn invariant_failed(&self, violation: &Violation) -> ContractError {
        self.error(
            ContractErrorKind::InvariantViolation,
            &format!("invariant failed: {violation}"),
            &format!(
                "{} no longer satisfies the invariant of the {} interface after {}() returned.",
                self.type_name, self.capability, self.member
            ),
        )
    }

    pub fn out_of_order(&self, what: &str) -> ContractError {
        self.error(
            ContractErrorKind::Protocol,
            "enforcement session used out of order",
            &format!(
                "the session enforcing {}.{}() {}.",
                self.type_name, self.member, what
            ),
        )
    }

    pub fn unknown_attribute(&self) -> ContractError {
        self.error(
            ContractErrorKind::UnknownMember,
            "tried to set an unknown attribute",
            &format!(
                "{}.{} is not an attribute of the type's shape.",
                self.type_name, self.member
            ),
        )
    }
}

fn compose(summary: &str, details: &str, width: usize) -> String {
    format!("{summary}\n\n{}", wrap(details, width))
}

fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

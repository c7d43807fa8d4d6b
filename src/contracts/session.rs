use std::{any::Any, sync::Arc};

use crate::{
    contracts::{
        capability::Capability,
        diagnostics::Report,
        engine::ContractEngine,
        error::ContractError,
        ports::Subject,
    },
    types::{Dynamic, TypeTag, Value, flatten},
};

enum Arg<'a> {
    Borrowed(&'a dyn Dynamic),
    Owned(Value),
}

impl Arg<'_> {
    fn as_dynamic(&self) -> &dyn Dynamic {
        match self {
            Self::Borrowed(value) => *value,
            Self::Owned(value) => value.as_dynamic(),
        }
    }
}

/// Arguments of one method call, bound by parameter name. The receiver is
/// never part of it.
#[derive(Default)]
pub struct Arguments<'a> {
    bound: Vec<(String, Arg<'a>)>,
}

impl<'a> Arguments<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(self, name: impl Into<String>, value: &'a dyn Dynamic) -> Self {
        self.bind(name.into(), Arg::Borrowed(flatten(value)))
    }

    pub fn value(self, name: impl Into<String>, value: impl Dynamic) -> Self {
        self.bind(name.into(), Arg::Owned(Value::new(value)))
    }

    fn bind(mut self, name: String, arg: Arg<'a>) -> Self {
        match self.bound.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = arg,
            None => self.bound.push((name, arg)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Dynamic> {
        self.bound
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, arg)| arg.as_dynamic())
    }

    pub fn get_as<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name)?.as_any().downcast_ref::<T>()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bound.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// A bound call as seen by preconditions and postconditions. `self` names
/// the receiver.
pub struct Call<'a> {
    receiver: &'a dyn Subject,
    receiver_value: &'a dyn Dynamic,
    args: &'a Arguments<'a>,
}

impl<'a> Call<'a> {
    pub(crate) fn new<S: Subject>(receiver: &'a S, args: &'a Arguments<'a>) -> Self {
        Self {
            receiver,
            receiver_value: receiver,
            args,
        }
    }

    pub fn receiver(&self) -> &dyn Subject {
        self.receiver
    }

    pub fn arg(&self, name: &str) -> Option<&dyn Dynamic> {
        if name == "self" {
            return Some(self.receiver_value);
        }
        self.args.get(name)
    }

    pub fn arg_as<T: Any>(&self, name: &str) -> Option<&T> {
        self.arg(name)?.as_any().downcast_ref::<T>()
    }

    /// Whether the argument bound to `name` is the receiver itself.
    pub fn is_receiver(&self, name: &str) -> bool {
        self.args
            .get(name)
            .is_some_and(|value| std::ptr::addr_eq(value, self.receiver_value))
    }
}

/// Checks attached to one method of one concrete type: the capabilities that
/// declare the method, in declaration order, and every invariant of the type.
#[derive(Debug)]
pub struct MethodEnforcer {
    type_tag: TypeTag,
    method: String,
    steps: Vec<Arc<Capability>>,
    invariants: Vec<Arc<Capability>>,
}

impl MethodEnforcer {
    pub(crate) fn new(type_tag: TypeTag, method: &str, enforced: &[Arc<Capability>]) -> Self {
        Self {
            type_tag,
            method: method.to_string(),
            steps: enforced
                .iter()
                .filter(|capability| capability.method_spec(method).is_some())
                .cloned()
                .collect(),
            invariants: enforced
                .iter()
                .filter(|capability| capability.has_invariant())
                .cloned()
                .collect(),
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn capability_names(&self) -> Vec<&str> {
        self.steps.iter().map(|capability| capability.name()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Open,
    Entered,
    Completed,
    Aborted,
}

/// One enforced invocation. [`enter`](Self::enter) runs the argument checks
/// and preconditions, [`exit`](Self::exit) the return checks, postconditions
/// and invariants. Each may run once, in that order.
pub struct EnforcementSession<'e> {
    engine: &'e ContractEngine,
    type_tag: TypeTag,
    method: String,
    enforcer: Option<Arc<MethodEnforcer>>,
    phase: SessionPhase,
}

impl<'e> EnforcementSession<'e> {
    pub(crate) fn new(
        engine: &'e ContractEngine,
        type_tag: TypeTag,
        method: &str,
        enforcer: Option<Arc<MethodEnforcer>>,
    ) -> Self {
        Self {
            engine,
            type_tag,
            method: method.to_string(),
            enforcer,
            phase: SessionPhase::Open,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_enforced(&self) -> bool {
        self.enforcer.is_some()
    }

    pub fn enforcer(&self) -> Option<&Arc<MethodEnforcer>> {
        self.enforcer.as_ref()
    }

    fn report<'r>(&'r self, capability: &'r str) -> Report<'r> {
        Report {
            type_name: self.type_tag.dotted(),
            capability,
            member: &self.method,
            width: self.engine.config().message_width,
        }
    }

    fn abort(&mut self, err: ContractError) -> Result<(), ContractError> {
        self.phase = SessionPhase::Aborted;
        tracing::debug!(
            target: "contracts",
            type_name = %self.type_tag,
            method = %self.method,
            kind = ?err.kind,
            "contract_violated"
        );
        Err(err)
    }

    pub fn enter<S: Subject>(
        &mut self,
        receiver: &S,
        args: &Arguments<'_>,
    ) -> Result<(), ContractError> {
        match self.phase {
            SessionPhase::Open => {}
            SessionPhase::Entered => {
                return Err(self.report("").out_of_order("was entered twice"));
            }
            SessionPhase::Completed | SessionPhase::Aborted => {
                return Err(self
                    .report("")
                    .out_of_order("was entered after it had finished"));
            }
        }

        let Some(enforcer) = self.enforcer.clone() else {
            self.phase = SessionPhase::Entered;
            return Ok(());
        };

        let call = Call::new(receiver, args);
        for capability in &enforcer.steps {
            let Some(spec) = capability.method_spec(&enforcer.method) else {
                continue;
            };
            for param in spec.params().iter().filter(|param| param.name != "self") {
                let Some(constraint) = &param.constraint else {
                    continue;
                };
                let Some(value) = args.get(&param.name) else {
                    let err = self.report(capability.name()).unbound_argument(&param.name);
                    return self.abort(err);
                };
                if !self
                    .engine
                    .satisfies_constraint(value, constraint, capability.name())
                {
                    let err = self.report(capability.name()).unexpected_argument_type(
                        &param.name,
                        &value,
                        &constraint.describe(capability.name()),
                    );
                    return self.abort(err);
                }
            }
            if let Err(violation) = spec.check_precondition(&call) {
                let err = self.report(capability.name()).precondition_failed(&violation);
                return self.abort(err);
            }
        }

        self.phase = SessionPhase::Entered;
        Ok(())
    }

    pub fn exit<S: Subject>(
        &mut self,
        receiver: &S,
        args: &Arguments<'_>,
        result: &dyn Dynamic,
    ) -> Result<(), ContractError> {
        match self.phase {
            SessionPhase::Entered => {}
            SessionPhase::Open => {
                return Err(self.report("").out_of_order("was resumed before it was entered"));
            }
            SessionPhase::Completed => {
                return Err(self.report("").out_of_order("was resumed twice"));
            }
            SessionPhase::Aborted => {
                return Err(self
                    .report("")
                    .out_of_order("was resumed after a contract violation"));
            }
        }

        let Some(enforcer) = self.enforcer.clone() else {
            self.phase = SessionPhase::Completed;
            return Ok(());
        };

        let result = flatten(result);
        let call = Call::new(receiver, args);
        for capability in &enforcer.steps {
            let Some(spec) = capability.method_spec(&enforcer.method) else {
                continue;
            };
            if let Some(constraint) = spec.returns() {
                if !self
                    .engine
                    .satisfies_constraint(result, constraint, capability.name())
                {
                    let err = self
                        .report(capability.name())
                        .unexpected_return_type(&result, &constraint.describe(capability.name()));
                    return self.abort(err);
                }
            }
            if let Err(violation) = spec.check_postcondition(&call, result) {
                let err = self.report(capability.name()).postcondition_failed(&violation);
                return self.abort(err);
            }
        }

        for capability in &enforcer.invariants {
            if let Err(violation) = capability.check_invariant(receiver) {
                let err = self.report(capability.name()).invariant_failed(&violation);
                return self.abort(err);
            }
        }

        self.phase = SessionPhase::Completed;
        Ok(())
    }
}

use crate::{
    contracts::{
        error::{ContractError, Violation},
        session::{Arguments, Call},
        shape::Shape,
        slots::Slots,
    },
    types::{Dynamic, TypeTag, Value},
};

/// Checks wrapped around a capability method. Both halves see the same bound
/// call; the postcondition also sees the result.
pub trait Contract: Send + Sync {
    fn precondition(&self, _call: &Call<'_>) -> Result<(), Violation> {
        Ok(())
    }

    fn postcondition(&self, _call: &Call<'_>, _result: &dyn Dynamic) -> Result<(), Violation> {
        Ok(())
    }
}

/// Object-safe view of an implementer, handed to contracts and invariants.
pub trait Subject: Dynamic {
    fn slots(&self) -> &Slots;

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.slots().get(name)
    }
}

pub trait Implementer: Subject + Sized {
    fn shape() -> Shape;

    fn slots_mut(&mut self) -> &mut Slots;

    fn get(&self, name: &str) -> Option<&Value> {
        self.slots().get(name)
    }

    fn set(&mut self, name: &str, value: impl Dynamic) -> Result<(), ContractError> {
        self.slots_mut().set(name, Value::new(value))
    }

    /// Runs `body` as the concrete implementation of `method`, enforcing every
    /// declared capability around it.
    fn invoke<R, F>(&self, method: &str, args: Arguments<'_>, body: F) -> Result<R, ContractError>
    where
        R: Dynamic,
        F: FnOnce(&Self, &Arguments<'_>) -> R,
    {
        let engine = self.slots().engine().clone();
        let mut session = engine.open_session(TypeTag::of::<Self>(), method);
        session.enter(self, &args)?;
        let result = body(self, &args);
        session.exit(self, &args, &result)?;
        Ok(result)
    }

    fn invoke_mut<R, F>(
        &mut self,
        method: &str,
        args: Arguments<'_>,
        body: F,
    ) -> Result<R, ContractError>
    where
        R: Dynamic,
        F: FnOnce(&mut Self, &Arguments<'_>) -> R,
    {
        let engine = self.slots().engine().clone();
        let mut session = engine.open_session(TypeTag::of::<Self>(), method);
        session.enter(&*self, &args)?;
        let result = body(self, &args);
        session.exit(&*self, &args, &result)?;
        Ok(result)
    }
}

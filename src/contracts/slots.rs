use std::{any::Any, collections::BTreeMap, fmt, sync::Arc};

use crate::{
    contracts::{
        diagnostics::Report, engine::ContractEngine, error::ContractError, ports::Implementer,
    },
    types::{TypeTag, Value},
};

/// Attribute storage owned by one instance. Reads fall back to the type's
/// defaults; writes are checked against the declared capabilities first.
#[derive(Clone)]
pub struct Slots {
    engine: ContractEngine,
    type_tag: TypeTag,
    defaults: Arc<BTreeMap<String, Value>>,
    overrides: BTreeMap<String, Value>,
}

impl Slots {
    pub fn new<T: Implementer>(engine: &ContractEngine) -> Self {
        Self {
            engine: engine.clone(),
            type_tag: TypeTag::of::<T>(),
            defaults: engine.defaults_for::<T>(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn engine(&self) -> &ContractEngine {
        &self.engine
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.overrides
            .get(name)
            .or_else(|| self.defaults.get(name))
    }

    pub fn get_as<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name)?.downcast_ref::<T>()
    }

    pub fn default_of(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Nothing is stored when the value violates a constraint.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ContractError> {
        let Some(default) = self.defaults.get(name) else {
            return Err(Report {
                type_name: self.type_tag.dotted(),
                capability: "",
                member: name,
                width: self.engine.config().message_width,
            }
            .unknown_attribute());
        };
        if *default != value {
            self.engine.check_attribute(self.type_tag, name, &value)?;
        }
        self.overrides.insert(name.to_string(), value);
        Ok(())
    }
}

impl PartialEq for Slots {
    fn eq(&self, other: &Self) -> bool {
        self.type_tag == other.type_tag
            && self.defaults == other.defaults
            && self.overrides == other.overrides
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slots")
            .field("type_tag", &self.type_tag)
            .field("overrides", &self.overrides)
            .finish()
    }
}

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, RwLock},
};

use crate::{
    contracts::{
        capability::{AttributeConstraint, Capability, TypeConstraint},
        diagnostics::Report,
        error::ContractError,
        ports::Implementer,
        session::{EnforcementSession, MethodEnforcer},
        shape::{Member, Shape},
        types::{ContractsConfig, DeclareOptions, Declaration},
    },
    types::{Dynamic, TypeLattice, TypeTag, Value, as_integer, flatten},
};

struct TypeRecord {
    defaults: Arc<BTreeMap<String, Value>>,
    capabilities: Vec<Arc<Capability>>,
    enforced: Vec<Arc<Capability>>,
    enforcers: BTreeMap<String, Arc<MethodEnforcer>>,
}

impl TypeRecord {
    fn new(shape: &Shape) -> Self {
        Self {
            defaults: Arc::new(shape.defaults()),
            capabilities: Vec::new(),
            enforced: Vec::new(),
            enforcers: BTreeMap::new(),
        }
    }

    fn implements(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|existing| existing.name() == capability)
    }

    fn enforces_method(&self, method: &str) -> bool {
        self.enforced
            .iter()
            .any(|capability| capability.method_spec(method).is_some())
    }
}

#[derive(Default)]
struct EngineInner {
    config: ContractsConfig,
    lattice: RwLock<TypeLattice>,
    records: RwLock<BTreeMap<TypeTag, TypeRecord>>,
}

/// Records which capabilities each concrete type declared and checks
/// attribute writes and method calls against them. Clones share state.
#[derive(Clone, Default)]
pub struct ContractEngine {
    inner: Arc<EngineInner>,
}

impl ContractEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ContractsConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                ..EngineInner::default()
            }),
        }
    }

    pub fn config(&self) -> &ContractsConfig {
        &self.inner.config
    }

    pub fn declare_subtype<Sub: ?Sized + 'static, Sup: ?Sized + 'static>(&self) {
        self.inner
            .lattice
            .write()
            .expect("lock poisoned")
            .declare_subtype::<Sub, Sup>();
    }

    pub fn satisfies(&self, candidate: TypeTag, required: TypeTag) -> bool {
        self.inner
            .lattice
            .read()
            .expect("lock poisoned")
            .satisfies(candidate, required)
    }

    pub fn declare<T: Implementer>(
        &self,
        capabilities: &[Arc<Capability>],
    ) -> Result<Declaration, ContractError> {
        self.declare_with::<T>(capabilities, DeclareOptions::default())
    }

    /// Adds `capabilities` to the set `T` implements. Capabilities already
    /// declared are not validated again, but a wrapping declaration starts
    /// enforcing them. Either every new capability validates against
    /// `T::shape()` and all are recorded, or none is.
    pub fn declare_with<T: Implementer>(
        &self,
        capabilities: &[Arc<Capability>],
        options: DeclareOptions,
    ) -> Result<Declaration, ContractError> {
        let type_tag = TypeTag::of::<T>();
        let shape = T::shape();
        let mut records = self.inner.records.write().expect("lock poisoned");

        let mut added: Vec<Arc<Capability>> = Vec::new();
        for capability in capabilities {
            let known = records
                .get(&type_tag)
                .is_some_and(|record| record.implements(capability.name()));
            if known || added.iter().any(|other| other.name() == capability.name()) {
                continue;
            }
            if self.inner.config.enforce {
                validate(&shape, capability, self.inner.config.message_width)?;
            }
            added.push(Arc::clone(capability));
        }

        let record = records
            .entry(type_tag)
            .or_insert_with(|| TypeRecord::new(&shape));
        record.capabilities.extend(added.iter().cloned());
        if options.wrap {
            let requested =
                |name: &str| capabilities.iter().any(|capability| capability.name() == name);
            record.enforced = record
                .capabilities
                .iter()
                .filter(|capability| {
                    requested(capability.name())
                        || record
                            .enforced
                            .iter()
                            .any(|enforced| enforced.name() == capability.name())
                })
                .cloned()
                .collect();
        }
        record.enforcers.clear();

        let added: Vec<String> = added
            .iter()
            .map(|capability| capability.name().to_string())
            .collect();
        tracing::debug!(
            target: "contracts",
            type_name = %type_tag,
            added = ?added,
            wrap = options.wrap,
            "capabilities_declared"
        );

        Ok(Declaration {
            type_tag,
            capabilities: record
                .capabilities
                .iter()
                .map(|capability| capability.name().to_string())
                .collect(),
            added,
        })
    }

    pub fn implements(&self, type_tag: TypeTag, capability: &str) -> bool {
        self.inner
            .records
            .read()
            .expect("lock poisoned")
            .get(&type_tag)
            .is_some_and(|record| record.implements(capability))
    }

    pub fn implements_type<T: ?Sized + 'static>(&self, capability: &str) -> bool {
        self.implements(TypeTag::of::<T>(), capability)
    }

    /// Instance check against the declared relation only; having the right
    /// members is not enough.
    pub fn is_a(&self, value: &dyn Dynamic, capability: &str) -> bool {
        self.implements(flatten(value).type_tag(), capability)
    }

    pub fn capabilities_of(&self, type_tag: TypeTag) -> Vec<String> {
        self.inner
            .records
            .read()
            .expect("lock poisoned")
            .get(&type_tag)
            .map(|record| {
                record
                    .capabilities
                    .iter()
                    .map(|capability| capability.name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Memoized per `(type, method)` until the type declares again. `None`
    /// when nothing is enforced on the method.
    pub fn enforcer(&self, type_tag: TypeTag, method: &str) -> Option<Arc<MethodEnforcer>> {
        if !self.inner.config.enforce {
            return None;
        }

        {
            let records = self.inner.records.read().expect("lock poisoned");
            let record = records.get(&type_tag)?;
            if !record.enforces_method(method) {
                return None;
            }
            if let Some(enforcer) = record.enforcers.get(method) {
                return Some(Arc::clone(enforcer));
            }
        }

        let mut records = self.inner.records.write().expect("lock poisoned");
        let record = records.get_mut(&type_tag)?;
        let enforced = record.enforced.clone();
        let enforcer = record
            .enforcers
            .entry(method.to_string())
            .or_insert_with(|| {
                tracing::debug!(
                    target: "contracts",
                    type_name = %type_tag,
                    method,
                    "enforcer_built"
                );
                Arc::new(MethodEnforcer::new(type_tag, method, &enforced))
            });
        Some(Arc::clone(enforcer))
    }

    pub fn open_session(&self, type_tag: TypeTag, method: &str) -> EnforcementSession<'_> {
        EnforcementSession::new(self, type_tag, method, self.enforcer(type_tag, method))
    }

    /// Checks a value about to be stored in `member` against every enforced
    /// capability constraining it, in declaration order.
    pub fn check_attribute(
        &self,
        type_tag: TypeTag,
        member: &str,
        value: &Value,
    ) -> Result<(), ContractError> {
        if !self.inner.config.enforce {
            return Ok(());
        }

        let constraining: Vec<Arc<Capability>> = {
            let records = self.inner.records.read().expect("lock poisoned");
            let Some(record) = records.get(&type_tag) else {
                return Ok(());
            };
            record
                .enforced
                .iter()
                .filter(|capability| capability.attribute_constraint(member).is_some())
                .cloned()
                .collect()
        };

        for capability in &constraining {
            let Some(constraint) = capability.attribute_constraint(member) else {
                continue;
            };
            let report = Report {
                type_name: type_tag.dotted(),
                capability: capability.name(),
                member,
                width: self.inner.config.message_width,
            };
            let err = match constraint {
                AttributeConstraint::InstanceOf(expected) => {
                    if self.satisfies_constraint(value.as_dynamic(), expected, capability.name()) {
                        continue;
                    }
                    report.unexpected_attribute_type(
                        &expected.describe(capability.name()),
                        value,
                        &value.tag().short_name(),
                    )
                }
                AttributeConstraint::Range(range) => {
                    let within = as_integer(value.as_dynamic()).is_some_and(|number| {
                        i128::from(range.start) <= number && number < i128::from(range.end)
                    });
                    if within {
                        continue;
                    }
                    report.attribute_out_of_range(range, value)
                }
            };
            tracing::debug!(
                target: "contracts",
                type_name = %type_tag,
                member,
                kind = ?err.kind,
                "contract_violated"
            );
            return Err(err);
        }

        Ok(())
    }

    pub fn defaults_for<T: Implementer>(&self) -> Arc<BTreeMap<String, Value>> {
        let records = self.inner.records.read().expect("lock poisoned");
        match records.get(&TypeTag::of::<T>()) {
            Some(record) => Arc::clone(&record.defaults),
            None => Arc::new(T::shape().defaults()),
        }
    }

    pub fn satisfies_constraint(
        &self,
        value: &dyn Dynamic,
        constraint: &TypeConstraint,
        enforcing: &str,
    ) -> bool {
        let tag = flatten(value).type_tag();
        match constraint {
            TypeConstraint::Type(required) => self.satisfies(tag, *required),
            TypeConstraint::Implements(capability) => self.implements(tag, capability),
            TypeConstraint::This => self.implements(tag, enforcing),
        }
    }
}

impl fmt::Debug for ContractEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.inner.records.read().expect("lock poisoned").len();
        f.debug_struct("ContractEngine")
            .field("config", &self.inner.config)
            .field("types", &types)
            .finish()
    }
}

fn validate(shape: &Shape, capability: &Capability, width: usize) -> Result<(), ContractError> {
    let type_name = shape.type_tag().dotted();
    for (name, _) in capability.attributes() {
        let report = member_report(&type_name, capability, name, width);
        match shape.member(name) {
            None => return Err(report.missing_member()),
            Some(member) if member.is_method() => return Err(report.not_an_attribute()),
            Some(_) => {}
        }
    }

    for spec in capability.methods() {
        let report = member_report(&type_name, capability, spec.name(), width);
        let Some(member) = shape.member(spec.name()) else {
            return Err(report.missing_member());
        };
        let Member::Method {
            params,
            accepts_extra,
        } = member
        else {
            return Err(report.not_a_method());
        };
        if *accepts_extra {
            continue;
        }
        let missing: Vec<&str> = spec
            .param_names()
            .filter(|param| !params.iter().any(|concrete| concrete.as_str() == *param))
            .collect();
        if !missing.is_empty() {
            return Err(report.missing_arguments(
                &member.signature().unwrap_or_default(),
                &spec.signature(),
                &missing,
            ));
        }
    }

    Ok(())
}

fn member_report<'a>(
    type_name: &str,
    capability: &'a Capability,
    member: &'a str,
    width: usize,
) -> Report<'a> {
    Report {
        type_name: type_name.to_string(),
        capability: capability.name(),
        member,
        width,
    }
}

use std::{fmt, ops::Range, sync::Arc};

use crate::{
    contracts::{
        error::Violation,
        ports::{Contract, Subject},
        session::Call,
    },
    types::{Dynamic, TypeTag},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeConstraint {
    /// Instance of the type, or of a type declared as its subtype.
    Type(TypeTag),
    /// Instance of a type that declared the named capability.
    Implements(String),
    /// Instance of a type that declared the capability doing the checking.
    This,
}

impl TypeConstraint {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeTag::of::<T>())
    }

    pub fn implements(capability: impl Into<String>) -> Self {
        Self::Implements(capability.into())
    }

    pub fn describe(&self, enforcing: &str) -> String {
        match self {
            Self::Type(tag) => tag.short_name(),
            Self::Implements(name) => name.clone(),
            Self::This => enforcing.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeConstraint {
    InstanceOf(TypeConstraint),
    /// Half-open integer range.
    Range(Range<i64>),
}

impl AttributeConstraint {
    pub fn instance_of<T: ?Sized + 'static>() -> Self {
        Self::InstanceOf(TypeConstraint::of::<T>())
    }

    pub fn range(range: Range<i64>) -> Self {
        Self::Range(range)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub constraint: Option<TypeConstraint>,
}

type Precondition = dyn Fn(&Call<'_>) -> Result<(), Violation> + Send + Sync;
type Postcondition = dyn Fn(&Call<'_>, &dyn Dynamic) -> Result<(), Violation> + Send + Sync;
type Invariant = dyn Fn(&dyn Subject) -> Result<(), Violation> + Send + Sync;

#[derive(Clone, Default)]
enum ContractBody {
    #[default]
    Empty,
    Closures {
        precondition: Option<Arc<Precondition>>,
        postcondition: Option<Arc<Postcondition>>,
    },
    Custom(Arc<dyn Contract>),
}

/// Abstract signature of a capability method. The receiver `self` is always
/// the first parameter.
#[derive(Clone)]
pub struct MethodSpec {
    name: String,
    params: Vec<ParamSpec>,
    returns: Option<TypeConstraint>,
    body: ContractBody,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: vec![ParamSpec {
                name: "self".to_string(),
                constraint: None,
            }],
            returns: None,
            body: ContractBody::Empty,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            constraint: None,
        });
        self
    }

    pub fn with_typed_param(mut self, name: impl Into<String>, constraint: TypeConstraint) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            constraint: Some(constraint),
        });
        self
    }

    pub fn with_return(mut self, constraint: TypeConstraint) -> Self {
        self.returns = Some(constraint);
        self
    }

    pub fn with_contract(mut self, contract: impl Contract + 'static) -> Self {
        self.body = ContractBody::Custom(Arc::new(contract));
        self
    }

    pub fn with_precondition<F>(mut self, check: F) -> Self
    where
        F: Fn(&Call<'_>) -> Result<(), Violation> + Send + Sync + 'static,
    {
        let postcondition = match self.body {
            ContractBody::Closures { postcondition, .. } => postcondition,
            _ => None,
        };
        self.body = ContractBody::Closures {
            precondition: Some(Arc::new(check)),
            postcondition,
        };
        self
    }

    pub fn with_postcondition<F>(mut self, check: F) -> Self
    where
        F: Fn(&Call<'_>, &dyn Dynamic) -> Result<(), Violation> + Send + Sync + 'static,
    {
        let precondition = match self.body {
            ContractBody::Closures { precondition, .. } => precondition,
            _ => None,
        };
        self.body = ContractBody::Closures {
            precondition,
            postcondition: Some(Arc::new(check)),
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|param| param.name.as_str())
    }

    pub fn returns(&self) -> Option<&TypeConstraint> {
        self.returns.as_ref()
    }

    pub fn has_contract(&self) -> bool {
        !matches!(self.body, ContractBody::Empty)
    }

    pub fn signature(&self) -> String {
        format!(
            "({})",
            self.param_names().collect::<Vec<_>>().join(", ")
        )
    }

    pub(crate) fn check_precondition(&self, call: &Call<'_>) -> Result<(), Violation> {
        match &self.body {
            ContractBody::Empty => Ok(()),
            ContractBody::Closures { precondition, .. } => {
                precondition.as_ref().map_or(Ok(()), |check| check(call))
            }
            ContractBody::Custom(contract) => contract.precondition(call),
        }
    }

    pub(crate) fn check_postcondition(
        &self,
        call: &Call<'_>,
        result: &dyn Dynamic,
    ) -> Result<(), Violation> {
        match &self.body {
            ContractBody::Empty => Ok(()),
            ContractBody::Closures { postcondition, .. } => postcondition
                .as_ref()
                .map_or(Ok(()), |check| check(call, result)),
            ContractBody::Custom(contract) => contract.postcondition(call, result),
        }
    }
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("has_contract", &self.has_contract())
            .finish()
    }
}

/// Named contract a concrete type can declare to implement. Capabilities are
/// identified by name.
#[derive(Clone)]
pub struct Capability {
    name: String,
    attributes: Vec<(String, AttributeConstraint)>,
    methods: Vec<MethodSpec>,
    invariant: Option<Arc<Invariant>>,
}

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            methods: Vec::new(),
            invariant: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, constraint: AttributeConstraint) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = constraint,
            None => self.attributes.push((name, constraint)),
        }
        self
    }

    pub fn with_method(mut self, spec: MethodSpec) -> Self {
        match self
            .methods
            .iter_mut()
            .find(|existing| existing.name == spec.name)
        {
            Some(existing) => *existing = spec,
            None => self.methods.push(spec),
        }
        self
    }

    pub fn with_invariant<F>(mut self, check: F) -> Self
    where
        F: Fn(&dyn Subject) -> Result<(), Violation> + Send + Sync + 'static,
    {
        self.invariant = Some(Arc::new(check));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, AttributeConstraint)] {
        &self.attributes
    }

    pub fn methods(&self) -> &[MethodSpec] {
        &self.methods
    }

    pub fn attribute_constraint(&self, name: &str) -> Option<&AttributeConstraint> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, constraint)| constraint)
    }

    pub fn method_spec(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|spec| spec.name == name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(self.methods.iter().map(|spec| spec.name.as_str()))
    }

    pub fn has_invariant(&self) -> bool {
        self.invariant.is_some()
    }

    pub(crate) fn check_invariant(&self, subject: &dyn Subject) -> Result<(), Violation> {
        self.invariant
            .as_ref()
            .map_or(Ok(()), |check| check(subject))
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("methods", &self.methods)
            .field("has_invariant", &self.has_invariant())
            .finish()
    }
}

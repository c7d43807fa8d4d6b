use std::collections::BTreeMap;

use crate::types::{Dynamic, TypeTag, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Attribute {
        default: Value,
    },
    Method {
        /// Parameter names, receiver first.
        params: Vec<String>,
        /// Accepts keyword arguments beyond `params`.
        accepts_extra: bool,
    },
}

impl Member {
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method { .. })
    }

    pub fn signature(&self) -> Option<String> {
        match self {
            Self::Attribute { .. } => None,
            Self::Method {
                params,
                accepts_extra,
            } => {
                let mut names: Vec<&str> = params.iter().map(String::as_str).collect();
                if *accepts_extra {
                    names.push("**kwargs");
                }
                Some(format!("({})", names.join(", ")))
            }
        }
    }
}

/// What a concrete type exposes: its attributes with their class-level
/// defaults, and its methods with their parameter names.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    type_tag: TypeTag,
    members: BTreeMap<String, Member>,
}

impl Shape {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_tag: TypeTag::of::<T>(),
            members: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, default: impl Dynamic) -> Self {
        self.members.insert(
            name.into(),
            Member::Attribute {
                default: Value::new(default),
            },
        );
        self
    }

    pub fn with_method(self, name: impl Into<String>, params: &[&str]) -> Self {
        self.method(name.into(), params, false)
    }

    pub fn with_open_method(self, name: impl Into<String>, params: &[&str]) -> Self {
        self.method(name.into(), params, true)
    }

    fn method(mut self, name: String, params: &[&str], accepts_extra: bool) -> Self {
        let params = std::iter::once("self")
            .chain(params.iter().copied().filter(|param| *param != "self"))
            .map(str::to_string)
            .collect();
        self.members.insert(
            name,
            Member::Method {
                params,
                accepts_extra,
            },
        );
        self
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn attribute_default(&self, name: &str) -> Option<&Value> {
        match self.members.get(name)? {
            Member::Attribute { default } => Some(default),
            Member::Method { .. } => None,
        }
    }

    pub fn defaults(&self) -> BTreeMap<String, Value> {
        self.members
            .iter()
            .filter_map(|(name, member)| match member {
                Member::Attribute { default } => Some((name.clone(), default.clone())),
                Member::Method { .. } => None,
            })
            .collect()
    }
}

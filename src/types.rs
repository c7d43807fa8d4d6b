use std::{
    any::{Any, TypeId},
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
    hash::{Hash, Hasher},
};

/// Runtime identity of a Rust type, used wherever a value's type has to be
/// compared, ordered, or named at runtime.
///
/// Abstract types that have no values of their own (a "number" or a "readable
/// stream") are represented by zero-sized marker structs and related to concrete
/// types through a [`TypeLattice`].
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
    pub fn short_name(&self) -> String {
        strip_module_paths(self.name)
    }

    /// Module path and type name separated by a colon, e.g. `app::people:Person`.
    pub fn dotted(&self) -> String {
        let head_end = self.name.find('<').unwrap_or(self.name.len());
        match self.name[..head_end].rfind("::") {
            Some(split) => format!("{}:{}", &self.name[..split], &self.name[split + 2..]),
            None => self.name.to_string(),
        }
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

fn strip_module_paths(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment_start = 0;
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(ch);
        if !(ch.is_alphanumeric() || ch == '_') {
            segment_start = out.len();
        }
    }

    out
}

/// Object-safe view of any cloneable, comparable, debuggable value.
pub trait Dynamic: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_boxed(&self) -> Box<dyn Dynamic>;
    fn eq_dynamic(&self, other: &dyn Dynamic) -> bool;
    fn type_tag(&self) -> TypeTag;
}

impl<T> Dynamic for T
where
    T: Any + fmt::Debug + Clone + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn Dynamic> {
        Box::new(self.clone())
    }

    fn eq_dynamic(&self, other: &dyn Dynamic) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }
}

/// Owned, type-erased value.
pub struct Value(Box<dyn Dynamic>);

impl Value {
    pub fn new<T: Dynamic>(value: T) -> Self {
        let boxed: Box<dyn Dynamic> = Box::new(value);
        if !boxed.as_any().is::<Value>() {
            return Self(boxed);
        }
        match boxed.into_any().downcast::<Value>() {
            Ok(inner) => *inner,
            Err(_) => unreachable!("checked with Any::is"),
        }
    }

    /// The unit value, used as the "unset" default of an attribute.
    pub fn none() -> Self {
        Self::new(())
    }

    pub fn is_none(&self) -> bool {
        self.is::<()>()
    }

    pub fn tag(&self) -> TypeTag {
        self.0.type_tag()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: Any>(self) -> Result<T, Value> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.0.into_any().downcast::<T>() {
            Ok(inner) => Ok(*inner),
            Err(_) => unreachable!("checked with Any::is"),
        }
    }

    pub fn as_dynamic(&self) -> &dyn Dynamic {
        self.0.as_ref()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Self(self.0.clone_boxed())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dynamic(other.0.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

/// Looks through a [`Value`] passed as a plain `&dyn Dynamic`.
pub fn flatten(value: &dyn Dynamic) -> &dyn Dynamic {
    match value.as_any().downcast_ref::<Value>() {
        Some(inner) => inner.as_dynamic(),
        None => value,
    }
}

/// Widens any primitive integer to `i128`; `None` for every other type.
pub fn as_integer(value: &dyn Dynamic) -> Option<i128> {
    let any = value.as_any();
    macro_rules! widen {
        ($($ty:ty),*) => {
            $(
                if let Some(number) = any.downcast_ref::<$ty>() {
                    return Some(*number as i128);
                }
            )*
        };
    }
    widen!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
    None
}

/// Declared subtype relation between [`TypeTag`]s.
///
/// Rust has no class inheritance, so "`int` is a `Number`" has to be stated
/// explicitly. The relation is reflexive and transitive; cycles are tolerated.
#[derive(Debug, Clone, Default)]
pub struct TypeLattice {
    supertypes: BTreeMap<TypeTag, BTreeSet<TypeTag>>,
}

impl TypeLattice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the edge was already known.
    pub fn declare(&mut self, subtype: TypeTag, supertype: TypeTag) -> bool {
        if subtype == supertype {
            return false;
        }
        self.supertypes
            .entry(subtype)
            .or_default()
            .insert(supertype)
    }

    pub fn declare_subtype<Sub: ?Sized + 'static, Sup: ?Sized + 'static>(&mut self) -> bool {
        self.declare(TypeTag::of::<Sub>(), TypeTag::of::<Sup>())
    }

    pub fn satisfies(&self, candidate: TypeTag, required: TypeTag) -> bool {
        if candidate == required {
            return true;
        }

        let mut visited = BTreeSet::from([candidate]);
        let mut queue = VecDeque::from([candidate]);
        while let Some(current) = queue.pop_front() {
            let Some(parents) = self.supertypes.get(&current) else {
                continue;
            };
            for parent in parents {
                if *parent == required {
                    return true;
                }
                if visited.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
        }

        false
    }

    pub fn direct_supertypes(&self, tag: TypeTag) -> impl Iterator<Item = TypeTag> + '_ {
        self.supertypes.get(&tag).into_iter().flatten().copied()
    }
}

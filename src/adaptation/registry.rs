use std::{cmp::Reverse, collections::BTreeMap, sync::RwLock};

use crate::{
    adaptation::{
        error::{
            AdaptationError, AdaptationErrorKind, chain_too_deep, input_mismatch, no_adaptation,
        },
        ports::{Adapts, Construct, Factory},
        types::{AdaptationConfig, AdaptationKey, Converter, TieBreak},
    },
    types::{Dynamic, TypeLattice, TypeTag, Value},
};

#[derive(Clone)]
struct Entry {
    key: AdaptationKey,
    converter: Converter,
    /// Typed factories downcast to exactly `key.adapted`; explicit converters
    /// also take its declared subtypes.
    exact_input: bool,
}

impl Entry {
    fn accepts(&self, lattice: &TypeLattice, source: TypeTag) -> bool {
        if self.exact_input {
            source == self.key.adapted
        } else {
            lattice.satisfies(source, self.key.adapted)
        }
    }
}

#[derive(Default)]
struct RegistryState {
    entries: Vec<Entry>,
    by_key: BTreeMap<AdaptationKey, usize>,
    lattice: TypeLattice,
}

impl RegistryState {
    fn exact(&self, key: &AdaptationKey) -> Option<&Converter> {
        self.by_key
            .get(key)
            .map(|position| &self.entries[*position].converter)
    }

    fn candidates(&self, target: TypeTag, tie_break: TieBreak) -> Vec<Entry> {
        let mut candidates: Vec<Entry> = self
            .entries
            .iter()
            .filter(|entry| self.lattice.satisfies(entry.key.provided, target))
            .cloned()
            .collect();

        if tie_break == TieBreak::MostSpecific && candidates.len() > 1 {
            let outputs: Vec<TypeTag> = candidates.iter().map(|entry| entry.key.provided).collect();
            candidates.sort_by_key(|entry| {
                let provided = entry.key.provided;
                Reverse(
                    outputs
                        .iter()
                        .filter(|other| {
                            **other != provided && self.lattice.satisfies(provided, **other)
                        })
                        .count(),
                )
            });
        }

        candidates
    }
}

/// Pairs under resolution are never re-entered, so cycles end the branch
/// without failing the search.
struct Search<'a> {
    state: &'a RegistryState,
    config: &'a AdaptationConfig,
    in_progress: Vec<AdaptationKey>,
    depth_pruned: bool,
}

impl Search<'_> {
    fn resolve(&mut self, from: TypeTag, to: TypeTag) -> Option<Converter> {
        let key = AdaptationKey::new(from, to);
        if let Some(converter) = self.state.exact(&key) {
            return Some(converter.clone());
        }
        if self.in_progress.contains(&key) {
            return None;
        }
        if self.in_progress.len() >= self.config.max_chain_depth {
            self.depth_pruned = true;
            return None;
        }

        self.in_progress.push(key);
        let mut found = None;
        for candidate in self.state.candidates(to, self.config.tie_break) {
            if candidate.accepts(&self.state.lattice, from) {
                found = Some(candidate.converter);
                break;
            }
            if let Some(chain) = self.resolve(from, candidate.key.adapted) {
                found = Some(chain.then(&candidate.converter));
                break;
            }
        }
        self.in_progress.pop();

        found
    }
}

/// Maps `(adapted, provided)` type pairs to converters and finds converter
/// chains for pairs that were never registered directly.
#[derive(Default)]
pub struct AdaptationRegistry {
    config: AdaptationConfig,
    state: RwLock<RegistryState>,
}

impl AdaptationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AdaptationConfig) -> Self {
        Self {
            config,
            state: RwLock::default(),
        }
    }

    pub fn config(&self) -> &AdaptationConfig {
        &self.config
    }

    pub fn register<M, F: Factory<M>>(&self, factory: F) -> AdaptationKey {
        let key = factory.key();
        self.insert(key, factory.into_converter(), true);
        key
    }

    pub fn register_type<T: Adapts>(&self) -> AdaptationKey {
        self.register(Construct::<T>::new())
    }

    pub fn register_explicit(&self, adapted: TypeTag, provided: TypeTag, converter: Converter) {
        self.insert(AdaptationKey::new(adapted, provided), converter, false);
    }

    fn insert(&self, key: AdaptationKey, converter: Converter, exact_input: bool) {
        let mut guard = self.state.write().expect("lock poisoned");
        let state = &mut *guard;
        let entry = Entry {
            key,
            converter,
            exact_input,
        };
        let replaced = match state.by_key.get(&key) {
            Some(position) => {
                state.entries[*position] = entry;
                true
            }
            None => {
                state.by_key.insert(key, state.entries.len());
                state.entries.push(entry);
                false
            }
        };
        tracing::debug!(
            target: "adaptation",
            adapted = %key.adapted,
            provided = %key.provided,
            replaced,
            "converter_registered"
        );
    }

    pub fn declare_subtype<Sub: ?Sized + 'static, Sup: ?Sized + 'static>(&self) {
        self.state
            .write()
            .expect("lock poisoned")
            .lattice
            .declare_subtype::<Sub, Sup>();
    }

    pub fn satisfies(&self, candidate: TypeTag, required: TypeTag) -> bool {
        self.state
            .read()
            .expect("lock poisoned")
            .lattice
            .satisfies(candidate, required)
    }

    pub fn keys(&self) -> Vec<AdaptationKey> {
        self.state
            .read()
            .expect("lock poisoned")
            .entries
            .iter()
            .map(|entry| entry.key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolve(&self, from: TypeTag, to: TypeTag) -> Result<Converter, AdaptationError> {
        let guard = self.state.read().expect("lock poisoned");
        let mut search = Search {
            state: &*guard,
            config: &self.config,
            in_progress: Vec::new(),
            depth_pruned: false,
        };

        match search.resolve(from, to) {
            Some(converter) => Ok(converter),
            None => {
                let err = if search.depth_pruned {
                    chain_too_deep(from, to, self.config.max_chain_depth)
                } else {
                    no_adaptation(from, to)
                };
                tracing::debug!(
                    target: "adaptation",
                    from = %from,
                    to = %to,
                    kind = ?err.kind,
                    "adaptation_unresolved"
                );
                Err(err)
            }
        }
    }

    /// Values that already satisfy `target` come back untouched.
    pub fn adapt(&self, value: Value, target: TypeTag) -> Result<Value, AdaptationError> {
        let source = value.tag();
        if self.satisfies(source, target) {
            return Ok(value);
        }
        self.resolve(source, target)?.convert(value)
    }

    /// Like [`adapt`](Self::adapt), but answers `default` when no adaptation
    /// path exists. A path hidden by the depth limit is still reported.
    pub fn adapt_or(
        &self,
        value: Value,
        target: TypeTag,
        default: Value,
    ) -> Result<Value, AdaptationError> {
        match self.adapt(value, target) {
            Err(err) if err.kind == AdaptationErrorKind::NoAdaptation => Ok(default),
            other => other,
        }
    }

    pub fn adapt_into<T: Dynamic>(&self, value: impl Dynamic) -> Result<T, AdaptationError> {
        let target = TypeTag::of::<T>();
        let adapted = self.adapt(Value::new(value), target)?;
        let received = adapted.tag();
        adapted
            .downcast::<T>()
            .map_err(|_| input_mismatch(received, target))
    }
}

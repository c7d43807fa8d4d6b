use std::marker::PhantomData;

use crate::{
    adaptation::{
        error::input_mismatch,
        types::{AdaptationKey, Converter},
    },
    types::{Dynamic, TypeTag, Value},
};

/// A type that can be built from exactly one other type, like a constructor
/// taking a single argument.
pub trait Adapts: Dynamic + Sized {
    type Adapted: Dynamic;

    fn adapt_from(adapted: Self::Adapted) -> Self;
}

/// Something the registry can turn into a converter while inferring its
/// `(adapted, provided)` key from its declared types.
///
/// `Marker` only disambiguates the blanket implementations.
pub trait Factory<Marker>: Send + Sync + 'static {
    fn key(&self) -> AdaptationKey;

    fn into_converter(self) -> Converter;
}

impl<F, A, B> Factory<fn(A) -> B> for F
where
    F: Fn(A) -> B + Send + Sync + 'static,
    A: Dynamic,
    B: Dynamic,
{
    fn key(&self) -> AdaptationKey {
        AdaptationKey::of::<A, B>()
    }

    fn into_converter(self) -> Converter {
        Converter::new(move |value: Value| {
            let received = value.tag();
            let input = value
                .downcast::<A>()
                .map_err(|_| input_mismatch(received, TypeTag::of::<A>()))?;
            Ok(Value::new(self(input)))
        })
    }
}

/// Type-like factory: adapts `T::Adapted` into `T` through [`Adapts`].
pub struct Construct<T>(PhantomData<fn() -> T>);

impl<T> Construct<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Construct<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Adapts> Factory<Construct<T>> for Construct<T> {
    fn key(&self) -> AdaptationKey {
        AdaptationKey::of::<T::Adapted, T>()
    }

    fn into_converter(self) -> Converter {
        Converter::new(|value: Value| {
            let received = value.tag();
            let input = value
                .downcast::<T::Adapted>()
                .map_err(|_| input_mismatch(received, TypeTag::of::<T::Adapted>()))?;
            Ok(Value::new(T::adapt_from(input)))
        })
    }
}

pub fn infer<M, F: Factory<M>>(factory: &F) -> AdaptationKey {
    factory.key()
}

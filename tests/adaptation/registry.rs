use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use conformance::{
    adaptation::{AdaptationErrorKind, Adapts, Converter},
    types::{TypeTag, Value},
};

use crate::fixtures::{self, IoBase, Number, ReadableStream, StringReader};

#[derive(Debug, Clone, PartialEq)]
struct Alpha;

#[derive(Debug, Clone, PartialEq)]
struct Beta;

#[derive(Debug, Clone, PartialEq)]
struct Gamma;

#[test]
fn adapts_through_constructor_and_formatter() {
    let registry = fixtures::registry();
    registry.register_type::<StringReader>();
    registry.register_explicit(
        TypeTag::of::<Number>(),
        TypeTag::of::<String>(),
        fixtures::format_number(),
    );

    let reader = registry
        .adapt(Value::new("hello".to_string()), TypeTag::of::<IoBase>())
        .expect("string adapts to an io object")
        .downcast::<StringReader>()
        .expect("reader is the concrete result");
    assert_eq!(reader.read(), "hello");

    assert_eq!(
        registry.adapt_into::<String>(5000_i64).expect("number formats"),
        "5,000"
    );
}

#[test]
fn conforming_value_is_returned_unchanged() {
    let registry = fixtures::registry();
    let value = registry
        .adapt(Value::new(5000_i64), TypeTag::of::<Number>())
        .expect("i64 already is a number");
    assert_eq!(value, Value::new(5000_i64));
}

#[test]
fn missing_adaptation_names_both_types() {
    let registry = fixtures::registry();
    let err = registry
        .adapt(Value::new(5000_i64), TypeTag::of::<String>())
        .expect_err("nothing is registered");
    assert_eq!(err.kind, AdaptationErrorKind::NoAdaptation);
    assert_eq!(err.to_string(), "no adaptation known for i64 -> String");
}

#[test]
fn unrelated_converter_does_not_make_a_path() {
    let registry = fixtures::registry();
    registry.register(|text: String| ReadableStream(text));

    let err = registry
        .adapt(Value::new(5000_i64), TypeTag::of::<ReadableStream>())
        .expect_err("no path from i64 to a stream");
    assert_eq!(err.kind, AdaptationErrorKind::NoAdaptation);
    assert_eq!(err.to_string(), "no adaptation known for i64 -> ReadableStream");
}

#[test]
fn default_is_returned_without_invoking_any_converter() {
    let registry = fixtures::registry();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    registry.register(move |text: String| {
        counted.fetch_add(1, Ordering::SeqCst);
        ReadableStream(text)
    });

    let value = registry
        .adapt_or(
            Value::new(5000_i64),
            TypeTag::of::<String>(),
            Value::new("5000".to_string()),
        )
        .expect("default replaces the missing adaptation");
    assert_eq!(value, Value::new("5000".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn exact_lookup_is_deterministic() {
    let registry = fixtures::registry();
    registry.register_explicit(
        TypeTag::of::<Number>(),
        TypeTag::of::<String>(),
        fixtures::format_number(),
    );

    let first = registry
        .resolve(TypeTag::of::<Number>(), TypeTag::of::<String>())
        .expect("registered");
    let second = registry
        .resolve(TypeTag::of::<Number>(), TypeTag::of::<String>())
        .expect("registered");
    assert!(Converter::ptr_eq(&first, &second));
}

#[test]
fn chains_compose_in_order() {
    let registry = fixtures::registry();
    registry.register(|value: u8| u16::from(value) * 10);
    registry.register(|value: u16| format!("<{value}>"));

    assert_eq!(registry.adapt_into::<String>(4_u8).expect("two hops"), "<40>");
}

#[test]
fn cyclic_registrations_end_without_a_path() {
    let registry = fixtures::registry();
    registry.register(|_: Beta| Alpha);
    registry.register(|_: Gamma| Beta);
    registry.register(|_: Alpha| Gamma);

    let err = registry
        .resolve(TypeTag::of::<u8>(), TypeTag::of::<Alpha>())
        .expect_err("the only candidates lead around the cycle");
    assert_eq!(err.kind, AdaptationErrorKind::NoAdaptation);

    let value = registry
        .adapt_or(Value::new(1_u8), TypeTag::of::<Alpha>(), Value::none())
        .expect("no path means the default");
    assert_eq!(value, Value::none());
}

#[test]
fn two_way_converters_still_fall_back_to_the_default() {
    let registry = fixtures::registry();
    registry.register_type::<StringReader>();
    registry.register(|reader: StringReader| reader.read().to_string());

    let err = registry
        .resolve(TypeTag::of::<i64>(), TypeTag::of::<String>())
        .expect_err("neither direction starts from i64");
    assert_eq!(err.kind, AdaptationErrorKind::NoAdaptation);

    let value = registry
        .adapt_or(
            Value::new(5000_i64),
            TypeTag::of::<String>(),
            Value::new("5000".to_string()),
        )
        .expect("default replaces the missing adaptation");
    assert_eq!(value, Value::new("5000".to_string()));

    assert_eq!(
        registry
            .adapt_into::<String>(StringReader::adapt_from("round trip".to_string()))
            .expect("reader reads back"),
        "round trip"
    );
}

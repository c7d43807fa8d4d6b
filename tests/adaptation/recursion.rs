use std::ops::Range;

use conformance::{
    adaptation::{Converter, error::input_mismatch},
    types::{TypeTag, Value},
};

use crate::fixtures::{self, Measurable, Number};

#[test]
fn measurable_values_format_through_their_length() {
    let registry = fixtures::registry();
    registry.register_explicit(
        TypeTag::of::<Number>(),
        TypeTag::of::<String>(),
        fixtures::format_number(),
    );
    registry.register_explicit(
        TypeTag::of::<Measurable>(),
        TypeTag::of::<Number>(),
        fixtures::length(),
    );

    let formatted = registry
        .adapt(Value::new(0..1337_i64), TypeTag::of::<String>())
        .expect("range -> length -> formatted");
    assert_eq!(formatted, Value::new("1,337".to_string()));
}

#[test]
fn chains_are_found_across_several_registrations() {
    let registry = fixtures::registry();
    registry.register_explicit(
        TypeTag::of::<Number>(),
        TypeTag::of::<String>(),
        fixtures::format_number(),
    );
    registry.register_explicit(
        TypeTag::of::<Measurable>(),
        TypeTag::of::<Number>(),
        fixtures::length(),
    );
    registry.register_explicit(
        TypeTag::of::<Number>(),
        TypeTag::of::<Range<i64>>(),
        Converter::new(|value: Value| {
            let end = value
                .downcast::<i64>()
                .map_err(|value| input_mismatch(value.tag(), TypeTag::of::<i64>()))?;
            Ok(Value::new(0..end))
        }),
    );
    registry.register(|range: Range<i64>| range.collect::<Vec<i64>>());

    assert_eq!(
        registry
            .adapt_into::<Vec<i64>>("hello".to_string())
            .expect("string -> length -> range -> list"),
        vec![0, 1, 2, 3, 4]
    );
}

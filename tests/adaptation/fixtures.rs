use std::ops::Range;

use conformance::{
    adaptation::{AdaptationRegistry, Adapts, Converter, error::input_mismatch},
    types::{TypeTag, Value, as_integer},
};

pub struct Number;

pub struct Measurable;

pub struct IoBase;

#[derive(Debug, Clone, PartialEq)]
pub struct ReadableStream(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct StringReader {
    buffer: String,
}

impl StringReader {
    pub fn read(&self) -> &str {
        &self.buffer
    }
}

impl Adapts for StringReader {
    type Adapted = String;

    fn adapt_from(initial: String) -> Self {
        Self { buffer: initial }
    }
}

pub fn group_thousands(number: i128) -> String {
    let digits = number.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if number < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_number() -> Converter {
    Converter::new(|value: Value| match as_integer(value.as_dynamic()) {
        Some(number) => Ok(Value::new(group_thousands(number))),
        None => Err(input_mismatch(value.tag(), TypeTag::of::<Number>())),
    })
}

pub fn length() -> Converter {
    Converter::new(|value: Value| {
        let length = if let Some(text) = value.downcast_ref::<String>() {
            text.chars().count()
        } else if let Some(range) = value.downcast_ref::<Range<i64>>() {
            range.clone().count()
        } else if let Some(items) = value.downcast_ref::<Vec<i64>>() {
            items.len()
        } else {
            return Err(input_mismatch(value.tag(), TypeTag::of::<Measurable>()));
        };
        Ok(Value::new(length as i64))
    })
}

/// Integers are numbers; strings, ranges and vectors have a length; the
/// string reader is an I/O object.
pub fn registry() -> AdaptationRegistry {
    let registry = AdaptationRegistry::new();
    registry.declare_subtype::<i64, Number>();
    registry.declare_subtype::<u64, Number>();
    registry.declare_subtype::<String, Measurable>();
    registry.declare_subtype::<Range<i64>, Measurable>();
    registry.declare_subtype::<Vec<i64>, Measurable>();
    registry.declare_subtype::<StringReader, IoBase>();
    registry
}

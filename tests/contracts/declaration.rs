use conformance::{
    contracts::{
        AttributeConstraint, Capability, ContractEngine, ContractErrorKind, ContractsConfig,
        DeclareOptions, Implementer, MethodSpec, Shape, Slots, Subject,
    },
    types::TypeTag,
};

use crate::people::{self, Person, flat};

macro_rules! implementer {
    ($name:ident, $shape:expr) => {
        #[derive(Debug, Clone, PartialEq)]
        struct $name {
            slots: Slots,
        }

        impl Subject for $name {
            fn slots(&self) -> &Slots {
                &self.slots
            }
        }

        impl Implementer for $name {
            fn shape() -> Shape {
                $shape
            }

            fn slots_mut(&mut self) -> &mut Slots {
                &mut self.slots
            }
        }
    };
}

implementer!(
    Nameless,
    Shape::of::<Nameless>()
        .with_attribute("first_name", ())
        .with_attribute("last_name", ())
        .with_attribute("greet", ())
);

implementer!(
    Rude,
    Shape::of::<Rude>()
        .with_attribute("first_name", ())
        .with_attribute("last_name", ())
        .with_attribute("age", ())
        .with_method("greet", &[])
);

implementer!(
    Flexible,
    Shape::of::<Flexible>()
        .with_attribute("first_name", ())
        .with_attribute("last_name", ())
        .with_attribute("age", ())
        .with_open_method("greet", &[])
);

implementer!(
    Lookalike,
    Shape::of::<Lookalike>()
        .with_attribute("first_name", ())
        .with_attribute("last_name", ())
        .with_attribute("age", ())
        .with_method("greet", &["person"])
);

implementer!(
    Wired,
    Shape::of::<Wired>()
        .with_method("first_name", &[])
        .with_attribute("last_name", ())
        .with_attribute("age", ())
        .with_method("greet", &["person"])
);

#[test]
fn declared_type_and_instances_implement_the_capability() {
    let engine = people::engine();
    let person = Person::new(&engine);

    assert!(engine.implements_type::<Person>("People"));
    assert!(engine.is_a(&person, "People"));
    assert_eq!(engine.capabilities_of(TypeTag::of::<Person>()), vec!["People"]);
}

#[test]
fn matching_members_alone_do_not_implement_a_capability() {
    let engine = people::engine();
    let lookalike = Lookalike {
        slots: Slots::new::<Lookalike>(&engine),
    };

    assert!(!engine.implements_type::<Lookalike>("People"));
    assert!(!engine.is_a(&lookalike, "People"));
    assert!(!engine.is_a(&"People".to_string(), "People"));
}

#[test]
fn missing_member_fails_declaration() {
    let engine = ContractEngine::new();
    let err = engine
        .declare::<Nameless>(&[people::people()])
        .expect_err("age is missing");

    assert_eq!(err.kind, ContractErrorKind::Validation);
    assert!(err.message.starts_with("expected attribute or method missing"));
    assert!(flat(&err.message).contains("Nameless.age must be present"));
    assert!(!engine.implements_type::<Nameless>("People"));
}

#[test]
fn attribute_where_method_expected_fails_declaration() {
    let engine = ContractEngine::new();
    let capability = Capability::new("Greeter")
        .with_method(MethodSpec::new("greet").with_param("person"))
        .shared();
    let err = engine
        .declare::<Nameless>(&[capability])
        .expect_err("greet is a plain attribute");

    assert_eq!(err.kind, ContractErrorKind::Validation);
    assert!(err.message.starts_with("attribute expected to be a method"));
}

#[test]
fn method_where_attribute_expected_fails_declaration() {
    let engine = ContractEngine::new();
    let err = engine
        .declare::<Wired>(&[people::people()])
        .expect_err("first_name is a method");

    assert_eq!(err.kind, ContractErrorKind::Validation);
    assert_eq!(err.member.as_deref(), Some("first_name"));
}

#[test]
fn missing_parameters_fail_declaration() {
    let engine = ContractEngine::new();
    let err = engine
        .declare::<Rude>(&[people::people()])
        .expect_err("greet lacks the person parameter");

    assert_eq!(err.kind, ContractErrorKind::Validation);
    assert!(err.message.starts_with("method is missing expected arguments"));
    let details = flat(&err.message);
    assert!(details.contains("Rude.greet(self) must be compatible with the signature greet(self, person)"));
    assert!(details.contains("missing the arguments person."));
}

#[test]
fn open_methods_accept_any_parameters() {
    let engine = ContractEngine::new();
    engine
        .declare::<Flexible>(&[people::people()])
        .expect("greet accepts extra arguments");
    assert!(engine.implements_type::<Flexible>("People"));
}

#[test]
fn redeclaring_is_idempotent() {
    let engine = people::engine();
    let declaration = engine
        .declare::<Person>(&[people::people(), people::people()])
        .expect("already declared");

    assert!(declaration.added.is_empty());
    assert_eq!(declaration.capabilities, vec!["People"]);
    assert_eq!(declaration.type_tag, TypeTag::of::<Person>());

    let enforcer = engine
        .enforcer(TypeTag::of::<Person>(), "greet")
        .expect("greet is enforced");
    assert_eq!(enforcer.capability_names(), vec!["People"]);
}

#[test]
fn declarations_accumulate() {
    let engine = people::engine();
    let aged = Capability::new("Aged")
        .with_attribute("age", AttributeConstraint::range(0..120))
        .shared();
    let declaration = engine
        .declare::<Person>(&[aged])
        .expect("Person has an age");

    assert_eq!(declaration.added, vec!["Aged"]);
    assert_eq!(declaration.capabilities, vec!["People", "Aged"]);
    assert!(engine.implements_type::<Person>("People"));
    assert!(engine.implements_type::<Person>("Aged"));
}

#[test]
fn failed_declaration_records_nothing() {
    let engine = ContractEngine::new();
    let named = Capability::new("Named")
        .with_attribute("first_name", AttributeConstraint::instance_of::<String>())
        .shared();

    engine
        .declare::<Nameless>(&[named, people::people()])
        .expect_err("People does not validate");
    assert!(!engine.implements_type::<Nameless>("Named"));
    assert!(engine.capabilities_of(TypeTag::of::<Nameless>()).is_empty());
}

#[test]
fn validation_only_declaration_is_not_enforced() {
    let engine = ContractEngine::new();
    let declaration = engine
        .declare_with::<Person>(&[people::people()], DeclareOptions { wrap: false })
        .expect("Person validates");
    assert_eq!(declaration.added, vec!["People"]);

    let mut person = Person::new(&engine);
    person.set("age", 200_i64).expect("writes are not checked");
    assert_eq!(
        person.greet(&person).expect("calls are not checked"),
        "Hello, !"
    );
    assert!(engine.is_a(&person, "People"));

    engine
        .declare_with::<Rude>(&[people::people()], DeclareOptions { wrap: false })
        .expect_err("validation still runs");
}

#[test]
fn wrapping_redeclaration_starts_enforcing() {
    let engine = ContractEngine::new();
    engine
        .declare_with::<Person>(&[people::people()], DeclareOptions { wrap: false })
        .expect("Person validates");
    assert!(engine.enforcer(TypeTag::of::<Person>(), "greet").is_none());

    let declaration = engine
        .declare::<Person>(&[people::people()])
        .expect("already declared");
    assert!(declaration.added.is_empty());
    assert_eq!(declaration.capabilities, vec!["People"]);

    let mut person = Person::new(&engine);
    let err = person.set("age", 200_i64).expect_err("writes are now checked");
    assert_eq!(err.kind, ContractErrorKind::ConstraintViolation);
    let enforcer = engine
        .enforcer(TypeTag::of::<Person>(), "greet")
        .expect("greet is now enforced");
    assert_eq!(enforcer.capability_names(), vec!["People"]);
}

#[test]
fn disabled_enforcement_skips_every_check() {
    let engine = ContractEngine::with_config(ContractsConfig {
        enforce: false,
        ..ContractsConfig::default()
    });
    engine
        .declare::<Rude>(&[people::people()])
        .expect("validation is skipped");
    engine
        .declare::<Person>(&[people::people()])
        .expect("Person implements People");
    assert!(engine.implements_type::<Rude>("People"));

    let mut person = Person::new(&engine);
    person.set("first_name", 123_i64).expect("writes are not checked");
    assert_eq!(
        person.greet(&person).expect("calls are not checked"),
        "Hello, !"
    );
    assert!(engine.enforcer(TypeTag::of::<Person>(), "greet").is_none());
}

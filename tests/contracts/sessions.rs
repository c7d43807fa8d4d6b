use std::sync::Arc;

use conformance::{
    contracts::{Arguments, AttributeConstraint, Capability, ContractErrorKind, SessionPhase},
    types::TypeTag,
};

use crate::people::{self, Person};

#[test]
fn session_completes_once_and_rejects_a_second_resume() {
    let engine = people::engine();
    let guido = Person::named(&engine, "Guido");
    let larry = Person::named(&engine, "Larry");
    let args = Arguments::new().arg("person", &larry);

    let mut session = engine.open_session(TypeTag::of::<Person>(), "greet");
    assert!(session.is_enforced());
    assert_eq!(session.phase(), SessionPhase::Open);

    session.enter(&guido, &args).expect("arguments are valid");
    assert_eq!(session.phase(), SessionPhase::Entered);
    let result = "Hello, Larry!".to_string();
    session.exit(&guido, &args, &result).expect("result is valid");
    assert_eq!(session.phase(), SessionPhase::Completed);

    let err = session
        .exit(&guido, &args, &result)
        .expect_err("a session resumes only once");
    assert_eq!(err.kind, ContractErrorKind::Protocol);
    assert!(err.message.starts_with("enforcement session used out of order"));
}

#[test]
fn session_cannot_resume_before_entering() {
    let engine = people::engine();
    let guido = Person::named(&engine, "Guido");
    let args = Arguments::new();

    let mut session = engine.open_session(TypeTag::of::<Person>(), "greet");
    let err = session
        .exit(&guido, &args, &String::new())
        .expect_err("nothing was entered");
    assert_eq!(err.kind, ContractErrorKind::Protocol);
}

#[test]
fn aborted_session_stays_aborted() {
    let engine = people::engine();
    let guido = Person::named(&engine, "Guido");
    let args = Arguments::new().arg("person", &guido);

    let mut session = engine.open_session(TypeTag::of::<Person>(), "greet");
    session
        .enter(&guido, &args)
        .expect_err("talking to yourself");
    assert_eq!(session.phase(), SessionPhase::Aborted);

    let err = session
        .exit(&guido, &args, &String::new())
        .expect_err("an aborted session cannot resume");
    assert_eq!(err.kind, ContractErrorKind::Protocol);
}

#[test]
fn unenforced_session_still_tracks_its_phase() {
    let engine = people::engine();
    let guido = Person::named(&engine, "Guido");
    let args = Arguments::new();

    let mut session = engine.open_session(TypeTag::of::<Person>(), "wave");
    assert!(!session.is_enforced());
    session.enter(&guido, &args).expect("nothing to check");
    session.exit(&guido, &args, &()).expect("nothing to check");
    let err = session
        .enter(&guido, &args)
        .expect_err("finished sessions cannot be entered");
    assert_eq!(err.kind, ContractErrorKind::Protocol);
}

#[test]
fn enforcers_are_memoized_until_the_type_declares_again() {
    let engine = people::engine();
    let tag = TypeTag::of::<Person>();

    let first = engine.enforcer(tag, "greet").expect("greet is enforced");
    let second = engine.enforcer(tag, "greet").expect("greet is enforced");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.capability_names(), vec!["People"]);
    assert_eq!(first.method(), "greet");

    engine
        .declare::<Person>(&[Capability::new("Aged")
            .with_attribute("age", AttributeConstraint::range(0..120))
            .shared()])
        .expect("Person has an age");
    let third = engine.enforcer(tag, "greet").expect("greet is enforced");
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(engine.enforcer(tag, "age").is_none());
}

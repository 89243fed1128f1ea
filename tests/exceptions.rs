//! `throw`/`try`/`catch`/`finally` (`spec.md` §4.6, §8).
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

#[test]
fn catch_all_handles_any_exception_type() {
    const SRC: &str = r#"
    var result = 0;
    try {
        throw ValueError("bad value");
    } catch (e) {
        result = 1;
    }
    result;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(1));
}

#[test]
fn typed_catch_clause_only_matches_its_own_tag() {
    const SRC: &str = r#"
    var result = 0;
    try {
        throw TypeError("nope");
    } catch (ValueError e) {
        result = 1;
    } catch (e) {
        result = 2;
    }
    result;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(2));
}

#[test]
fn finally_overrides_a_pending_return() {
    const SRC: &str = r#"
    func f() {
        try {
            return 1;
        } finally {
            return 2;
        }
    }
    f();
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(2));
}

#[test]
fn division_by_zero_is_a_catchable_exception() {
    const SRC: &str = r#"
    var result = 0;
    try {
        var x = 10 / 0;
    } catch (ZeroDivisionError e) {
        result = 1;
    }
    result;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(1));
}

#[test]
fn vm_division_by_zero_bubbles_straight_out_since_the_vm_has_no_handler_tables() {
    let runtime = RuntimeBuilder::new().with_backend(Backend::Vm).build();
    let err = runtime.run("10 / 0;").unwrap_err();
    assert!(err.to_string().contains("ZeroDivisionError"));
}

//! Block-scoping rules (`spec.md` §4.8): `if`/`while`-body blocks
//! introduce new scopes, `for`'s init lives in the loop's own scope,
//! and inner shadowing never leaks back out.
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

#[test]
fn if_branch_shadowing_does_not_leak_out() {
    const SRC: &str = r#"
    var x = 1;
    if (true) {
        var x = 2;
    }
    x;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(1));
}

#[test]
fn for_loop_variable_is_not_visible_after_the_loop() {
    const SRC: &str = r#"
    for (var i = 0; i < 3; i = i + 1) {
    }
    var i = 99;
    i;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(99));
}

#[test]
fn assigning_to_an_outer_binding_from_an_inner_scope_is_visible_outside() {
    const SRC: &str = r#"
    var total = 0;
    if (true) {
        total = total + 5;
    }
    total;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(5));
}

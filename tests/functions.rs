//! Closures and arity checking (`spec.md` §4.5 contracts on function
//! calls), interpreter-only since the VM doesn't compile user calls.
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

#[test]
fn closure_captures_mutable_enclosing_binding() {
    const SRC: &str = r#"
    func make_counter() {
        var count = 0;
        func increment() {
            count = count + 1;
            return count;
        }
        return increment;
    }
    var counter = make_counter();
    counter();
    counter();
    counter();
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(3));
}

#[test]
fn calling_with_the_wrong_arity_is_a_runtime_error() {
    const SRC: &str = "func add(a, b) { return a + b; } add(1);";
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    let err = runtime.run(SRC).unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.to_lowercase().contains("argument") || rendered.to_lowercase().contains("arity"));
}

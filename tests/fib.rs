//! Recursive function calls, exercised on the tree-walking interpreter
//! (the bytecode compiler doesn't support user function calls yet).
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

const SRC: &str = r#"
func fib(n) {
    if (n < 2) {
        return n;
    }
    return fib(n - 1) + fib(n - 2);
}
fib(20);
"#;

#[test]
fn interp_computes_fib_20() {
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(6765));
}

#[test]
fn auto_falls_back_to_interp_for_fib() {
    let runtime = RuntimeBuilder::new().with_backend(Backend::Auto).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(6765));
}

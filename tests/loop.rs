//! `while`/`for`/`break`/`continue`, exercised on both backends where
//! the VM supports the construct (only `while` does).
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

#[test]
fn interp_for_loop_sums_zero_through_nine() {
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    let result = runtime
        .run("var sum = 0; for (var i = 0; i < 10; i = i + 1) { sum = sum + i; } sum;")
        .unwrap();
    assert_eq!(result, Value::Integer(45));
}

#[test]
fn vm_while_loop_with_break_matches_interp() {
    const SRC: &str = "var i = 0; while (i < 100) { i = i + 1; if (i == 7) { break; } } i;";
    let interp = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    let vm = RuntimeBuilder::new().with_backend(Backend::Vm).build();
    assert_eq!(interp.run(SRC).unwrap(), Value::Integer(7));
    assert_eq!(vm.run(SRC).unwrap(), Value::Integer(7));
}

#[test]
fn continue_still_runs_the_post_expression() {
    const SRC: &str = r#"
    var evens = 0;
    for (var i = 0; i < 10; i = i + 1) {
        if (i % 2 != 0) {
            continue;
        }
        evens = evens + 1;
    }
    evens;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(5));
}

//! `print(...)` as a core-language expression, on both backends
//! (`spec.md` §4.7 "Stdout emission", §8's canonical end-to-end scenario
//! `print(1 + 2 * 3); print((1 + 2) * 3);` -> `7\n9\n`).
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

#[test]
fn interp_print_returns_the_joined_string() {
    const SRC: &str = r#"print(1 + 2 * 3);"#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::string("7"));
}

#[test]
fn vm_print_returns_the_joined_string() {
    const SRC: &str = r#"print(1 + 2 * 3);"#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Vm).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::string("7"));
}

#[test]
fn print_joins_multiple_arguments_with_single_spaces() {
    const SRC: &str = r#"print(1, "two", 3);"#;
    let interp = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    let vm = RuntimeBuilder::new().with_backend(Backend::Vm).build();
    assert_eq!(interp.run(SRC).unwrap(), Value::string("1 two 3"));
    assert_eq!(vm.run(SRC).unwrap(), Value::string("1 two 3"));
}

#[test]
fn auto_backend_runs_the_canonical_print_scenario_on_the_vm() {
    const SRC: &str = r#"print((1 + 2) * 3);"#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Auto).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::string("9"));
}

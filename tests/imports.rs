//! `import "go:..."` native-module resolution and capability denial
//! (`spec.md` §4.4, §8 "capability denial surfaces as Error not Exception").
use darix::native::CapabilityPolicy;
use darix::runtime::{Backend, RunError, RuntimeBuilder};
use darix::value::Value;

#[test]
fn go_math_module_resolves_and_is_callable() {
    const SRC: &str = r#"
    import "go:math";
    math.abs(-5);
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(5));
}

#[test]
fn denied_module_surfaces_as_a_noncatchable_error() {
    const SRC: &str = r#"
    var result = "unreached";
    try {
        import "go:math";
        result = "imported";
    } catch (e) {
        result = "caught";
    }
    result;
    "#;
    let mut policy = CapabilityPolicy::default();
    policy.allow_all_native = false;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).with_policy(policy).build();
    let err = runtime.run(SRC).unwrap_err();
    assert!(matches!(err, RunError::Signal(darix::signal::Signal::Error(_))));
}

//! Array literals, indexing, and index-assignment, exercised on both
//! backends (`spec.md` §4.3 "Array", §4.6 `OpArray`/`OpIndex`/`OpSetIndex`).
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

#[test]
fn interp_array_literal_index_and_assign() {
    const SRC: &str = "var a = [1, 2, 3]; a[1] = a[1] + 10; a[1];";
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(12));
}

#[test]
fn vm_array_literal_index_and_assign_matches_interp() {
    const SRC: &str = "var a = [1, 2, 3]; a[1] = 9; a[1];";
    let interp = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    let vm = RuntimeBuilder::new().with_backend(Backend::Vm).build();
    assert_eq!(interp.run(SRC).unwrap(), Value::Integer(9));
    assert_eq!(vm.run(SRC).unwrap(), Value::Integer(9));
}

#[test]
fn value_pools_enabled_still_produces_correct_results() {
    const SRC: &str = "var a = [1, 2, 3]; var m = {\"x\": 1}; a[0] + m[\"x\"];";
    let runtime = RuntimeBuilder::new()
        .with_backend(Backend::Interp)
        .with_value_pools_enabled(true)
        .build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(2));
}

#[test]
fn out_of_bounds_index_is_a_catchable_index_error() {
    const SRC: &str = r#"
    var result = 0;
    var a = [1, 2, 3];
    try {
        var x = a[10];
    } catch (IndexError e) {
        result = 1;
    }
    result;
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(1));
}

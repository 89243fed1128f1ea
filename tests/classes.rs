//! Class declarations, constructors, and bound methods (`spec.md` §4.5,
//! §8), interpreter-only since the VM doesn't compile classes.
use darix::runtime::{Backend, RuntimeBuilder};
use darix::value::Value;

#[test]
fn constructor_runs_and_methods_see_instance_fields() {
    const SRC: &str = r#"
    class Counter {
        func __init__(self, start) {
            self.count = start;
        }
        func increment(self) {
            self.count = self.count + 1;
            return self.count;
        }
    }
    var c = Counter(10);
    c.increment();
    c.increment();
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::Integer(12));
}

#[test]
fn class_without_init_still_instantiates() {
    const SRC: &str = r#"
    class Empty {
        func describe(self) {
            return "empty";
        }
    }
    var e = Empty();
    e.describe();
    "#;
    let runtime = RuntimeBuilder::new().with_backend(Backend::Interp).build();
    assert_eq!(runtime.run(SRC).unwrap(), Value::string("empty"));
}

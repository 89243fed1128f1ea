//! Illustrative `go:math` native module (`SPEC_FULL.md` §6).
use crate::native::{NativeContext, NativeModule};
use crate::signal::Signal;
use crate::value::Value;

const MODULE_NAME: &str = "math";

fn arg_number(args: &[Value], index: usize, fn_name: &str) -> Result<f64, Signal> {
    match args.get(index) {
        Some(Value::Integer(i)) => Ok(*i as f64),
        Some(Value::Float(f)) => Ok(*f),
        Some(other) => Err(Signal::error(
            format!("{fn_name}: expected a number, got {}", other.type_name()),
            None,
        )),
        None => Err(Signal::error(format!("{fn_name}: missing argument {index}"), None)),
    }
}

pub fn module() -> NativeModule {
    NativeModule::new(MODULE_NAME)
        .register("abs", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            match args.first() {
                Some(Value::Integer(i)) => Ok(Value::Integer(i.abs())),
                Some(Value::Float(f)) => Ok(Value::Float(f.abs())),
                _ => Err(Signal::error("math.abs: expected a number", None)),
            }
        })
        .register("sqrt", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            Ok(Value::Float(arg_number(args, 0, "math.sqrt")?.sqrt()))
        })
        .register("pow", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            let base = arg_number(args, 0, "math.pow")?;
            let exp = arg_number(args, 1, "math.pow")?;
            Ok(Value::Float(base.powf(exp)))
        })
        .register("max", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            let a = arg_number(args, 0, "math.max")?;
            let b = arg_number(args, 1, "math.max")?;
            Ok(Value::Float(a.max(b)))
        })
        .register("min", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            let a = arg_number(args, 0, "math.min")?;
            let b = arg_number(args, 1, "math.min")?;
            Ok(Value::Float(a.min(b)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::CapabilityPolicy;

    #[test]
    fn abs_handles_integers_and_floats() {
        let m = module();
        let policy = CapabilityPolicy::default();
        let ctx = NativeContext::new(&policy);
        let f = &m.functions["abs"].func;
        assert_eq!(f(&[Value::Integer(-3)], &ctx).unwrap(), Value::Integer(3));
        assert_eq!(f(&[Value::Float(-2.5)], &ctx).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn module_denied_returns_error_not_exception() {
        let m = module();
        let mut policy = CapabilityPolicy::default();
        policy.allow_all_native = false;
        let ctx = NativeContext::new(&policy);
        let f = &m.functions["abs"].func;
        assert!(matches!(f(&[Value::Integer(1)], &ctx), Err(Signal::Error(_))));
    }
}

//! Illustrative `go:fs` native module (`SPEC_FULL.md` §6). Exercises the
//! `sanitize_path`/`fs_read_only` half of the capability policy the way
//! `go:math` exercises `ModuleAllowed` (`spec.md` §8 scenario 6).
use std::fs;

use crate::native::{NativeContext, NativeModule};
use crate::signal::Signal;
use crate::value::Value;

const MODULE_NAME: &str = "fs";

fn arg_path<'a>(args: &'a [Value], index: usize, fn_name: &str) -> Result<&'a str, Signal> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.as_ref()),
        Some(other) => Err(Signal::error(
            format!("{fn_name}: expected a string path, got {}", other.type_name()),
            None,
        )),
        None => Err(Signal::error(format!("{fn_name}: missing path argument"), None)),
    }
}

pub fn module() -> NativeModule {
    NativeModule::new(MODULE_NAME)
        .register("fs_exists", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            let path = arg_path(args, 0, "fs_exists")?;
            let sanitized = ctx
                .policy
                .sanitize_path(path)
                .map_err(|msg| Signal::error(msg, None))?;
            Ok(Value::Boolean(sanitized.exists()))
        })
        .register("fs_read", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            let path = arg_path(args, 0, "fs_read")?;
            let sanitized = ctx
                .policy
                .sanitize_path(path)
                .map_err(|msg| Signal::error(msg, None))?;
            match fs::read_to_string(&sanitized) {
                Ok(contents) => Ok(Value::string(contents)),
                Err(err) => Err(Signal::error(format!("fs_read: {err}"), None)),
            }
        })
        .register("fs_write", |args, ctx| {
            ctx.require_module(MODULE_NAME)?;
            ctx.policy
                .check_writable()
                .map_err(|msg| Signal::error(msg, None))?;
            let path = arg_path(args, 0, "fs_write")?;
            let sanitized = ctx
                .policy
                .sanitize_path(path)
                .map_err(|msg| Signal::error(msg, None))?;
            let contents = match args.get(1) {
                Some(Value::String(s)) => s.to_string(),
                Some(other) => other.inspect(),
                None => String::new(),
            };
            match fs::write(&sanitized, contents) {
                Ok(()) => Ok(Value::Null),
                Err(err) => Err(Signal::error(format!("fs_write: {err}"), None)),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::CapabilityPolicy;

    #[test]
    fn denied_module_short_circuits_before_touching_the_filesystem() {
        let m = module();
        let mut policy = CapabilityPolicy::default();
        policy.allow_all_native = false;
        policy.allow_go_modules.insert("fs".to_string(), false);
        let ctx = NativeContext::new(&policy);
        let f = &m.functions["fs_exists"].func;
        let result = f(&[Value::string("x")], &ctx);
        assert!(matches!(result, Err(Signal::Error(_))));
    }
}

//! The capability policy gating native-module and filesystem access
//! (`spec.md` §4.4).
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Settable once per run (`spec.md` §4.4). Builders live on
/// [`crate::runtime::RuntimeBuilder`].
#[derive(Debug, Clone)]
pub struct CapabilityPolicy {
    pub allow_all_native: bool,
    pub allow_go_modules: HashMap<String, bool>,
    pub fs_root: Option<PathBuf>,
    pub fs_read_only: bool,
    pub inject_to_global: bool,
}

impl Default for CapabilityPolicy {
    /// Permissive defaults: everything allowed, no sandbox root configured
    /// (so `sanitize_path` rejects every path until one is set).
    fn default() -> Self {
        Self {
            allow_all_native: true,
            allow_go_modules: HashMap::new(),
            fs_root: None,
            fs_read_only: false,
            inject_to_global: false,
        }
    }
}

impl CapabilityPolicy {
    /// `spec.md` §4.4 "ModuleAllowed(name) rules".
    pub fn module_allowed(&self, name: &str) -> bool {
        if self.allow_all_native {
            self.allow_go_modules.get(name).copied() != Some(false)
        } else {
            self.allow_go_modules.get(name).copied() == Some(true)
        }
    }

    /// Lexically cleans and absolutises `p`, then requires the result to
    /// equal `fs_root` or live strictly beneath it. Does not touch the
    /// filesystem (no `canonicalize`) so it works for paths that don't
    /// exist yet (e.g. a write target).
    pub fn sanitize_path(&self, p: &str) -> Result<PathBuf, String> {
        let Some(root) = &self.fs_root else {
            return Err("filesystem access is not sandboxed (no fs-root configured)".to_string());
        };
        let candidate = if Path::new(p).is_absolute() {
            PathBuf::from(p)
        } else {
            root.join(p)
        };
        let cleaned = clean_path(&candidate);
        let root = clean_path(root);

        let (cleaned_cmp, root_cmp) = if cfg!(windows) {
            (
                cleaned.to_string_lossy().to_lowercase(),
                root.to_string_lossy().to_lowercase(),
            )
        } else {
            (
                cleaned.to_string_lossy().to_string(),
                root.to_string_lossy().to_string(),
            )
        };

        if cleaned_cmp == root_cmp || cleaned_cmp.starts_with(&format!("{root_cmp}/")) {
            Ok(cleaned)
        } else {
            Err(format!("path '{p}' escapes the filesystem sandbox root"))
        }
    }

    /// Returns a policy error message if a write to `p` would be denied
    /// outright by `fs_read_only`, independent of `sanitize_path`.
    pub fn check_writable(&self) -> Result<(), String> {
        if self.fs_read_only {
            Err("filesystem sandbox is read-only".to_string())
        } else {
            Ok(())
        }
    }
}

/// Lexical `.`/`..` resolution, mirroring Go's `filepath.Clean` without
/// touching the filesystem.
fn clean_path(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in p.components() {
        match component {
            Component::ParentDir => {
                if !matches!(out.components().last(), None | Some(Component::RootDir)) {
                    out.pop();
                }
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_with_root(root: &str) -> CapabilityPolicy {
        CapabilityPolicy {
            fs_root: Some(PathBuf::from(root)),
            ..CapabilityPolicy::default()
        }
    }

    #[test]
    fn module_allowed_when_allow_all_and_not_denied() {
        let mut policy = CapabilityPolicy::default();
        policy.allow_all_native = true;
        assert!(policy.module_allowed("math"));
        policy.allow_go_modules.insert("fs".to_string(), false);
        assert!(!policy.module_allowed("fs"));
    }

    #[test]
    fn module_denied_by_default_when_allow_all_is_false() {
        let mut policy = CapabilityPolicy::default();
        policy.allow_all_native = false;
        assert!(!policy.module_allowed("math"));
        policy.allow_go_modules.insert("math".to_string(), true);
        assert!(policy.module_allowed("math"));
    }

    #[test]
    fn sanitize_path_accepts_paths_under_root() {
        let policy = policy_with_root("/sandbox");
        assert_eq!(
            policy.sanitize_path("a/b.txt").unwrap(),
            PathBuf::from("/sandbox/a/b.txt")
        );
    }

    #[test]
    fn sanitize_path_rejects_escape() {
        let policy = policy_with_root("/sandbox");
        assert!(policy.sanitize_path("../../etc/passwd").is_err());
    }
}

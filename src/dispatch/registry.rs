//! Hook registry
//!
//! An explicit mapping from hook identifier to typed callable. A missing entry is
//! not an error: the dispatcher degrades to a "not implemented yet" notice.

use crate::dispatch::context::InvocationContext;
use std::collections::HashMap;
use std::fmt;

/// What a hook returns: `None` for success, `Some(code)` for an explicit exit status
pub type HookResult = anyhow::Result<Option<i32>>;

/// A registered hook implementation
pub type HookFn = Box<dyn Fn(&InvocationContext) -> HookResult + Send + Sync>;

/// Hook implementations keyed by derived hook name
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<String, HookFn>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry where every given name succeeds without doing anything
    pub fn accepting<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(name, |_| Ok(None));
        }
        registry
    }

    /// Register (or replace) the implementation of a hook
    pub fn register<F>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(&InvocationContext) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Box::new(hook));
        self
    }

    pub fn get(&self, name: &str) -> Option<&HookFn> {
        self.hooks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.hooks.keys().collect();
        names.sort();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ctx() -> InvocationContext {
        InvocationContext {
            command_name: "simple".to_string(),
            args: BTreeMap::new(),
            options: BTreeMap::new(),
            global_options: BTreeMap::new(),
        }
    }

    #[test]
    fn test_register_and_call() {
        let mut registry = HookRegistry::new();
        registry.register("on_simple", |c| {
            assert_eq!(c.command_name, "simple");
            Ok(Some(3))
        });

        assert!(registry.contains("on_simple"));
        let hook = registry.get("on_simple").unwrap();
        assert_eq!(hook(&ctx()).unwrap(), Some(3));
    }

    #[test]
    fn test_accepting() {
        let registry = HookRegistry::accepting(["on_a", "on_b"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("on_a").unwrap()(&ctx()).unwrap(), None);
        assert!(registry.get("on_c").is_none());
    }
}

//! Environment lookups used for path expansion.
//!
//! Expansion never reads process state directly; callers hand in an
//! [`Environment`] so the same document expands identically in tests.

use std::collections::HashMap;

/// Source of environment variables and the home directory.
pub trait Environment {
    /// Value of the variable `name`, if defined.
    fn var(&self, name: &str) -> Option<String>;

    /// The user's home directory, if known.
    fn home_dir(&self) -> Option<String>;
}

/// Reads the environment of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn home_dir(&self) -> Option<String> {
        home::home_dir().map(|path| path.to_string_lossy().into_owned())
    }
}

/// Fixed set of variables, for deterministic expansion.
#[derive(Debug, Default, Clone)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
    home: Option<String>,
}

impl MapEnvironment {
    /// An environment with nothing defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Set the home directory used for `~`.
    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = Some(home.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn home_dir(&self) -> Option<String> {
        self.home.clone().or_else(|| self.vars.get("HOME").cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_environment_lookup() {
        let env = MapEnvironment::new().with_var("EDITOR", "vim");
        assert_eq!(env.var("EDITOR").as_deref(), Some("vim"));
        assert_eq!(env.var("PAGER"), None);
    }

    #[test]
    fn home_falls_back_to_variable() {
        let env = MapEnvironment::new().with_var("HOME", "/home/dev");
        assert_eq!(env.home_dir().as_deref(), Some("/home/dev"));

        let env = env.with_home("/srv/dev");
        assert_eq!(env.home_dir().as_deref(), Some("/srv/dev"));
    }
}

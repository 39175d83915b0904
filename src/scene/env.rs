//! Scoped uniform bindings.

use std::collections::BTreeMap;

use crate::gl::UniformValue;

/// A stack of uniform layers.
///
/// Lookups fall through from the innermost scope to the base layer, which
/// always exists. Popping a scope restores exactly the mapping that was
/// visible before the matching push.
#[derive(Debug, Clone)]
pub struct UniformEnv {
    layers: Vec<BTreeMap<String, UniformValue>>,
}

impl Default for UniformEnv {
    fn default() -> Self {
        Self {
            layers: vec![BTreeMap::new()],
        }
    }
}

impl UniformEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.layers.push(BTreeMap::new());
    }

    /// Returns false when only the base layer is left.
    pub fn pop_scope(&mut self) -> bool {
        if self.layers.len() > 1 {
            self.layers.pop();
            true
        } else {
            false
        }
    }

    /// Number of scopes pushed on top of the base layer.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Pops scopes until `depth` remain.
    pub fn truncate(&mut self, depth: usize) {
        self.layers.truncate(depth + 1);
    }

    /// Binds `name` in the innermost scope, shadowing outer bindings.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        if let Some(top) = self.layers.last_mut() {
            top.insert(name.into(), value.into());
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.layers.iter().rev().find_map(|layer| layer.get(name))
    }

    /// Every visible binding, innermost value per name.
    pub fn resolved(&self) -> BTreeMap<&str, &UniformValue> {
        let mut out = BTreeMap::new();
        for layer in &self.layers {
            for (name, value) in layer {
                out.insert(name.as_str(), value);
            }
        }
        out
    }

    /// Owned copy of [`resolved`](Self::resolved).
    pub fn snapshot(&self) -> BTreeMap<String, UniformValue> {
        self.resolved()
            .into_iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }
}

#![forbid(unsafe_code)]

//! Named byte values that scripts can reference as `$name`.

use crate::hex::{self, HexError};

/// Lookup of variable definitions.
///
/// The assembler and compiler resolve `$name` through this trait, and the
/// highlighter only asks whether a name is defined.
pub trait VariableResolver {
    /// Bytes bound to `name`, if any.
    fn resolve(&self, name: &str) -> Option<Vec<u8>>;

    /// Whether `name` is currently defined.
    fn is_defined(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// A resolver with no definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariables;

impl VariableResolver for NoVariables {
    fn resolve(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }

    fn is_defined(&self, _name: &str) -> bool {
        false
    }
}

/// Ordered table of variable definitions.
///
/// Names keep their first insertion position when redefined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    entries: Vec<(String, Vec<u8>)>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Bind `name` to the bytes of a hex string.
    pub fn define_hex(&mut self, name: impl Into<String>, value: &str) -> Result<(), HexError> {
        let bytes = hex::decode(value)?;
        self.define(name, bytes);
        Ok(())
    }

    /// Remove a binding, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}

impl VariableResolver for VariableTable {
    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        self.get(name).map(<[u8]>::to_vec)
    }

    fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<R: VariableResolver + ?Sized> VariableResolver for &R {
    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        (**self).resolve(name)
    }

    fn is_defined(&self, name: &str) -> bool {
        (**self).is_defined(name)
    }
}

//! The variable table.
//!
//! The simulator has no addressable memory. Named variables stand in for it,
//! kept in declaration order so each one can be shown at a synthetic address:
//! the first at 100 (`0x0064`), each later one 16 above the previous.

use serde::{Serialize, Deserialize};
use crate::binary::{MAX_VALUE, MIN_VALUE};

/// Display address of the first variable.
pub const MEMORY_START: u16 = 100;

/// Distance between consecutive variable addresses.
pub const MEMORY_STRIDE: u16 = 16;

/// Most variables a table can hold before addresses leave 16 bits.
pub const MAX_VARIABLES: usize = ((u16::MAX - MEMORY_START) / MEMORY_STRIDE) as usize + 1;

/// One row of the memory view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCell {
    /// Hex display address, e.g. `0x0064`.
    pub address: String,
    pub name: String,
    pub value: i32,
}

/// Insertion-ordered name → value table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableTable {
    entries: Vec<(String, i32)>,
}

impl VariableTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a new variable. Returns false if the name already exists or the
    /// table is full.
    ///
    /// # Panics
    /// Panics if the value is outside [-32768, 32767]; declarations are
    /// range-checked before they get here.
    pub fn declare(&mut self, name: &str, value: i32) -> bool {
        assert!(
            (MIN_VALUE..=MAX_VALUE).contains(&value),
            "Variable value {} out of range [{}, {}]",
            value, MIN_VALUE, MAX_VALUE
        );

        if self.contains(name) || self.is_full() {
            return false;
        }
        self.entries.push((name.to_string(), value));
        true
    }

    /// Value of a variable.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    /// Overwrite an existing variable. Returns false if it does not exist.
    pub fn set(&mut self, name: &str, value: i32) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => {
                entry.1 = value;
                true
            }
            None => false,
        }
    }

    /// True if the variable has been declared.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Synthetic memory address of a variable.
    pub fn address_of(&self, name: &str) -> Option<u16> {
        self.entries
            .iter()
            .position(|(n, _)| n == name)
            .and_then(Self::index_to_address)
    }

    /// Name of the variable shown at an address.
    pub fn name_at(&self, address: u16) -> Option<&str> {
        let offset = address.checked_sub(MEMORY_START)?;
        if offset % MEMORY_STRIDE != 0 {
            return None;
        }
        self.entries
            .get(usize::from(offset / MEMORY_STRIDE))
            .map(|(n, _)| n.as_str())
    }

    /// Convert a table index to its display address, if it fits in 16 bits.
    pub fn index_to_address(index: usize) -> Option<u16> {
        u16::try_from(index)
            .ok()?
            .checked_mul(MEMORY_STRIDE)?
            .checked_add(MEMORY_START)
    }

    /// True once every address is taken.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_VARIABLES
    }

    /// Iterate over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows for the memory view.
    pub fn snapshot(&self) -> Vec<VariableCell> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, (name, value))| {
                Some(VariableCell {
                    address: format!("{:#06x}", Self::index_to_address(i)?),
                    name: name.clone(),
                    value: *value,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_get() {
        let mut vars = VariableTable::new();
        assert!(vars.declare("x", 5));
        assert!(vars.declare("y", -7));

        assert_eq!(vars.get("x"), Some(5));
        assert_eq!(vars.get("y"), Some(-7));
        assert_eq!(vars.get("z"), None);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut vars = VariableTable::new();
        assert!(vars.declare("x", 5));
        assert!(!vars.declare("x", 6));
        assert_eq!(vars.get("x"), Some(5));
    }

    #[test]
    fn test_set_existing_only() {
        let mut vars = VariableTable::new();
        vars.declare("x", 5);

        assert!(vars.set("x", 6));
        assert_eq!(vars.get("x"), Some(6));
        assert!(!vars.set("missing", 1));
        assert!(!vars.contains("missing"));
    }

    #[test]
    fn test_addresses() {
        let mut vars = VariableTable::new();
        vars.declare("a", 1);
        vars.declare("b", 2);
        vars.declare("c", 3);

        assert_eq!(vars.address_of("a"), Some(100));
        assert_eq!(vars.address_of("b"), Some(116));
        assert_eq!(vars.address_of("c"), Some(132));
        assert_eq!(vars.address_of("d"), None);

        assert_eq!(vars.name_at(116), Some("b"));
        assert_eq!(vars.name_at(117), None);
        assert_eq!(vars.name_at(148), None);
        assert_eq!(vars.name_at(4), None);
    }

    #[test]
    fn test_index_to_address_stops_at_u16() {
        assert_eq!(VariableTable::index_to_address(0), Some(100));
        assert_eq!(VariableTable::index_to_address(MAX_VARIABLES - 1), Some(65524));
        assert_eq!(VariableTable::index_to_address(MAX_VARIABLES), None);
        assert_eq!(VariableTable::index_to_address(usize::MAX), None);
    }

    #[test]
    fn test_declare_refuses_when_full() {
        let mut vars = VariableTable::new();
        for i in 0..MAX_VARIABLES {
            assert!(vars.declare(&format!("v{}", i), 0));
        }
        assert_eq!(MAX_VARIABLES, 4090);
        assert!(vars.is_full());
        assert!(!vars.declare("extra", 1));
        assert!(!vars.contains("extra"));

        let last = format!("v{}", MAX_VARIABLES - 1);
        assert_eq!(vars.address_of(&last), Some(65524));
        assert_eq!(vars.name_at(65524), Some(last.as_str()));
        assert_eq!(vars.snapshot().last().map(|c| c.address.as_str()), Some("0xfff4"));
    }

    #[test]
    fn test_snapshot_hex_addresses() {
        let mut vars = VariableTable::new();
        vars.declare("first", 10);
        vars.declare("second", 20);

        let rows = vars.snapshot();
        assert_eq!(rows[0].address, "0x0064");
        assert_eq!(rows[1].address, "0x0074");
        assert_eq!(rows[1].name, "second");
        assert_eq!(rows[1].value, 20);
    }
}

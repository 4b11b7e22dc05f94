//! Binary operator precedence table
//!
//! The table is configuration: it is filled in before parsing starts and the
//! parser only ever reads it. Symbols without an entry are not binary
//! operators and end a binary expression wherever they appear.

use rustc_hash::FxHashMap;

/// Mapping from a single-character operator to its (positive) precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceTable {
    levels: FxHashMap<char, i32>,
}

impl PrecedenceTable {
    /// A table with no operators at all
    pub fn empty() -> Self {
        PrecedenceTable {
            levels: FxHashMap::default(),
        }
    }

    /// Builder-style insert. Non-positive precedences leave `op` unset.
    pub fn with(mut self, op: char, precedence: i32) -> Self {
        self.insert(op, precedence);
        self
    }

    /// Set the precedence of `op`. Non-positive precedences are ignored.
    pub fn insert(&mut self, op: char, precedence: i32) {
        if precedence > 0 {
            self.levels.insert(op, precedence);
        }
    }

    /// Precedence of `op`, if it is a configured binary operator
    pub fn get(&self, op: char) -> Option<i32> {
        self.levels.get(&op).copied()
    }

    pub fn contains(&self, op: char) -> bool {
        self.levels.contains_key(&op)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// The language's standard operators: `<` binds loosest, `*` tightest.
impl Default for PrecedenceTable {
    fn default() -> Self {
        PrecedenceTable::empty()
            .with('<', 10)
            .with('+', 20)
            .with('-', 20)
            .with('*', 40)
    }
}

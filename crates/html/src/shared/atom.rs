//! Atom table for canonicalized tag and attribute names.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque atom identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Per-conversion atom table.
///
/// Invariant: ASCII letters are stored in canonical lowercase form so that
/// `<DIV>` and `<div>` intern to the same id. Non-ASCII code points are
/// preserved as-is.
#[derive(Debug)]
pub struct AtomTable {
    id: u64,
    atoms: Vec<Box<str>>,
    map: HashMap<Box<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            atoms: Vec::new(),
            map: HashMap::new(),
        }
    }

    fn next_id(&self) -> Result<AtomId, AtomError> {
        let idx: u32 = self
            .atoms
            .len()
            .try_into()
            .map_err(|_| AtomError::OutOfIds)?;
        Ok(AtomId(idx))
    }

    /// Intern a name, applying ASCII-lowercase folding.
    pub fn intern_ascii_folded(&mut self, name: &str) -> Result<AtomId, AtomError> {
        if !name.bytes().any(|b| b.is_ascii_uppercase()) {
            if let Some(id) = self.map.get(name) {
                return Ok(*id);
            }
            return self.insert(Box::from(name));
        }
        let folded = name.to_ascii_lowercase();
        if let Some(id) = self.map.get(folded.as_str()) {
            return Ok(*id);
        }
        self.insert(folded.into_boxed_str())
    }

    /// Look a name up without interning it.
    pub fn lookup(&self, name: &str) -> Option<AtomId> {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.map.get(name.to_ascii_lowercase().as_str()).copied()
        } else {
            self.map.get(name).copied()
        }
    }

    fn insert(&mut self, name: Box<str>) -> Result<AtomId, AtomError> {
        let id = self.next_id()?;
        self.atoms.push(name.clone());
        self.map.insert(name, id);
        Ok(id)
    }

    pub fn resolve(&self, id: AtomId) -> Option<&str> {
        self.atoms.get(id.0 as usize).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Stable per-instance identifier, used to check that a tokenizer and the
    /// normalizer consuming its tokens share one table.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtomError {
    OutOfIds,
}

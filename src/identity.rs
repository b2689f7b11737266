//! Stable cross-file student identity.
//!
//! A student is keyed by an explicit id when the ledger has one, otherwise by
//! their normalized name. Rows with neither get an anonymous key scoped to
//! the file and row they came from, which can never equal a real key.

use std::{collections::HashMap, fmt};

use itertools::Itertools;
use serde::Serialize;

pub const UNNAMED: &str = "(no name)";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IdentityKey {
    Id { id: String },
    Name { name: String },
    Anonymous { source: String, row: usize },
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Id { id } => write!(f, "id:{id}"),
            IdentityKey::Name { name } => write!(f, "name:{name}"),
            IdentityKey::Anonymous { source, row } => write!(f, "anonymous:{source}#{row}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentIdentity {
    pub key: IdentityKey,
    /// First non-blank raw name seen for this key.
    pub display_name: Option<String>,
    pub id: Option<String>,
}

impl StudentIdentity {
    /// Name to show for this student: retained name, then id, then a placeholder.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or(UNNAMED)
    }
}

/// Trims, collapses whitespace runs to one space, and lowercases.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().join(" ").to_lowercase()
}

pub fn key_for(raw_name: &str, raw_id: &str, source: &str, row: usize) -> IdentityKey {
    let id = raw_id.trim();
    if !id.is_empty() {
        return IdentityKey::Id { id: id.to_string() };
    }
    let name = normalize_name(raw_name);
    if !name.is_empty() {
        return IdentityKey::Name { name };
    }
    IdentityKey::Anonymous {
        source: source.to_string(),
        row,
    }
}

/// Resolves raw (name, id) pairs across one resolution pass, retaining the
/// first non-blank display name per key.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    known: HashMap<IdentityKey, StudentIdentity>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        raw_name: &str,
        raw_id: &str,
        source: &str,
        row: usize,
    ) -> StudentIdentity {
        let key = key_for(raw_name, raw_id, source, row);
        let name = Some(raw_name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let id = Some(raw_id.trim())
            .filter(|i| !i.is_empty())
            .map(str::to_string);
        let entry = self
            .known
            .entry(key.clone())
            .or_insert_with(|| StudentIdentity {
                key,
                display_name: None,
                id: None,
            });
        if entry.display_name.is_none() {
            entry.display_name = name;
        }
        if entry.id.is_none() {
            entry.id = id;
        }
        entry.clone()
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&StudentIdentity> {
        self.known.get(key)
    }
}

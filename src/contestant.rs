//! Contestant identity
//!
//! The set of racing endpoints is fixed when the configuration is loaded.
//! Each gets a dense [`ContestantId`] in declaration order, and all
//! per-contestant data is kept in a [`ContestantMap`] indexed by that id.

use crate::config::ConfigError;
use serde::Serialize;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Index of a contestant within its [`Roster`]
///
/// Ordering follows declaration order, which is also the ranking tiebreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ContestantId(usize);

impl ContestantId {
    /// Position in the roster
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ContestantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The fixed, ordered set of contestant names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    /// Build a roster, rejecting empty sets, blank names and duplicates
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roster = Vec::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if roster.contains(&name) {
                return Err(ConfigError::DuplicateContestant(name));
            }
            roster.push(name);
        }

        if roster.is_empty() {
            return Err(ConfigError::NoContestants);
        }

        Ok(Self { names: roster })
    }

    /// Number of contestants
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: a roster has at least one contestant
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up a contestant by name
    pub fn id(&self, name: &str) -> Option<ContestantId> {
        self.names.iter().position(|n| n == name).map(ContestantId)
    }

    /// Name of a contestant
    pub fn name(&self, id: ContestantId) -> &str {
        &self.names[id.0]
    }

    /// All ids in declaration order
    pub fn ids(&self) -> impl Iterator<Item = ContestantId> + '_ {
        (0..self.names.len()).map(ContestantId)
    }

    /// A map holding `f(id)` for every contestant
    pub fn map<T>(&self, f: impl FnMut(ContestantId) -> T) -> ContestantMap<T> {
        ContestantMap {
            values: self.ids().map(f).collect(),
        }
    }
}

/// One value per contestant, indexed by [`ContestantId`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContestantMap<T> {
    values: Vec<T>,
}

impl<T> ContestantMap<T> {
    /// Iterate `(id, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ContestantId, &T)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (ContestantId(i), v))
    }

    /// Iterate `(id, value)` pairs mutably in declaration order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ContestantId, &mut T)> {
        self.values
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (ContestantId(i), v))
    }

    /// Number of entries (equal to the roster size)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a map built from an empty roster, which cannot exist
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> Index<ContestantId> for ContestantMap<T> {
    type Output = T;

    fn index(&self, id: ContestantId) -> &T {
        &self.values[id.0]
    }
}

impl<T> IndexMut<ContestantId> for ContestantMap<T> {
    fn index_mut(&mut self, id: ContestantId) -> &mut T {
        &mut self.values[id.0]
    }
}

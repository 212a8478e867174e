// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Unordered collection of unique string members.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct Set {
    members: HashSet<String>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if `item` was newly inserted.
    pub fn add(&mut self, item: String) -> bool {
        self.members.insert(item)
    }

    pub fn delete(&mut self, item: &str) -> bool {
        self.members.remove(item)
    }

    pub fn has(&self, item: &str) -> bool {
        self.members.contains(item)
    }

    pub fn items(&self) -> Vec<String> {
        self.members.iter().cloned().collect()
    }

    /// Iterates `self`'s members and keeps those present in `other`,
    /// preserving `self`'s iteration order. Callers should pass the smaller
    /// set as `self` for the intended complexity.
    pub fn intersect(&self, other: &Set) -> Vec<String> {
        self.members.iter().filter(|m| other.has(m)).cloned().collect()
    }
}

impl FromIterator<String> for Set {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Set { members: iter.into_iter().collect() }
    }
}

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

/// Relative file path to text content, as tracked in a published repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    files: BTreeMap<String, String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> Option<String> {
        self.files.insert(path.into(), content.into())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every entry of `other` over this set. Paths not present in
    /// `other` are left untouched.
    pub fn overlay(&mut self, other: &FileSet) {
        for (path, content) in other.iter() {
            self.files.insert(path.clone(), content.clone());
        }
    }

    pub fn merged(&self, other: &FileSet) -> FileSet {
        let mut merged = self.clone();
        merged.overlay(other);
        merged
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        Self {
            files: iter
                .into_iter()
                .map(|(path, content)| (path.into(), content.into()))
                .collect(),
        }
    }
}

impl IntoIterator for FileSet {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

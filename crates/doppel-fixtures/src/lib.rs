//! Fixture targets for generated doubles.
//!
//! The build script scans this crate, generates a double for each target
//! into `OUT_DIR` and mounts it as a test-only child module below. The test
//! suite only builds when every generated artifact compiles against the
//! real declarations.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

include!(concat!(env!("OUT_DIR"), "/doubles.rs"));

// =============================================================================
// Engine: trait-object embeddings
// =============================================================================

/// Store failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key refused by the store
    ReadOnly(String),
}

/// Key-value storage.
pub trait Store {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn put(&mut self, key: String, value: Vec<u8>) -> Result<(), StoreError>;
    /// Keys under `prefix`, at most `limit`, and the number of matches.
    fn scan(&self, prefix: Option<&str>, limit: usize) -> (Vec<String>, usize);
    fn tags(&self, tags: &[&str]) -> usize;
}

/// Engine metadata. `name` borrows, so a double cannot implement this trait.
pub trait Meta {
    fn name(&self) -> &str;
    fn version(&self) -> u32;
}

/// In-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: String, value: Vec<u8>) -> Result<(), StoreError> {
        if key.starts_with('/') {
            return Err(StoreError::ReadOnly(key));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    fn scan(&self, prefix: Option<&str>, limit: usize) -> (Vec<String>, usize) {
        let matches: Vec<&String> = self
            .entries
            .keys()
            .filter(|key| prefix.map_or(true, |p| key.starts_with(p)))
            .collect();
        let total = matches.len();
        (matches.into_iter().take(limit).cloned().collect(), total)
    }

    fn tags(&self, tags: &[&str]) -> usize {
        tags.iter().filter(|tag| self.entries.contains_key(**tag)).count()
    }
}

/// [`Meta`] with fixed values.
#[derive(Debug)]
pub struct FixedMeta {
    pub name: String,
    pub version: u32,
}

impl Meta for FixedMeta {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }
}

/// Storage engine built from a store and its metadata.
pub struct Engine {
    store: Box<dyn Store>,
    meta: Box<dyn Meta>,
}

impl Engine {
    pub fn new(store: Box<dyn Store>, meta: Box<dyn Meta>) -> Self {
        Self { store, meta }
    }

    pub fn get_x(&self) -> u32 {
        self.meta.version()
    }

    #[allow(non_snake_case)]
    pub fn getX(&self) -> u32 {
        self.meta.version() + 1
    }

    pub fn find(&self, prefix: Option<&str>) -> usize {
        self.store.scan(prefix, 0).1
    }

    pub fn lookup(&self, key: Cow<'_, str>) -> Option<String> {
        self.store
            .get(&key)
            .map(|value| String::from_utf8_lossy(&value).into_owned())
    }

    pub fn describe(&self) -> String {
        format!("{} v{}", self.meta.name(), self.meta.version())
    }
}

// =============================================================================
// Account: struct embedding through Deref
// =============================================================================

/// Running balance.
pub trait Balance {
    fn balance(&self) -> i64;
}

/// Posted amounts with their memos.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<(i64, String)>,
}

impl Ledger {
    pub fn post(&mut self, amount: i64, memo: &str) -> Result<usize, String> {
        if memo.is_empty() {
            return Err("memo required".to_string());
        }
        self.entries.push((amount, memo.to_string()));
        Ok(self.entries.len())
    }
}

impl Balance for Ledger {
    fn balance(&self) -> i64 {
        self.entries.iter().map(|(amount, _)| amount).sum()
    }
}

/// A ledger with an owner.
#[derive(Debug, Clone)]
pub struct Account {
    ledger: Ledger,
    owner: String,
}

impl Account {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            ledger: Ledger::default(),
            owner: owner.into(),
        }
    }

    pub fn label(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.owner)
    }
}

impl Deref for Account {
    type Target = Ledger;

    fn deref(&self) -> &Ledger {
        &self.ledger
    }
}

impl DerefMut for Account {
    fn deref_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }
}

//! Test helpers for bridge tests
//!
//! Provides an in-memory guest: `StubValue` covers every tag the translator
//! knows about plus a few it doesn't, and `StubRuntime` records every call made
//! into it so tests can assert on what did (or did not) reach the guest.

use std::path::{Path, PathBuf};

use crate::guest::{GuestRuntime, GuestValue};
use crate::types::GuestTag;

/// Guest value for tests
#[derive(Debug, Clone, PartialEq)]
pub enum StubValue {
    Symbol(String),
    False,
    True,
    Nil,
    Int(i64),
    Float(f64),
    Str(Vec<u8>),
    Array(Vec<StubValue>),
    /// Entries in insertion order
    Hash(Vec<(StubValue, StubValue)>),
    /// A hash whose `keys` accessor raises
    BrokenHash,
}

pub fn sym(name: &str) -> StubValue {
    StubValue::Symbol(name.to_string())
}

pub fn s(text: &str) -> StubValue {
    StubValue::Str(text.as_bytes().to_vec())
}

pub fn hash(entries: Vec<(StubValue, StubValue)>) -> StubValue {
    StubValue::Hash(entries)
}

impl GuestValue for StubValue {
    fn tag(&self) -> GuestTag {
        match self {
            StubValue::Symbol(_) => GuestTag::Symbol,
            StubValue::False => GuestTag::False,
            StubValue::Nil => GuestTag::Nil,
            StubValue::Int(_) => GuestTag::Fixnum,
            StubValue::Str(_) => GuestTag::String,
            StubValue::Array(_) => GuestTag::Array,
            StubValue::Hash(_) | StubValue::BrokenHash => GuestTag::Hash,
            StubValue::True | StubValue::Float(_) => GuestTag::Other,
        }
    }

    fn symbol_name(&self) -> Option<String> {
        match self {
            StubValue::Symbol(name) => Some(name.clone()),
            _ => None,
        }
    }

    fn integer(&self) -> Option<i64> {
        match self {
            StubValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn string_bytes(&self) -> Option<Vec<u8>> {
        match self {
            StubValue::Str(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }

    fn elements(&self) -> Option<Vec<Self>> {
        match self {
            StubValue::Array(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn keys(&self) -> Option<Vec<Self>> {
        match self {
            StubValue::Hash(entries) => Some(entries.iter().map(|(k, _)| k.clone()).collect()),
            _ => None,
        }
    }

    fn lookup(&self, key: &Self) -> Option<Self> {
        match self {
            StubValue::Hash(entries) => Some(
                entries
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(StubValue::Nil),
            ),
            _ => None,
        }
    }
}

/// Entry point handed out by `StubRuntime::resolve`
#[derive(Debug, Clone, PartialEq)]
pub struct StubEntryPoint {
    pub class_path: String,
    pub method: String,
    /// Counts resolutions, so rebinding is observable
    pub generation: usize,
}

type ParseFn = Box<dyn Fn(&str) -> StubValue>;

/// Instrumented guest runtime
pub struct StubRuntime {
    pub script_name: Option<String>,
    pub boots: usize,
    pub load_paths: Vec<PathBuf>,
    pub required: Vec<String>,
    pub resolutions: usize,
    pub calls: Vec<String>,
    pub shutdowns: usize,
    /// Constant paths `resolve` will accept
    pub classes: Vec<String>,
    /// When set, `require` fails with this message
    pub require_error: Option<String>,
    /// When set, `add_load_path` fails with this message
    pub load_path_error: Option<String>,
    parse: ParseFn,
}

impl StubRuntime {
    pub fn new(parse: impl Fn(&str) -> StubValue + 'static) -> Self {
        Self {
            script_name: None,
            boots: 0,
            load_paths: Vec::new(),
            required: Vec::new(),
            resolutions: 0,
            calls: Vec::new(),
            shutdowns: 0,
            classes: vec!["Parser".to_string()],
            require_error: None,
            load_path_error: None,
            parse: Box::new(parse),
        }
    }

    /// Parser that returns `{type: :program, body: <source>}` and rejects empty input
    pub fn echo() -> Self {
        Self::new(|source| {
            if source.is_empty() {
                StubValue::Nil
            } else {
                hash(vec![(sym("type"), sym("program")), (sym("body"), s(source))])
            }
        })
    }
}

impl GuestRuntime for StubRuntime {
    type Value = StubValue;
    type EntryPoint = StubEntryPoint;
    type Error = String;

    fn boot(&mut self, script_name: &str) -> Result<(), String> {
        self.boots += 1;
        self.script_name = Some(script_name.to_string());
        Ok(())
    }

    fn add_load_path(&mut self, path: &Path) -> Result<(), String> {
        if let Some(message) = &self.load_path_error {
            return Err(message.clone());
        }
        self.load_paths.insert(0, path.to_path_buf());
        Ok(())
    }

    fn require(&mut self, filepath: &str) -> Result<(), String> {
        if let Some(message) = &self.require_error {
            return Err(message.clone());
        }
        self.required.push(filepath.to_string());
        Ok(())
    }

    fn resolve(&mut self, class_path: &str, method: &str) -> Result<StubEntryPoint, String> {
        if !self.classes.iter().any(|c| c == class_path) {
            return Err(format!("uninitialized constant {}", class_path));
        }
        self.resolutions += 1;
        Ok(StubEntryPoint {
            class_path: class_path.to_string(),
            method: method.to_string(),
            generation: self.resolutions,
        })
    }

    fn call(&mut self, _entry: &StubEntryPoint, source: &str) -> Result<StubValue, String> {
        self.calls.push(source.to_string());
        Ok((self.parse)(source))
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
    }
}

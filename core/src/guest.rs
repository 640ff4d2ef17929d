//! Guest Interpreter Interface
//!
//! The embedded interpreter is an external collaborator. These traits are the
//! whole contract the bridge needs from it: a value system it can inspect and a
//! runtime it can boot, load code into, call, and shut down.
//!
//! ## Contract notes
//!
//! 1. **Accessors may run guest code**: `keys` and `lookup` are ordinary guest
//!    calls, so they can fail. Failures come back as `None`.
//! 2. **No sharing**: the bridge never holds on to values between calls except
//!    the entry point returned by `resolve`.
//! 3. **Single thread**: implementations may assume every call happens on the
//!    thread that booted the runtime.

use std::fmt;
use std::path::Path;

use crate::types::GuestTag;

/// A value produced by the guest interpreter
pub trait GuestValue: Sized {
    /// Runtime type tag
    fn tag(&self) -> GuestTag;

    /// Name text of a symbol
    fn symbol_name(&self) -> Option<String>;

    /// Value of a fixed-width integer
    fn integer(&self) -> Option<i64>;

    /// Raw bytes of a string, in the guest's own encoding
    fn string_bytes(&self) -> Option<Vec<u8>>;

    /// Elements of an ordered sequence, in index order
    fn elements(&self) -> Option<Vec<Self>>;

    /// Keys of a mapping, in the guest's iteration order
    fn keys(&self) -> Option<Vec<Self>>;

    /// Value stored under `key` in a mapping
    fn lookup(&self, key: &Self) -> Option<Self>;
}

/// The embedded interpreter
pub trait GuestRuntime {
    type Value: GuestValue;

    /// Resolved receiver plus method identifier for the parse entry point
    type EntryPoint;

    type Error: fmt::Display;

    /// Start the interpreter and initialize its module search path
    fn boot(&mut self, script_name: &str) -> Result<(), Self::Error>;

    /// Prepend a directory to the module search path
    fn add_load_path(&mut self, path: &Path) -> Result<(), Self::Error>;

    /// Load a guest module from a filepath
    fn require(&mut self, filepath: &str) -> Result<(), Self::Error>;

    /// Resolve a class by constant path and a method on it by name
    fn resolve(&mut self, class_path: &str, method: &str)
        -> Result<Self::EntryPoint, Self::Error>;

    /// Call the entry point with a single string argument
    fn call(&mut self, entry: &Self::EntryPoint, source: &str)
        -> Result<Self::Value, Self::Error>;

    /// Orderly interpreter shutdown
    fn shutdown(&mut self);
}

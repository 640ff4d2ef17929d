//! Shared types for the guest/host bridge

use std::fmt;

/// Runtime type tag of a guest value
///
/// Closed over the tags the translator knows how to map. Everything else the
/// guest can produce reports as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestTag {
    Symbol,
    False,
    Nil,
    Fixnum,
    String,
    Array,
    Hash,
    Other,
}

impl fmt::Display for GuestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuestTag::Symbol => "symbol",
            GuestTag::False => "false",
            GuestTag::Nil => "nil",
            GuestTag::Fixnum => "fixnum",
            GuestTag::String => "string",
            GuestTag::Array => "array",
            GuestTag::Hash => "hash",
            GuestTag::Other => "other",
        };
        f.write_str(name)
    }
}

/// A single argument as passed by the host caller
#[derive(Debug, Clone, PartialEq)]
pub enum HostArg {
    Str(String),
    /// Any non-string host value, carrying the host's name for its type
    Other(String),
}

impl HostArg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostArg::Str(s) => Some(s),
            HostArg::Other(_) => None,
        }
    }
}

/// Result of invoking the guest entry point
///
/// The guest signals "input rejected" by returning its absence singleton; that
/// case is split off here so translation itself never has to fail.
#[derive(Debug)]
pub enum ParseOutcome<V> {
    Parsed(V),
    Rejected,
}

/// Lifecycle state of the embedded interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Booted,
    Bound,
    TornDown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Booted => "booted",
            LifecycleState::Bound => "bound",
            LifecycleState::TornDown => "torn_down",
        };
        f.write_str(name)
    }
}

//! Embedded CRuby guest
//!
//! Boots the VM through `magnus::embed` and implements the guest traits on top
//! of plain `magnus::Value`s. Every call here must happen on the thread that
//! booted the VM.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use magnus::{embed, prelude::*, Fixnum, Id, RArray, RHash, RString, Ruby, Symbol, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::guest::{GuestRuntime, GuestValue};
use crate::types::GuestTag;

#[derive(Debug, Error)]
pub enum RubyError {
    /// An exception raised by Ruby code, carrying Ruby's own message
    #[error("{0}")]
    Exception(String),

    #[error("Ruby VM is not available on this thread")]
    Unavailable,

    /// The VM was already started by another runtime in this process
    #[error("Ruby VM is already owned by another environment in this process")]
    AlreadyBooted,
}

/// Set once the process's single Ruby VM has been started
///
/// Never reset: the VM cannot be started again after `ruby_cleanup`.
static VM_BOOTED: AtomicBool = AtomicBool::new(false);

impl From<magnus::Error> for RubyError {
    fn from(err: magnus::Error) -> Self {
        RubyError::Exception(err.to_string())
    }
}

fn ruby() -> Result<Ruby, RubyError> {
    Ruby::get().map_err(|_| RubyError::Unavailable)
}

/// Receiver and interned method name of the parse entry point
pub struct RubyEntryPoint {
    receiver: Value,
    method: Id,
}

/// The process's embedded Ruby VM
///
/// Only the first runtime in a process to boot owns the VM; any later one
/// fails to boot with `RubyError::AlreadyBooted`.
#[derive(Default)]
pub struct RubyRuntime {
    // Dropping the guard runs `ruby_cleanup`
    cleanup: Option<embed::Cleanup>,
    // Receivers registered as GC roots, one entry per distinct object
    pinned: Vec<Value>,
}

impl RubyRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `receiver` as a GC root unless it already is one
    ///
    /// Roots are permanent, so this grows by one per distinct entry point
    /// class ever bound, not per `setup` call.
    fn pin(&mut self, receiver: Value) {
        if self.pinned.iter().any(|known| known.equal(receiver).unwrap_or(false)) {
            return;
        }
        magnus::gc::register_mark_object(receiver);
        self.pinned.push(receiver);
    }
}

impl GuestRuntime for RubyRuntime {
    type Value = Value;
    type EntryPoint = RubyEntryPoint;
    type Error = RubyError;

    fn boot(&mut self, script_name: &str) -> Result<(), RubyError> {
        if self.cleanup.is_some() {
            return Ok(());
        }
        if VM_BOOTED.swap(true, Ordering::SeqCst) {
            return Err(RubyError::AlreadyBooted);
        }

        // SAFETY: the host loads this module on its main thread, and the guard
        // is held until the host's environment cleanup hook drops it.
        let cleanup = unsafe { embed::init() };
        embed::ruby_script(script_name);
        self.cleanup = Some(cleanup);

        debug!(script_name, "ruby vm initialized");
        Ok(())
    }

    fn add_load_path(&mut self, path: &Path) -> Result<(), RubyError> {
        let ruby = ruby()?;
        let load_path: RArray = ruby.eval("$LOAD_PATH")?;
        load_path.unshift(ruby.str_new(&path.to_string_lossy()))?;
        Ok(())
    }

    fn require(&mut self, filepath: &str) -> Result<(), RubyError> {
        let ruby = ruby()?;
        ruby.require(filepath)?;
        Ok(())
    }

    fn resolve(&mut self, class_path: &str, method: &str) -> Result<RubyEntryPoint, RubyError> {
        let ruby = ruby()?;

        let receiver = class_path
            .split("::")
            .try_fold(ruby.class_object().as_value(), |scope, name| {
                scope.funcall::<_, _, Value>("const_get", (name,))
            })?;

        // Keep the receiver alive even if the constant is later reassigned
        self.pin(receiver);

        Ok(RubyEntryPoint {
            receiver,
            method: ruby.intern(method),
        })
    }

    fn call(&mut self, entry: &RubyEntryPoint, source: &str) -> Result<Value, RubyError> {
        let ruby = ruby()?;
        let value = entry
            .receiver
            .funcall::<_, _, Value>(entry.method, (ruby.str_new(source),))?;
        Ok(value)
    }

    fn shutdown(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            self.pinned.clear();
            drop(cleanup);
        }
    }
}

impl GuestValue for Value {
    fn tag(&self) -> GuestTag {
        let value = *self;

        if value.is_nil() {
            GuestTag::Nil
        } else if !value.to_bool() {
            GuestTag::False
        } else if Symbol::from_value(value).is_some() {
            GuestTag::Symbol
        } else if Fixnum::from_value(value).is_some() {
            GuestTag::Fixnum
        } else if RString::from_value(value).is_some() {
            GuestTag::String
        } else if RArray::from_value(value).is_some() {
            GuestTag::Array
        } else if RHash::from_value(value).is_some() {
            GuestTag::Hash
        } else {
            GuestTag::Other
        }
    }

    fn symbol_name(&self) -> Option<String> {
        let symbol = Symbol::from_value(*self)?;
        match symbol.name() {
            Ok(name) => Some(name.into_owned()),
            Err(err) => {
                warn!(error = %err, "could not read symbol name");
                None
            }
        }
    }

    fn integer(&self) -> Option<i64> {
        Fixnum::from_value(*self).map(|n| n.to_i64())
    }

    fn string_bytes(&self) -> Option<Vec<u8>> {
        let string = RString::from_value(*self)?;
        // SAFETY: the slice is copied before any Ruby code can run
        Some(unsafe { string.as_slice() }.to_vec())
    }

    fn elements(&self) -> Option<Vec<Self>> {
        let array = RArray::from_value(*self)?;
        array
            .to_vec::<Value>()
            .map_err(|err| warn!(error = %err, "could not read array elements"))
            .ok()
    }

    fn keys(&self) -> Option<Vec<Self>> {
        RHash::from_value(*self)?;
        self.funcall::<_, _, RArray>("keys", ())
            .and_then(|keys| keys.to_vec::<Value>())
            .map_err(|err| warn!(error = %err, "hash keys call raised"))
            .ok()
    }

    fn lookup(&self, key: &Self) -> Option<Self> {
        let hash = RHash::from_value(*self)?;
        hash.aref::<_, Value>(*key)
            .map_err(|err| warn!(error = %err, "hash lookup raised"))
            .ok()
    }
}

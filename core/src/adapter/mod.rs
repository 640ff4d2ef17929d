//! Host Adapter Interface
//!
//! The call surface the host binding exposes. Host-specific FFI layers should
//! only call into this module.
//!
//! ## Design Principles
//!
//! 1. **Validate first**: argument count and types are checked before anything
//!    reaches the guest runtime
//! 2. **One error signal**: the guest's absence result becomes `InvalidInput`;
//!    guest failures pass through untouched
//! 3. **Explicit state**: the interpreter handle lives in the `Bridge` the host
//!    owns, not in process globals

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::guest::GuestRuntime;
use crate::lifecycle::Interpreter;
use crate::translate::translate;
use crate::types::{HostArg, LifecycleState, ParseOutcome};


/// Call surface over one embedded interpreter
pub struct Bridge<R: GuestRuntime> {
    interpreter: Interpreter<R>,
}

impl<R: GuestRuntime> Bridge<R> {
    /// Create a bridge and boot its runtime
    ///
    /// This is the only way to build a bridge: the runtime is always booted
    /// before `setup` can run.
    pub fn boot(runtime: R, config: BridgeConfig) -> Result<Self> {
        let mut interpreter = Interpreter::new(runtime, config);
        if let Err(err) = interpreter.boot() {
            // A half-booted runtime must not outlive the failed bridge
            interpreter.teardown();
            return Err(err);
        }
        Ok(Self { interpreter })
    }

    pub fn state(&self) -> LifecycleState {
        self.interpreter.state()
    }

    pub fn interpreter(&self) -> &Interpreter<R> {
        &self.interpreter
    }

    /// `setup(filepath)`: load a guest module and bind the parse entry point
    pub fn setup(&mut self, args: &[HostArg]) -> Result<()> {
        let filepath = single_string(args, "Filepath")?;
        self.interpreter.bind(filepath)
    }

    /// `parse(source)`: run the guest parser and translate its result
    pub fn parse(&mut self, args: &[HostArg]) -> Result<JsonValue> {
        let source = single_string(args, "Code")?;

        match self.interpreter.call(source)? {
            ParseOutcome::Parsed(root) => Ok(translate(&root)),
            ParseOutcome::Rejected => {
                warn!("guest parser rejected input");
                Err(BridgeError::InvalidInput)
            }
        }
    }

    /// Host cleanup hook; safe to call more than once
    pub fn teardown(&mut self) {
        if !self.interpreter.teardown() {
            debug!("teardown had nothing to shut down");
        }
    }
}

/// Check for exactly one string argument
fn single_string<'a>(args: &'a [HostArg], what: &'static str) -> Result<&'a str> {
    if args.len() != 1 {
        return Err(BridgeError::WrongArgumentCount {
            expected: 1,
            actual: args.len(),
        });
    }

    args[0].as_str().ok_or(BridgeError::NotAString { what })
}

//! Interpreter lifecycle
//!
//! Owns the embedded runtime and the resolved entry point. The state only moves
//! forward: `Uninitialized -> Booted -> Bound -> TornDown`. Rebinding while
//! `Bound` is allowed and replaces the entry point. Nothing leaves `TornDown`.

use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::guest::{GuestRuntime, GuestValue};
use crate::types::{GuestTag, LifecycleState, ParseOutcome};

/// Handle to the one embedded interpreter in this process
pub struct Interpreter<R: GuestRuntime> {
    runtime: R,
    config: BridgeConfig,
    state: LifecycleState,
    entry_point: Option<R::EntryPoint>,
}

impl<R: GuestRuntime> Interpreter<R> {
    /// Wrap a runtime without starting it
    pub fn new(runtime: R, config: BridgeConfig) -> Self {
        Self {
            runtime,
            config,
            state: LifecycleState::Uninitialized,
            entry_point: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Start the runtime and set up its search path
    ///
    /// Booting an already booted interpreter is a no-op.
    pub fn boot(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::Uninitialized => {}
            LifecycleState::Booted | LifecycleState::Bound => return Ok(()),
            LifecycleState::TornDown => return Err(BridgeError::TornDown),
        }

        self.runtime
            .boot(&self.config.script_name)
            .map_err(BridgeError::guest)?;

        // The VM is up from here on, so teardown must shut it down even if
        // the search path setup below fails
        self.state = LifecycleState::Booted;
        info!(script = %self.config.script_name, "guest runtime booted");

        // Prepending in reverse keeps the configured order at the front
        for path in self.config.load_paths.iter().rev() {
            self.runtime
                .add_load_path(path)
                .map_err(BridgeError::guest)?;
        }

        Ok(())
    }

    /// Load the guest module at `filepath` and resolve the parse entry point
    ///
    /// The runtime must already be booted; binding never boots it.
    pub fn bind(&mut self, filepath: &str) -> Result<()> {
        match self.state {
            LifecycleState::Booted | LifecycleState::Bound => {}
            LifecycleState::Uninitialized => return Err(BridgeError::NotBooted),
            LifecycleState::TornDown => return Err(BridgeError::TornDown),
        }

        self.runtime.require(filepath).map_err(BridgeError::guest)?;

        let entry_point = self
            .runtime
            .resolve(&self.config.class_name, &self.config.method_name)
            .map_err(BridgeError::guest)?;

        let rebound = self.entry_point.replace(entry_point).is_some();
        self.state = LifecycleState::Bound;

        info!(
            filepath,
            class = %self.config.class_name,
            method = %self.config.method_name,
            rebound,
            "entry point bound"
        );
        Ok(())
    }

    /// Call the bound entry point with `source`
    ///
    /// A guest absence result comes back as `ParseOutcome::Rejected`.
    pub fn call(&mut self, source: &str) -> Result<ParseOutcome<R::Value>> {
        let entry_point = match self.state {
            LifecycleState::TornDown => return Err(BridgeError::TornDown),
            _ => self.entry_point.as_ref().ok_or(BridgeError::NotBound)?,
        };

        let value = self
            .runtime
            .call(entry_point, source)
            .map_err(BridgeError::guest)?;

        if value.tag() == GuestTag::Nil {
            debug!(len = source.len(), "guest rejected input");
            return Ok(ParseOutcome::Rejected);
        }

        Ok(ParseOutcome::Parsed(value))
    }

    /// Shut the runtime down
    ///
    /// Returns whether this call performed the shutdown. Only the first call on
    /// a booted interpreter does.
    pub fn teardown(&mut self) -> bool {
        let was = self.state;
        self.state = LifecycleState::TornDown;
        self.entry_point = None;

        match was {
            LifecycleState::TornDown => {
                debug!("teardown already ran");
                false
            }
            LifecycleState::Uninitialized => false,
            LifecycleState::Booted | LifecycleState::Bound => {
                self.runtime.shutdown();
                info!("guest runtime shut down");
                true
            }
        }
    }
}

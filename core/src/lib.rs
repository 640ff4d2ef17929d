pub mod adapter;
pub mod config;
pub mod error;
pub mod guest;
pub mod lifecycle;
pub mod translate;
pub mod types;

#[cfg(feature = "ruby")]
pub mod ruby;

#[cfg(test)]
pub mod test_helpers;

// Re-export main types
pub use types::*;

pub use adapter::Bridge;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use guest::{GuestRuntime, GuestValue};
pub use lifecycle::Interpreter;
pub use translate::translate;

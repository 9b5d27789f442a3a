//! Transport implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "relay")]
pub mod relay;

#[cfg(feature = "console")]
pub use console::ConsoleTransport;
#[cfg(feature = "relay")]
pub use relay::RelayTransport;

pub use crate::core::Transport;

//! Control core of a multi-channel relay and push-button controller.
//!
//! Everything in this crate is hardware-independent: pins are reached through
//! the `embedded-hal` digital traits, persisted relay state through the
//! [`StateStore`] trait, and time is injected as a millisecond counter on
//! every call that needs it. The firmware crate owns the actual GPIOs, the
//! flash-backed store and the tick task; this crate owns the semantics.
#![no_std]

pub mod button;
pub mod clock;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod debounce;
pub mod relay;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use button::{ButtonAction, ButtonEvent, ButtonRecognizer};
pub use config::{
    ButtonConfig, ButtonKind, ConfigError, EventTiming, RelayConfig, RelayOptions, SensorId,
};
pub use controller::{Controller, ControllerBuilder, Report, Reports, UnknownRelay};
pub use coordinator::RelayCoordinator;
pub use debounce::DebouncedInput;
pub use relay::Relay;
pub use store::{StateStore, RELAY_STATE_BASE};

/// Capacity of the per-controller button table.
pub const MAX_BUTTONS: usize = 16;
/// Capacity of the per-controller relay table.
pub const MAX_RELAYS: usize = 16;

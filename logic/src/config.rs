//! Immutable configuration records for buttons and relays.
//!
//! The tables are written once (typically as `static` data in the firmware)
//! and resolved into indexed runtime state by the controller builder, which
//! validates every cross-reference and fails fast with a [`ConfigError`].

/// Stable external identifier reported over telemetry.
pub type SensorId = u8;

/// Wiring semantics of a physical input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonKind {
    /// Momentary push-button that returns to its rest level on release.
    MonoStable,
    /// Latching wall switch; every actuation is a single edge.
    BiStable,
    /// Momentary contact whose relay mirrors the instantaneous pin level.
    DingDong,
    /// Magnetic contact; the relay mirrors the inverted pin level.
    ReedSwitch,
}

/// Relay behavior flags, kept as a bitmask so configuration tables read the
/// same way they do on the wire and in persisted form.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelayOptions(u8);

impl RelayOptions {
    pub const NONE: Self = Self(0);
    /// Logical "on" drives the pin high (low otherwise).
    pub const TRIGGER_HIGH: Self = Self(1 << 0);
    /// Start on after power-up, regardless of persisted state.
    pub const STARTUP_ON: Self = Self(1 << 1);
    /// Start off after power-up, regardless of persisted state.
    pub const STARTUP_OFF: Self = Self(1 << 2);
    /// Auto-off a fixed interval after turning on.
    pub const IMPULSE: Self = Self(1 << 3);
    /// Never turned off by the dependency teardown pass.
    pub const INDEPENDENT: Self = Self(1 << 4);

    pub(crate) const STARTUP_MASK: Self = Self(Self::STARTUP_ON.0 | Self::STARTUP_OFF.0);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl core::ops::BitOr for RelayOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// One relay, as written in the configuration table.
#[derive(Clone, Copy, Debug)]
pub struct RelayConfig {
    pub sensor_id: SensorId,
    pub description: &'static str,
    pub options: RelayOptions,
    /// Master relay that must be on for this one to be on. `None` (or the
    /// relay's own id) means no master.
    pub depends_on: Option<SensorId>,
}

/// One button, as written in the configuration table.
#[derive(Clone, Copy, Debug)]
pub struct ButtonConfig {
    pub sensor_id: SensorId,
    pub kind: ButtonKind,
    /// Logical pin level interpreted as "pressed".
    pub pressed_level: bool,
    pub description: &'static str,
    /// Whether this button publishes its actions over telemetry.
    pub exposed: bool,
    pub click_target: Option<SensorId>,
    pub long_click_target: Option<SensorId>,
    pub double_click_target: Option<SensorId>,
}

/// Event recognition tunables, set once at controller build time and shared
/// by every button.
#[derive(Clone, Copy, Debug)]
pub struct EventTiming {
    /// Window for a second actuation to count as a double click.
    pub double_click_ms: u32,
    /// Hold time after which a press becomes a long press.
    pub long_click_ms: u32,
    /// Raw pin level that, while a monostable press is active, selects the
    /// immediate click-with-press emission path.
    pub mono_stable_trigger: bool,
}

impl EventTiming {
    pub const fn new() -> Self {
        Self {
            double_click_ms: 350,
            long_click_ms: 800,
            mono_stable_trigger: false,
        }
    }
}

impl Default for EventTiming {
    fn default() -> Self {
        Self::new()
    }
}

/// Interval after which an impulse relay turns itself off.
pub const DEFAULT_IMPULSE_MS: u32 = 250;

/// Configuration faults detected while resolving the tables.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A button routes an action to a sensor id no relay carries.
    UnknownRelayTarget { button: SensorId, target: SensorId },
    /// A relay names a master sensor id no relay carries.
    UnknownMaster { relay: SensorId, master: SensorId },
    /// Following `depends_on` from this relay never terminates.
    DependencyCycle { relay: SensorId },
    /// Two relays share a sensor id, making routing ambiguous.
    DuplicateRelayId { sensor_id: SensorId },
    TooManyButtons,
    TooManyRelays,
}

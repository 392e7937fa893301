//! Board wiring: the immutable button and relay tables.
//!
//! Table order matters: entry `i` of [`RELAYS`] / [`BUTTONS`] is bound to
//! the matching GPIO in `main`. Relay boards here are active-high; wall
//! buttons close to ground against the internal pull-up, so their pressed
//! level is low.

use multirelay_logic::{ButtonConfig, ButtonKind, RelayConfig, RelayOptions};

/// Controller cycle period.
pub const TICK_PERIOD_MS: u64 = 10;

/// Baud rate of the UART command link.
pub const COMMAND_BAUD: u32 = 115_200;

/// Zero any persisted "on" states on this boot and start everything off.
pub const RESET_PERSISTED_STATE: bool = false;

pub static RELAYS: [RelayConfig; 6] = [
    RelayConfig {
        sensor_id: 10,
        description: "living room light",
        options: RelayOptions::TRIGGER_HIGH,
        depends_on: None,
    },
    RelayConfig {
        sensor_id: 11,
        description: "kitchen light",
        options: RelayOptions::TRIGGER_HIGH,
        depends_on: None,
    },
    RelayConfig {
        sensor_id: 12,
        description: "gate opener",
        options: RelayOptions::TRIGGER_HIGH.union(RelayOptions::IMPULSE),
        depends_on: None,
    },
    RelayConfig {
        sensor_id: 13,
        description: "bathroom fan",
        options: RelayOptions::TRIGGER_HIGH,
        depends_on: Some(14),
    },
    RelayConfig {
        sensor_id: 14,
        description: "bathroom light",
        options: RelayOptions::TRIGGER_HIGH,
        depends_on: None,
    },
    RelayConfig {
        sensor_id: 15,
        description: "door chime",
        options: RelayOptions::TRIGGER_HIGH.union(RelayOptions::STARTUP_OFF),
        depends_on: None,
    },
];

pub static BUTTONS: [ButtonConfig; 6] = [
    ButtonConfig {
        sensor_id: 100,
        kind: ButtonKind::MonoStable,
        pressed_level: false,
        description: "living room switch",
        exposed: true,
        click_target: Some(10),
        long_click_target: None,
        double_click_target: Some(11),
    },
    ButtonConfig {
        sensor_id: 101,
        kind: ButtonKind::MonoStable,
        pressed_level: false,
        description: "kitchen switch",
        exposed: false,
        click_target: Some(11),
        long_click_target: None,
        double_click_target: None,
    },
    ButtonConfig {
        sensor_id: 102,
        kind: ButtonKind::MonoStable,
        pressed_level: false,
        description: "bathroom switch",
        exposed: false,
        click_target: Some(14),
        long_click_target: Some(13),
        double_click_target: None,
    },
    ButtonConfig {
        sensor_id: 103,
        kind: ButtonKind::BiStable,
        pressed_level: false,
        description: "gate switch",
        exposed: false,
        click_target: Some(12),
        long_click_target: None,
        double_click_target: None,
    },
    ButtonConfig {
        sensor_id: 104,
        kind: ButtonKind::DingDong,
        pressed_level: false,
        description: "doorbell",
        exposed: true,
        click_target: Some(15),
        long_click_target: None,
        double_click_target: None,
    },
    ButtonConfig {
        sensor_id: 105,
        kind: ButtonKind::ReedSwitch,
        pressed_level: false,
        description: "front door sensor",
        exposed: true,
        click_target: None,
        long_click_target: None,
        double_click_target: None,
    },
];

//! The per-tick control pipeline tying buttons to relays.

use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::button::{ButtonAction, ButtonRecognizer};
use crate::clock::Millis;
use crate::config::{ButtonConfig, ConfigError, EventTiming, RelayConfig, SensorId};
use crate::coordinator::RelayCoordinator;
use crate::debounce::DebouncedInput;
use crate::store::StateStore;
use crate::{MAX_BUTTONS, MAX_RELAYS};

/// Outbound notification produced by a tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    /// An exposed button produced an action.
    ButtonAction {
        sensor_id: SensorId,
        action: ButtonAction,
    },
    /// A relay's logical state transitioned, whatever caused it.
    RelayState { sensor_id: SensorId, on: bool },
}

const REPORTS_CAP: usize = MAX_BUTTONS + MAX_RELAYS;

/// Reports of one tick, worst case one per button plus one per relay.
pub type Reports = Vec<Report, REPORTS_CAP>;

struct ButtonSlot<P> {
    config: ButtonConfig,
    input: DebouncedInput<P>,
    recognizer: ButtonRecognizer,
    click_target: Option<usize>,
    long_click_target: Option<usize>,
    double_click_target: Option<usize>,
    /// Action of the previous tick, for change detection.
    last_action: ButtonAction,
}

impl<P> ButtonSlot<P> {
    fn target_for(&self, action: ButtonAction) -> Option<usize> {
        match action {
            ButtonAction::ShortClick => self.click_target,
            ButtonAction::DoubleClick => self.double_click_target,
            ButtonAction::LongClick => self.long_click_target,
            ButtonAction::None => None,
        }
    }
}

/// Assembles a [`Controller`] from configuration records and bound pins.
///
/// Pin objects are paired with their records here; every sensor-id
/// reference is resolved to an index (or rejected) in [`build`](Self::build).
pub struct ControllerBuilder<IN, OUT> {
    buttons: Vec<(ButtonConfig, DebouncedInput<IN>), MAX_BUTTONS>,
    relays: Vec<(RelayConfig, OUT), MAX_RELAYS>,
    timing: EventTiming,
    impulse_interval: Option<u32>,
}

impl<IN: InputPin, OUT: OutputPin> ControllerBuilder<IN, OUT> {
    pub fn new() -> Self {
        Self {
            buttons: Vec::new(),
            relays: Vec::new(),
            timing: EventTiming::new(),
            impulse_interval: None,
        }
    }

    pub fn event_timing(&mut self, timing: EventTiming) -> &mut Self {
        self.timing = timing;
        self
    }

    pub fn impulse_interval(&mut self, ms: u32) -> &mut Self {
        self.impulse_interval = Some(ms);
        self
    }

    pub fn add_button(&mut self, config: ButtonConfig, pin: IN) -> Result<(), ConfigError> {
        self.buttons
            .push((config, DebouncedInput::new(pin)))
            .map_err(|_| ConfigError::TooManyButtons)
    }

    pub fn add_relay(&mut self, config: RelayConfig, pin: OUT) -> Result<(), ConfigError> {
        self.relays
            .push((config, pin))
            .map_err(|_| ConfigError::TooManyRelays)
    }

    /// Resolve the tables, restore or reset persisted relay states and apply
    /// the power-up state of every relay.
    pub fn build<S: StateStore>(
        self,
        store: S,
        reset_persisted: bool,
    ) -> Result<Controller<IN, OUT, S>, ConfigError> {
        let mut relay_configs: Vec<RelayConfig, MAX_RELAYS> = Vec::new();
        let mut coordinator = RelayCoordinator::new(store, self.impulse_interval);
        for (config, pin) in self.relays {
            coordinator.add(config, pin)?;
            relay_configs.push(config).ok();
        }
        coordinator.finalize(&relay_configs, reset_persisted)?;

        let mut buttons: Vec<ButtonSlot<IN>, MAX_BUTTONS> = Vec::new();
        for (config, input) in self.buttons {
            let resolve = |target: Option<SensorId>| -> Result<Option<usize>, ConfigError> {
                match target {
                    None => Ok(None),
                    Some(id) => coordinator
                        .index_of(id)
                        .map(Some)
                        .ok_or(ConfigError::UnknownRelayTarget {
                            button: config.sensor_id,
                            target: id,
                        }),
                }
            };
            let click_target = resolve(config.click_target)?;
            let long_click_target = resolve(config.long_click_target)?;
            let double_click_target = resolve(config.double_click_target)?;

            let recognizer = ButtonRecognizer::new(
                config.kind,
                config.pressed_level,
                config.exposed || long_click_target.is_some(),
                config.exposed || double_click_target.is_some(),
            );
            buttons
                .push(ButtonSlot {
                    config,
                    input,
                    recognizer,
                    click_target,
                    long_click_target,
                    double_click_target,
                    last_action: ButtonAction::None,
                })
                .map_err(|_| ConfigError::TooManyButtons)?;
        }

        let reported_bits = coordinator.state_bits();
        Ok(Controller {
            buttons,
            relays: coordinator,
            timing: self.timing,
            reported_bits,
        })
    }
}

impl<IN: InputPin, OUT: OutputPin> Default for ControllerBuilder<IN, OUT> {
    fn default() -> Self {
        Self::new()
    }
}

/// The controller: advances every button, routes recognized actions to the
/// relay coordinator and drives impulse expiry and dependency teardown.
pub struct Controller<IN, OUT, S> {
    buttons: Vec<ButtonSlot<IN>, MAX_BUTTONS>,
    relays: RelayCoordinator<OUT, S>,
    timing: EventTiming,
    /// Relay states as of the last report emission, for diffing.
    reported_bits: u32,
}

impl<IN: InputPin, OUT: OutputPin, S: StateStore> Controller<IN, OUT, S> {
    /// One control cycle: sample inputs, advance recognizers, route actions,
    /// expire impulses and run the dependency teardown.
    pub fn tick(&mut self, now: Millis) -> Reports {
        let mut reports = Reports::new();
        let mut changed_any = false;

        for slot in self.buttons.iter_mut() {
            let changed = slot.input.update(now);
            let level = slot.input.read();
            let event = slot.recognizer.update(changed, level, now, &self.timing);
            let action = slot.recognizer.action_for(event);

            if action == slot.last_action {
                continue;
            }
            slot.last_action = action;
            if action == ButtonAction::None {
                continue;
            }

            if let Some(index) = slot.target_for(action) {
                let on = slot
                    .recognizer
                    .desired_relay_state(level, self.relays.relay_state(index));
                changed_any |= self.relays.change_state(index, on, now);
            }
            if slot.config.exposed {
                reports
                    .push(Report::ButtonAction {
                        sensor_id: slot.config.sensor_id,
                        action,
                    })
                    .ok();
            }
        }

        changed_any |= self.relays.process_impulses(now);

        if changed_any || self.relays.any_dependent_on() {
            self.relays.turn_off_dependent(now);
        }

        self.diff_relay_states(&mut reports);
        reports
    }

    /// Externally commanded relay state (e.g. from a gateway message).
    /// Reports, impulse tracking and dependency handling follow on the next
    /// tick. Returns `true` iff the state transitioned.
    pub fn set_relay(&mut self, sensor_id: SensorId, on: bool, now: Millis) -> Result<bool, UnknownRelay> {
        let index = self.relays.index_of(sensor_id).ok_or(UnknownRelay(sensor_id))?;
        Ok(self.relays.change_state(index, on, now))
    }

    pub fn relay_state(&self, sensor_id: SensorId) -> Option<bool> {
        self.relays.index_of(sensor_id).map(|i| self.relays.relay_state(i))
    }

    fn diff_relay_states(&mut self, reports: &mut Reports) {
        let bits = self.relays.state_bits();
        let mut diff = bits ^ self.reported_bits;
        self.reported_bits = bits;
        while diff != 0 {
            let i = diff.trailing_zeros() as usize;
            diff &= diff - 1;
            reports
                .push(Report::RelayState {
                    sensor_id: self.relays.sensor_id_at(i),
                    on: bits >> i & 1 == 1,
                })
                .ok();
        }
    }
}

/// A command referenced a sensor id no relay carries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownRelay(pub SensorId);

//! Relay coordination: routing, persistence, impulse timing and inter-relay
//! dependencies.

use defmt_or_log as log;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::clock::{self, Millis};
use crate::config::{ConfigError, RelayConfig, RelayOptions, SensorId, DEFAULT_IMPULSE_MS};
use crate::relay::Relay;
use crate::store::{StateStore, RELAY_STATE_BASE};
use crate::MAX_RELAYS;

/// One relay with its configuration resolved into flat runtime fields.
struct Slot<P> {
    relay: Relay<P>,
    options: RelayOptions,
    /// Persist the logical state; true iff neither IMPULSE nor a STARTUP
    /// flag is set.
    persist: bool,
    impulse: bool,
    /// Millisecond the running impulse turned on; 0 marks an idle slot.
    impulse_since: Millis,
    /// Resolved index of the master relay, if any.
    master: Option<usize>,
    /// Some other relay lists this one as its master (and this one is not
    /// INDEPENDENT), so the teardown pass may turn it off.
    is_dependent_target: bool,
}

/// Stateful service applying state changes to the relay set.
pub struct RelayCoordinator<P, S> {
    slots: Vec<Slot<P>, MAX_RELAYS>,
    store: S,
    impulse_interval: u32,
    /// Count of running impulses; only an idle-skip hint for the tick path.
    impulse_pending: usize,
    /// Set whenever a dependent relay turns on; guards the teardown pass.
    any_dependent_on: bool,
}

impl<P: OutputPin, S: StateStore> RelayCoordinator<P, S> {
    pub(crate) fn new(store: S, impulse_interval: Option<u32>) -> Self {
        Self {
            slots: Vec::new(),
            store,
            impulse_interval: impulse_interval.unwrap_or(DEFAULT_IMPULSE_MS),
            impulse_pending: 0,
            any_dependent_on: false,
        }
    }

    pub(crate) fn add(&mut self, config: RelayConfig, pin: P) -> Result<(), ConfigError> {
        if self.index_of(config.sensor_id).is_some() {
            return Err(ConfigError::DuplicateRelayId {
                sensor_id: config.sensor_id,
            });
        }
        let relay = Relay::new(
            config.sensor_id,
            config.description,
            pin,
            config.options.contains(RelayOptions::TRIGGER_HIGH),
        );
        self.slots
            .push(Slot {
                relay,
                options: config.options,
                persist: !config
                    .options
                    .intersects(RelayOptions::IMPULSE.union(RelayOptions::STARTUP_MASK)),
                impulse: config.options.contains(RelayOptions::IMPULSE),
                impulse_since: 0,
                master: None,
                is_dependent_target: false,
            })
            .map_err(|_| ConfigError::TooManyRelays)
    }

    /// Resolve dependencies and establish the power-up state of every relay.
    pub(crate) fn finalize(
        &mut self,
        configs: &[RelayConfig],
        reset_persisted: bool,
    ) -> Result<(), ConfigError> {
        debug_assert_eq!(configs.len(), self.slots.len());

        for (i, config) in configs.iter().enumerate() {
            let master = match config.depends_on {
                Some(id) if id != config.sensor_id => {
                    Some(self.index_of(id).ok_or(ConfigError::UnknownMaster {
                        relay: config.sensor_id,
                        master: id,
                    })?)
                }
                _ => None,
            };
            self.slots[i].master = master;
        }
        self.check_acyclic()?;

        let mut initial: Vec<bool, MAX_RELAYS> = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let mut on = slot.options.contains(RelayOptions::STARTUP_ON);
            if slot.persist {
                match self.store.read(RELAY_STATE_BASE + i) {
                    Ok(byte) => on = byte == 1,
                    Err(_) => {
                        log::warn!(
                            "relay {}: persisted state unreadable, using startup default",
                            slot.relay.sensor_id()
                        );
                    }
                }
                if reset_persisted && on {
                    self.store.write(RELAY_STATE_BASE + i, 0).ok();
                    on = false;
                }
            }
            initial.push(on).ok();
        }

        // A dependent that powers up on drags its master on with it.
        for i in 0..self.slots.len() {
            if let Some(m) = self.slots[i].master {
                if !self.slots[m].options.contains(RelayOptions::INDEPENDENT) {
                    self.slots[m].is_dependent_target = true;
                    if initial[i] {
                        self.any_dependent_on = true;
                    }
                }
                initial[m] = initial[i];
            }
        }

        // Applied directly to the relays: power-up states are not persisted
        // and never arm an impulse.
        for (slot, &on) in self.slots.iter_mut().zip(initial.iter()) {
            slot.relay.change_state(on);
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), ConfigError> {
        for start in 0..self.slots.len() {
            let mut cursor = self.slots[start].master;
            let mut hops = 0;
            while let Some(next) = cursor {
                hops += 1;
                if next == start || hops > self.slots.len() {
                    return Err(ConfigError::DependencyCycle {
                        relay: self.slots[start].relay.sensor_id(),
                    });
                }
                cursor = self.slots[next].master;
            }
        }
        Ok(())
    }

    /// Establish the logical state of relay `index`, pulling its master on
    /// first when needed. Returns `true` iff the state transitioned.
    pub fn change_state(&mut self, index: usize, on: bool, now: Millis) -> bool {
        if on {
            if let Some(master) = self.slots[index].master {
                self.change_state(master, true, now);
                self.any_dependent_on = true;
            }
        }

        let changed = self.slots[index].relay.change_state(on);

        if self.slots[index].persist && changed {
            if self.store.write(RELAY_STATE_BASE + index, on as u8).is_err() {
                log::error!(
                    "relay {}: state persist failed",
                    self.slots[index].relay.sensor_id()
                );
            }
        }

        if self.slots[index].impulse && changed {
            if on {
                // 0 marks an idle slot, so an impulse armed at tick 0 is
                // stamped 1 ms late rather than lost.
                self.slots[index].impulse_since = now.max(1);
                self.impulse_pending += 1;
            } else {
                self.slots[index].impulse_since = 0;
                self.impulse_pending -= 1;
            }
        }

        changed
    }

    /// Turn relay `index` off once its impulse interval has elapsed.
    pub fn impulse_process(&mut self, index: usize, now: Millis) -> bool {
        let slot = &self.slots[index];
        if slot.impulse
            && slot.impulse_since > 0
            && clock::deadline_passed(now, slot.impulse_since, self.impulse_interval)
        {
            return self.change_state(index, false, now);
        }
        false
    }

    /// Expire every due impulse. Returns `true` iff any relay changed.
    pub fn process_impulses(&mut self, now: Millis) -> bool {
        if self.impulse_pending == 0 {
            return false;
        }
        let mut changed = false;
        for i in 0..self.slots.len() {
            changed |= self.impulse_process(i, now);
        }
        changed
    }

    /// One teardown pass: turn off every dependent-target relay whose
    /// dependents are all off. Returns whether another pass may be needed.
    pub fn turn_off_dependent(&mut self, now: Millis) -> bool {
        if !self.any_dependent_on {
            return false;
        }
        self.any_dependent_on = false;
        for i in 0..self.slots.len() {
            if self.slots[i].is_dependent_target && self.slots[i].relay.state() {
                let held = (0..self.slots.len()).any(|m| {
                    m != i && self.slots[m].master == Some(i) && self.slots[m].relay.state()
                });
                if held {
                    self.any_dependent_on = true;
                } else {
                    self.change_state(i, false, now);
                }
            }
        }
        self.any_dependent_on
    }

    pub fn any_dependent_on(&self) -> bool {
        self.any_dependent_on
    }

    /// Linear lookup of a relay by its sensor id.
    pub fn index_of(&self, sensor_id: SensorId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.relay.sensor_id() == sensor_id)
    }

    pub fn relay_state(&self, index: usize) -> bool {
        self.slots[index].relay.state()
    }

    pub fn sensor_id_at(&self, index: usize) -> SensorId {
        self.slots[index].relay.sensor_id()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Logical states packed into a bitmask, bit `i` for relay `i`.
    pub fn state_bits(&self) -> u32 {
        self.slots
            .iter()
            .enumerate()
            .fold(0, |bits, (i, s)| bits | ((s.relay.state() as u32) << i))
    }

    #[cfg(test)]
    fn impulse_pending(&self) -> usize {
        self.impulse_pending
    }

    #[cfg(test)]
    fn impulse_since(&self, index: usize) -> Millis {
        self.slots[index].impulse_since
    }
}

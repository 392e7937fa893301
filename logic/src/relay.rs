//! A single relay output.

use embedded_hal::digital::OutputPin;

use crate::config::SensorId;

/// Relay output with a logical on/off state decoupled from the pin polarity.
pub struct Relay<P> {
    sensor_id: SensorId,
    description: &'static str,
    pin: P,
    trigger_high: bool,
    on: bool,
}

impl<P: OutputPin> Relay<P> {
    /// The output is not driven until the first [`change_state`](Self::change_state).
    pub fn new(sensor_id: SensorId, description: &'static str, pin: P, trigger_high: bool) -> Self {
        Self {
            sensor_id,
            description,
            pin,
            trigger_high,
            on: false,
        }
    }

    /// Drive the output to `on`, honoring the trigger polarity.
    ///
    /// The pin is always written; the return value is `true` iff the logical
    /// state transitioned.
    pub fn change_state(&mut self, on: bool) -> bool {
        let changed = on != self.on;
        self.on = on;
        let high = on == self.trigger_high;
        self.pin.set_state(high.into()).ok();
        changed
    }

    pub fn state(&self) -> bool {
        self.on
    }

    pub fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    pub fn description(&self) -> &'static str {
        self.description
    }
}

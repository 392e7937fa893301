//! Button event recognition.
//!
//! [`ButtonRecognizer`] turns the stream of debounced pin samples plus the
//! passage of time into discrete [`ButtonEvent`]s, and translates those into
//! the [`ButtonAction`]s the relay routing operates on. One recognizer per
//! physical button; all recognizers share one [`EventTiming`].

use crate::clock::{self, Millis};
use crate::config::{ButtonKind, EventTiming};

/// Bitfield of raw recognizer outputs for one tick.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent(u8);

impl ButtonEvent {
    pub const NONE: Self = Self(0);
    /// The button is held down this tick.
    pub const PRESSED: Self = Self(1 << 0);
    pub const CLICK: Self = Self(1 << 1);
    pub const DOUBLE_CLICK: Self = Self(1 << 2);
    pub const LONG_PRESS: Self = Self(1 << 3);
    /// The debounced pin level changed this tick.
    pub const CHANGED: Self = Self(1 << 4);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for ButtonEvent {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for ButtonEvent {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Semantic action routed to a relay and published over telemetry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    None,
    ShortClick,
    DoubleClick,
    LongClick,
}

/// Recognition progress, one timestamp per state that needs one.
///
/// `FirstRelease` and `SecondPress` keep the stamp of the *first* press:
/// the double-click window is measured from there.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Idle,
    /// A bistable switch flipped once; waiting for a second edge or timeout.
    BiFirstEdge { at: Millis },
    FirstPress { at: Millis },
    FirstRelease { pressed_at: Millis },
    SecondPress,
    /// Terminal event already emitted; swallow everything until release.
    AwaitRelease,
}

/// Per-button state machine.
pub struct ButtonRecognizer {
    kind: ButtonKind,
    pressed_level: bool,
    has_long: bool,
    has_double: bool,
    state: State,
}

impl ButtonRecognizer {
    /// `has_long` / `has_double` widen the recognition: a button that is
    /// exposed over telemetry or routes the corresponding action waits for
    /// long presses / double clicks instead of reporting the bare click
    /// immediately.
    pub fn new(kind: ButtonKind, pressed_level: bool, has_long: bool, has_double: bool) -> Self {
        Self {
            kind,
            pressed_level,
            has_long,
            has_double,
            state: State::Idle,
        }
    }

    /// Whether `level` counts as an actuated button for this wiring.
    fn is_active(&self, level: bool) -> bool {
        let reference = if self.kind == ButtonKind::ReedSwitch {
            !self.pressed_level
        } else {
            self.pressed_level
        };
        level == reference
    }

    /// Advance the state machine by one tick.
    pub fn update(
        &mut self,
        changed: bool,
        level: bool,
        now: Millis,
        timing: &EventTiming,
    ) -> ButtonEvent {
        let active = self.is_active(level);
        let mut event = ButtonEvent::NONE;

        self.state = match self.state {
            State::Idle => {
                if changed {
                    if self.kind == ButtonKind::BiStable {
                        State::BiFirstEdge { at: now }
                    } else {
                        event |= ButtonEvent::PRESSED;
                        State::FirstPress { at: now }
                    }
                } else {
                    State::Idle
                }
            }

            State::BiFirstEdge { at } => {
                if !self.has_double || clock::elapsed(now, at) > timing.double_click_ms {
                    event |= ButtonEvent::CLICK;
                    State::Idle
                } else if changed {
                    event |= ButtonEvent::DOUBLE_CLICK;
                    State::Idle
                } else {
                    State::BiFirstEdge { at }
                }
            }

            State::FirstPress { at } => {
                if !active {
                    if !self.has_double {
                        event |= ButtonEvent::CLICK;
                        State::Idle
                    } else {
                        State::FirstRelease { pressed_at: at }
                    }
                } else if !self.has_double
                    && !self.has_long
                    && level == timing.mono_stable_trigger
                {
                    // Nothing further to wait for: report the click while
                    // the button is still held.
                    event |= ButtonEvent::CLICK | ButtonEvent::PRESSED;
                    State::AwaitRelease
                } else if self.has_long && clock::elapsed(now, at) > timing.long_click_ms {
                    event |= ButtonEvent::LONG_PRESS | ButtonEvent::PRESSED;
                    State::AwaitRelease
                } else {
                    event |= ButtonEvent::PRESSED;
                    State::FirstPress { at }
                }
            }

            State::FirstRelease { pressed_at } => {
                if clock::elapsed(now, pressed_at) > timing.double_click_ms {
                    // Window expired; a second press still being debounced
                    // is reported as a plain click.
                    event |= ButtonEvent::CLICK;
                    State::Idle
                } else if active {
                    if level == timing.mono_stable_trigger {
                        event |= ButtonEvent::DOUBLE_CLICK | ButtonEvent::PRESSED;
                        State::AwaitRelease
                    } else {
                        event |= ButtonEvent::PRESSED;
                        State::SecondPress
                    }
                } else {
                    State::FirstRelease { pressed_at }
                }
            }

            State::SecondPress => {
                if !active {
                    event |= ButtonEvent::DOUBLE_CLICK;
                    State::Idle
                } else {
                    State::SecondPress
                }
            }

            State::AwaitRelease => {
                if !active {
                    State::Idle
                } else {
                    State::AwaitRelease
                }
            }
        };

        if changed {
            event |= ButtonEvent::CHANGED;
        }
        event
    }

    /// Translate a tick's raw event into the action used for routing.
    pub fn action_for(&self, event: ButtonEvent) -> ButtonAction {
        let changed = event.contains(ButtonEvent::CHANGED);
        if changed && matches!(self.kind, ButtonKind::DingDong | ButtonKind::ReedSwitch) {
            ButtonAction::ShortClick
        } else if event.contains(ButtonEvent::CLICK) {
            ButtonAction::ShortClick
        } else if event.contains(ButtonEvent::DOUBLE_CLICK) {
            ButtonAction::DoubleClick
        } else if event.contains(ButtonEvent::LONG_PRESS) {
            ButtonAction::LongClick
        } else {
            ButtonAction::None
        }
    }

    /// The relay state an action should establish, given the current pin
    /// level and the targeted relay's current state.
    pub fn desired_relay_state(&self, level: bool, relay_on: bool) -> bool {
        match self.kind {
            ButtonKind::MonoStable | ButtonKind::BiStable => !relay_on,
            ButtonKind::DingDong => level,
            ButtonKind::ReedSwitch => !level,
        }
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.state == State::Idle
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    const TIMING: EventTiming = EventTiming::new();

    /// Drive the recognizer over an edge list `(time, level)`, sampling every
    /// `step` ms, and collect the non-empty events.
    fn run(
        rec: &mut ButtonRecognizer,
        edges: &[(Millis, bool)],
        until: Millis,
        step: Millis,
    ) -> Vec<(Millis, ButtonEvent)> {
        let mut out = Vec::new();
        let mut level = !edges.first().map(|&(_, l)| l).unwrap_or(true);
        let mut next_edge = 0;
        let mut now = 0;
        while now <= until {
            let mut changed = false;
            if next_edge < edges.len() && edges[next_edge].0 <= now {
                level = edges[next_edge].1;
                changed = true;
                next_edge += 1;
            }
            let ev = rec.update(changed, level, now, &TIMING);
            if !ev.is_empty() {
                out.push((now, ev));
            }
            now += step;
        }
        out
    }

    fn events_with(out: &[(Millis, ButtonEvent)], bit: ButtonEvent) -> Vec<(Millis, ButtonEvent)> {
        out.iter().copied().filter(|(_, e)| e.contains(bit)).collect()
    }

    #[test]
    fn mono_short_click_fires_on_release() {
        // Active-high button with no long/double routing: press at 0,
        // release at 50, click reported on the release tick.
        let mut rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, false, false);
        let out = run(&mut rec, &[(0, true), (50, false)], 200, 10);

        assert_eq!(out[0].0, 0);
        assert!(out[0].1.contains(ButtonEvent::PRESSED | ButtonEvent::CHANGED));

        let clicks = events_with(&out, ButtonEvent::CLICK);
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].0, 50);
        assert!(clicks[0].1.contains(ButtonEvent::CHANGED));
        assert!(!clicks[0].1.contains(ButtonEvent::PRESSED));
        assert!(rec.is_idle());
    }

    #[test]
    fn mono_active_low_clicks_while_still_held() {
        // Pull-up wiring: pressed level is low, matching the default
        // trigger level, so the click is reported on the first held tick.
        let mut rec = ButtonRecognizer::new(ButtonKind::MonoStable, false, false, false);
        let out = run(&mut rec, &[(0, false), (100, true)], 200, 10);

        let clicks = events_with(&out, ButtonEvent::CLICK);
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].0, 10);
        assert!(clicks[0].1.contains(ButtonEvent::PRESSED));
        assert!(rec.is_idle());
    }

    #[test]
    fn mono_double_click() {
        // Press/release twice inside the window; only a double click comes out.
        let mut rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, false, true);
        let out = run(
            &mut rec,
            &[(0, true), (100, false), (200, true), (250, false)],
            700,
            10,
        );

        assert!(events_with(&out, ButtonEvent::CLICK).is_empty());
        let doubles = events_with(&out, ButtonEvent::DOUBLE_CLICK);
        assert_eq!(doubles.len(), 1);
        assert_eq!(doubles[0].0, 250);
        assert!(rec.is_idle());
    }

    #[test]
    fn mono_single_click_after_double_window_expires() {
        let mut rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, false, true);
        let out = run(&mut rec, &[(0, true), (100, false)], 700, 10);

        let clicks = events_with(&out, ButtonEvent::CLICK);
        assert_eq!(clicks.len(), 1);
        // Window runs from the press stamp, so the click lands just past 350.
        assert_eq!(clicks[0].0, 360);
        assert!(events_with(&out, ButtonEvent::DOUBLE_CLICK).is_empty());
    }

    #[test]
    fn mono_long_press() {
        let mut rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, true, false);
        let out = run(&mut rec, &[(0, true), (1000, false)], 1200, 10);

        let longs = events_with(&out, ButtonEvent::LONG_PRESS);
        assert_eq!(longs.len(), 1);
        assert_eq!(longs[0].0, 810);
        assert!(longs[0].1.contains(ButtonEvent::PRESSED));
        // Release produces no further event.
        assert!(events_with(&out, ButtonEvent::CLICK).is_empty());
        assert!(rec.is_idle());
    }

    #[test]
    fn long_press_wins_over_release_click_only_while_held() {
        // Released before the long window: reported as a plain click once
        // the double window expires (button is exposed, so both apply).
        let mut rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, true, true);
        let out = run(&mut rec, &[(0, true), (200, false)], 900, 10);

        assert!(events_with(&out, ButtonEvent::LONG_PRESS).is_empty());
        assert_eq!(events_with(&out, ButtonEvent::CLICK).len(), 1);
    }

    #[test]
    fn bistable_single_toggle_times_out_to_click() {
        let mut rec = ButtonRecognizer::new(ButtonKind::BiStable, true, false, true);
        let out = run(&mut rec, &[(0, true)], 600, 10);

        let clicks = events_with(&out, ButtonEvent::CLICK);
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].0, 360);
        assert!(rec.is_idle());
    }

    #[test]
    fn bistable_without_double_routing_clicks_on_next_tick() {
        let mut rec = ButtonRecognizer::new(ButtonKind::BiStable, true, false, false);
        let out = run(&mut rec, &[(0, true)], 100, 10);

        let clicks = events_with(&out, ButtonEvent::CLICK);
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].0, 10);
    }

    #[test]
    fn bistable_double_toggle() {
        let mut rec = ButtonRecognizer::new(ButtonKind::BiStable, true, false, true);
        let out = run(&mut rec, &[(0, true), (200, false)], 600, 10);

        assert!(events_with(&out, ButtonEvent::CLICK).is_empty());
        let doubles = events_with(&out, ButtonEvent::DOUBLE_CLICK);
        assert_eq!(doubles.len(), 1);
        assert_eq!(doubles[0].0, 200);
    }

    #[test]
    fn returns_to_idle_within_both_windows_after_input_goes_quiet() {
        // Any sequence that ends at the rest level settles back to Idle in
        // at most longclick + doubleclick.
        let mut rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, true, true);
        let _ = run(
            &mut rec,
            &[(0, true), (100, false), (200, true), (300, false)],
            300 + TIMING.long_click_ms + TIMING.double_click_ms,
            10,
        );
        assert!(rec.is_idle());
    }

    #[test]
    fn ding_dong_translates_every_edge_to_a_short_click() {
        let rec = ButtonRecognizer::new(ButtonKind::DingDong, true, false, false);
        let edge = ButtonEvent::PRESSED | ButtonEvent::CHANGED;
        assert_eq!(rec.action_for(edge), ButtonAction::ShortClick);
        assert_eq!(rec.action_for(ButtonEvent::PRESSED), ButtonAction::None);
        // Relay mirrors the pin.
        assert!(rec.desired_relay_state(true, false));
        assert!(!rec.desired_relay_state(false, true));
    }

    #[test]
    fn reed_switch_translates_edges_and_inverts_the_level() {
        let rec = ButtonRecognizer::new(ButtonKind::ReedSwitch, true, false, false);
        assert_eq!(
            rec.action_for(ButtonEvent::CHANGED),
            ButtonAction::ShortClick
        );
        // Door opened: pin dropped low, relay goes on.
        assert!(rec.desired_relay_state(false, false));
        assert!(!rec.desired_relay_state(true, false));
    }

    #[test]
    fn reed_switch_active_tracks_the_inverted_pressed_level() {
        let mut rec = ButtonRecognizer::new(ButtonKind::ReedSwitch, true, false, false);
        // Pin falls to 0 (door opens): recognizer sees an actuation.
        let ev = rec.update(true, false, 0, &TIMING);
        assert!(ev.contains(ButtonEvent::PRESSED | ButtonEvent::CHANGED));
    }

    #[test]
    fn toggle_rule_for_stable_kinds() {
        let rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, false, false);
        assert!(rec.desired_relay_state(true, false));
        assert!(!rec.desired_relay_state(true, true));
    }

    #[test]
    fn click_translation_priority() {
        let rec = ButtonRecognizer::new(ButtonKind::MonoStable, true, true, true);
        assert_eq!(
            rec.action_for(ButtonEvent::CLICK | ButtonEvent::CHANGED),
            ButtonAction::ShortClick
        );
        assert_eq!(
            rec.action_for(ButtonEvent::DOUBLE_CLICK),
            ButtonAction::DoubleClick
        );
        assert_eq!(
            rec.action_for(ButtonEvent::LONG_PRESS | ButtonEvent::PRESSED),
            ButtonAction::LongClick
        );
        assert_eq!(rec.action_for(ButtonEvent::NONE), ButtonAction::None);
    }
}

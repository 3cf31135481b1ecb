//! Debounce filters
//!
//! A debounce filter only accepts a change in a boolean signal once the new
//! value has been held continuously for a configured duration. Rising
//! (false to true) and falling (true to false) changes have independent hold
//! durations, a zero hold meaning the change is accepted immediately.
//!
//! Time is passed in explicitly as the duration since the filter's owner was
//! activated, so the filters can be driven by a simulated cycle count.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which edges of the signal a single hold duration applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum DebounceEdge {
    /// Only false to true changes are held, losing the signal is immediate.
    Rising,

    /// Only true to false changes are held, gaining the signal is immediate.
    Falling,

    /// Both changes are held.
    Both,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Configuration of a debounce filter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DebounceConfig {
    /// Time a true input must be held before a false state becomes true.
    pub rising_hold: Duration,

    /// Time a false input must be held before a true state becomes false.
    pub falling_hold: Duration,

    /// The accepted value before any input has been seen.
    pub initial: bool,
}

/// The memory of a debounce filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DebounceState {
    /// The currently accepted (output) value.
    pub last_accepted: bool,

    /// Time at which the input first differed from `last_accepted`, if it
    /// currently does.
    pub pending_since: Option<Duration>,
}

/// A debounce filter owning its own state.
#[derive(Debug, Clone)]
pub struct DebounceFilter {
    config: DebounceConfig,
    state: DebounceState,
}

/// Debounces the presence of an optional value.
///
/// While the debounced presence is true but the raw sample is missing, the
/// last value seen is returned instead. Once the debounced presence falls the
/// output is `None`.
#[derive(Debug, Clone)]
pub struct OptionalDebounce {
    presence: DebounceFilter,
    last_value: Option<f64>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance a debounce filter by one sample.
///
/// Returns the next state, whose `last_accepted` is the filter output for
/// this sample. Feeding the already accepted value returns an identical
/// state.
pub fn debounce(
    config: &DebounceConfig,
    state: DebounceState,
    input: bool,
    now: Duration,
) -> DebounceState {
    if input == state.last_accepted {
        return DebounceState {
            last_accepted: state.last_accepted,
            pending_since: None,
        };
    }

    let hold = if input {
        config.rising_hold
    } else {
        config.falling_hold
    };

    let since = state.pending_since.unwrap_or(now);

    if now.checked_sub(since).unwrap_or_default() >= hold {
        DebounceState {
            last_accepted: input,
            pending_since: None,
        }
    } else {
        DebounceState {
            last_accepted: state.last_accepted,
            pending_since: Some(since),
        }
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DebounceConfig {
    /// A filter holding only the given edge(s) for `hold`, starting from
    /// `false`.
    pub fn new(edge: DebounceEdge, hold: Duration) -> Self {
        let (rising_hold, falling_hold) = match edge {
            DebounceEdge::Rising => (hold, Duration::default()),
            DebounceEdge::Falling => (Duration::default(), hold),
            DebounceEdge::Both => (hold, hold),
        };

        Self {
            rising_hold,
            falling_hold,
            initial: false,
        }
    }

    /// A filter with independent rising and falling holds.
    pub fn dual(initial: bool, rising_hold: Duration, falling_hold: Duration) -> Self {
        Self {
            rising_hold,
            falling_hold,
            initial,
        }
    }

    /// The state of a freshly reset filter.
    pub fn initial_state(&self) -> DebounceState {
        DebounceState {
            last_accepted: self.initial,
            pending_since: None,
        }
    }
}

impl DebounceFilter {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            state: config.initial_state(),
            config,
        }
    }

    /// Feed a new sample taken at `now`, returning the debounced value.
    pub fn update(&mut self, input: bool, now: Duration) -> bool {
        let next = debounce(&self.config, self.state, input, now);

        if next.last_accepted != self.state.last_accepted {
            trace!(
                "Debounced signal changed to {} at {:.3} s",
                next.last_accepted,
                now.as_secs_f64()
            );
        }

        self.state = next;
        self.state.last_accepted
    }

    /// The currently accepted value.
    pub fn value(&self) -> bool {
        self.state.last_accepted
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Forget all history, returning to the configured initial value.
    pub fn reset(&mut self) {
        self.state = self.config.initial_state();
    }
}

impl OptionalDebounce {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            presence: DebounceFilter::new(config),
            last_value: None,
        }
    }

    /// Feed a new sample taken at `now`, returning the debounced value.
    pub fn update(&mut self, sample: Option<f64>, now: Duration) -> Option<f64> {
        let present = self.presence.update(sample.is_some(), now);

        if sample.is_some() {
            self.last_value = sample;
        }

        if present {
            self.last_value
        } else {
            self.last_value = None;
            None
        }
    }

    /// The debounced presence of the value.
    pub fn is_present(&self) -> bool {
        self.presence.value()
    }

    pub fn reset(&mut self) {
        self.presence.reset();
        self.last_value = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(20);

    fn t(cycle: u32) -> Duration {
        PERIOD * cycle
    }

    #[test]
    fn test_falling_single_blip_ignored() {
        let mut f = DebounceFilter::new(DebounceConfig::new(DebounceEdge::Falling, PERIOD * 5));

        // Rising is immediate
        assert!(f.update(true, t(0)));

        for c in 1..10 {
            assert!(f.update(true, t(c)));
        }

        // Single cycle dropout
        assert!(f.update(false, t(10)));
        assert!(f.state().pending_since.is_some());

        // Re-acquired, pending loss cancelled immediately
        assert!(f.update(true, t(11)));
        assert_eq!(f.state().pending_since, None);
    }

    #[test]
    fn test_falling_held_absence_flips() {
        let mut f = DebounceFilter::new(DebounceConfig::new(DebounceEdge::Falling, PERIOD * 5));
        f.update(true, t(0));

        // First absent sample at cycle 1, flips on the 6th absent cycle
        for c in 1..6 {
            assert!(f.update(false, t(c)), "flipped early on cycle {}", c);
        }
        assert!(!f.update(false, t(6)));
    }

    #[test]
    fn test_idempotent_once_settled() {
        let config = DebounceConfig::new(DebounceEdge::Both, PERIOD * 3);
        let mut state = config.initial_state();

        for c in 0..50 {
            let next = debounce(&config, state, false, t(c));
            assert_eq!(next, state);
            state = next;
        }
    }

    #[test]
    fn test_rising_hold() {
        let config = DebounceConfig::new(DebounceEdge::Rising, PERIOD * 2);
        let mut f = DebounceFilter::new(config);

        assert!(!f.update(true, t(0)));
        assert!(!f.update(true, t(1)));
        assert!(f.update(true, t(2)));

        // Falling is immediate for a rising-only filter
        assert!(!f.update(false, t(3)));
    }

    #[test]
    fn test_dual_holds() {
        let config = DebounceConfig::dual(false, PERIOD * 25, Duration::default());
        let mut f = DebounceFilter::new(config);

        for c in 0..25 {
            assert!(!f.update(true, t(c)));
        }
        assert!(f.update(true, t(25)));
        assert!(!f.update(false, t(26)));
    }

    #[test]
    fn test_reset() {
        let mut f = DebounceFilter::new(DebounceConfig::new(DebounceEdge::Falling, PERIOD * 5));
        f.update(true, t(0));
        f.update(false, t(1));
        f.reset();

        assert_eq!(f.state(), DebounceState::default());
    }

    #[test]
    fn test_optional_holds_last_value() {
        let mut f = OptionalDebounce::new(DebounceConfig::new(DebounceEdge::Falling, PERIOD * 5));

        assert_eq!(f.update(Some(1.5), t(0)), Some(1.5));
        assert_eq!(f.update(Some(2.0), t(1)), Some(2.0));

        // Short gap keeps the last value rather than reporting nothing
        assert_eq!(f.update(None, t(2)), Some(2.0));
        assert_eq!(f.update(None, t(3)), Some(2.0));
        assert_eq!(f.update(Some(2.5), t(4)), Some(2.5));

        // Long gap drops it
        for c in 5..10 {
            assert_eq!(f.update(None, t(c)), Some(2.5));
        }
        assert_eq!(f.update(None, t(10)), None);
        assert!(!f.is_present());
    }
}

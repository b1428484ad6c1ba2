//! # Wrapping Tick Arithmetic
//!
//! GPIO edge events carry a 32-bit microsecond counter that wraps roughly
//! every 71.6 minutes. Intervals are therefore computed modulo 2^32.

/// Elapsed ticks from `prev` to `cur` on a counter that wraps at 2^32.
///
/// ```rust
/// use homemeter_rs::util::tick::interval;
///
/// assert_eq!(interval(100, 180), 80);
/// assert_eq!(interval(u32::MAX - 9, 10), 20);
/// ```
#[inline]
pub const fn interval(prev: u32, cur: u32) -> u32 {
    cur.wrapping_sub(prev)
}

/// Remembers the previous tick and turns each new tick into an interval.
///
/// The first tick seen has no predecessor, so it yields `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickTracker {
    prev: Option<u32>,
}

impl TickTracker {
    pub const fn new() -> Self {
        Self { prev: None }
    }

    /// Record `tick` and return the interval since the previously recorded tick.
    pub fn observe(&mut self, tick: u32) -> Option<u32> {
        let diff = self.prev.map(|prev| interval(prev, tick));
        self.prev = Some(tick);
        diff
    }

    /// Forget the previous tick.
    pub fn reset(&mut self) {
        self.prev = None;
    }
}

//! Per-actor vector clocks.
//!
//! Every clock in the shop has [`CLOCK_WIDTH`] slots: [`SERVER_SLOT`] carries the server's
//! contribution and [`CLIENT_SLOT`] the client's. The server reuses one clock across every client
//! it serves, so clients only learn about each other's history through the server.
//!
//! ```rust
//! use barbershop_sim::clock::{VectorClock, CLIENT_SLOT, SERVER_SLOT};
//!
//! let mut server = VectorClock::pair();
//! let mut client = VectorClock::pair();
//! server.increment(SERVER_SLOT);
//! client.increment(CLIENT_SLOT);
//!
//! server.merge(&client);
//! client.merge(&server);
//! assert_eq!(server.as_slice(), &[1, 1]);
//! assert_eq!(client, server);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of slots in every clock used by the shop.
pub const CLOCK_WIDTH: usize = 2;
/// Slot owned by the server.
pub const SERVER_SLOT: usize = 0;
/// Slot owned by a client.
pub const CLIENT_SLOT: usize = 1;

/// A fixed-width logical clock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    slots: Vec<u64>,
}

impl VectorClock {
    /// Create a clock of `width` zeroed slots.
    pub fn new(width: usize) -> Self {
        Self {
            slots: vec![0; width],
        }
    }

    /// A zeroed server/client clock.
    pub fn pair() -> Self {
        Self::new(CLOCK_WIDTH)
    }

    /// Build a clock from explicit slot values.
    pub fn from_slots(slots: impl Into<Vec<u64>>) -> Self {
        Self {
            slots: slots.into(),
        }
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<u64> {
        self.slots.get(slot).copied()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.slots
    }

    /// Record a local event in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    pub fn increment(&mut self, slot: usize) {
        assert!(
            slot < self.slots.len(),
            "slot {slot} out of range for clock of width {}",
            self.slots.len()
        );
        self.slots[slot] += 1;
    }

    /// Component-wise maximum of `self` and `other`, stored in `self`.
    ///
    /// # Panics
    ///
    /// Panics if the clocks have different widths.
    pub fn merge(&mut self, other: &VectorClock) {
        assert_eq!(
            self.slots.len(),
            other.slots.len(),
            "cannot merge clocks of different widths"
        );
        for (dst, src) in self.slots.iter_mut().zip(&other.slots) {
            *dst = (*dst).max(*src);
        }
    }

    /// Non-mutating form of [`Self::merge`].
    pub fn merged(&self, other: &VectorClock) -> VectorClock {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// `true` if every slot of `self` is `<=` the matching slot of `other` and at least one is `<`.
    pub fn happened_before(&self, other: &VectorClock) -> bool {
        matches!(self.partial_cmp(other), Some(Ordering::Less))
    }

    /// `true` if neither clock happened before the other and they differ.
    pub fn is_concurrent_with(&self, other: &VectorClock) -> bool {
        self.partial_cmp(other).is_none()
    }
}

impl Default for VectorClock {
    fn default() -> Self {
        Self::pair()
    }
}

/// Causal partial order. Clocks of different widths are incomparable.
impl PartialOrd for VectorClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.slots.len() != other.slots.len() {
            return None;
        }
        let mut less = false;
        let mut greater = false;
        for (a, b) in self.slots.iter().zip(&other.slots) {
            match a.cmp(b) {
                Ordering::Less => less = true,
                Ordering::Greater => greater = true,
                Ordering::Equal => {}
            }
        }
        match (less, greater) {
            (false, false) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (true, true) => None,
        }
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::{VectorClock, CLIENT_SLOT, SERVER_SLOT};

    #[test]
    fn increment_touches_only_the_given_slot() {
        let mut c = VectorClock::pair();
        c.increment(CLIENT_SLOT);
        c.increment(CLIENT_SLOT);
        assert_eq!(c.as_slice(), &[0, 2]);
        c.increment(SERVER_SLOT);
        assert_eq!(c.as_slice(), &[1, 2]);
    }

    #[test]
    fn merge_takes_componentwise_max() {
        let mut a = VectorClock::from_slots(vec![3, 1]);
        let b = VectorClock::from_slots(vec![2, 5]);
        a.merge(&b);
        assert_eq!(a.as_slice(), &[3, 5]);
    }

    #[test]
    fn merge_is_idempotent_and_commutative() {
        let a = VectorClock::from_slots(vec![4, 0]);
        let b = VectorClock::from_slots(vec![1, 7]);
        let ab = a.merged(&b);
        assert_eq!(ab.merged(&b), ab);
        assert_eq!(ab, b.merged(&a));
    }

    #[test]
    fn causal_order() {
        let a = VectorClock::from_slots(vec![1, 0]);
        let b = VectorClock::from_slots(vec![1, 1]);
        let c = VectorClock::from_slots(vec![0, 2]);
        assert!(a.happened_before(&b));
        assert!(!b.happened_before(&a));
        assert!(a.is_concurrent_with(&c));
        assert!(!a.is_concurrent_with(&a));
    }

    #[test]
    fn display_matches_trace_format() {
        assert_eq!(VectorClock::from_slots(vec![2, 1]).to_string(), "[2, 1]");
        assert_eq!(VectorClock::new(0).to_string(), "[]");
    }

    #[test]
    #[should_panic(expected = "different widths")]
    fn merge_rejects_mismatched_width() {
        let mut a = VectorClock::new(2);
        a.merge(&VectorClock::new(3));
    }
}

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulationResult};

pub use crate::shop::SlotRelease;

/// Inclusive range of time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: u64,
    pub max: u64,
}

impl DurationRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// A range that always samples to zero.
    pub const fn zero() -> Self {
        Self { min: 0, max: 0 }
    }

    /// Draw a whole number of units in `min..=max` and scale it by `unit`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, unit: Duration) -> Duration {
        let units = if self.min >= self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        };
        unit.saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
    }
}

/// Which client threads the driver joins before shutting the server down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinPolicy {
    /// Join every client.
    #[default]
    All,
    /// Join only the first `n` clients (by id) and leave the rest detached.
    Prefix(usize),
}

/// Configuration for a [`crate::simulation::Simulation`] run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of waiting slots.
    pub capacity: usize,
    /// Number of clients spawned by the driver.
    pub client_count: usize,
    /// How long one service takes, in time units.
    pub service_duration: DurationRange,
    /// Delay before each client is spawned, in time units.
    pub arrival_stagger: DurationRange,
    /// Length of one time unit.
    pub time_unit: Duration,
    pub join_policy: JoinPolicy,
    pub slot_release: SlotRelease,
    /// Seed for service and stagger sampling. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            client_count: 10,
            service_duration: DurationRange::new(2, 6),
            arrival_stagger: DurationRange::new(1, 2),
            time_unit: Duration::from_secs(1),
            join_policy: JoinPolicy::All,
            slot_release: SlotRelease::OnServiceStart,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> SimulationResult<()> {
        if self.capacity == 0 {
            return Err(invalid("capacity must be > 0"));
        }
        if self.service_duration.min > self.service_duration.max {
            return Err(invalid(format!(
                "service_duration min {} exceeds max {}",
                self.service_duration.min, self.service_duration.max
            )));
        }
        if self.arrival_stagger.min > self.arrival_stagger.max {
            return Err(invalid(format!(
                "arrival_stagger min {} exceeds max {}",
                self.arrival_stagger.min, self.arrival_stagger.max
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfig {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{DurationRange, JoinPolicy, SimulationConfig};
    use crate::error::SimulationError;

    #[test]
    fn default_config_is_valid() {
        let cfg = SimulationConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.capacity, 3);
        assert_eq!(cfg.client_count, 10);
        assert_eq!(cfg.join_policy, JoinPolicy::All);
    }

    #[test]
    fn rejects_zero_capacity_and_inverted_ranges() {
        let cfg = SimulationConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SimulationError::InvalidConfig { .. })));

        let cfg = SimulationConfig {
            service_duration: DurationRange::new(5, 1),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("service_duration"));
    }

    #[test]
    fn sample_stays_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = DurationRange::new(2, 4);
        for _ in 0..200 {
            let d = range.sample(&mut rng, Duration::from_millis(1));
            assert!(d >= Duration::from_millis(2) && d <= Duration::from_millis(4));
        }
        assert_eq!(
            DurationRange::zero().sample(&mut rng, Duration::from_secs(1)),
            Duration::ZERO
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SimulationConfig =
            serde_json::from_str(r#"{"capacity":1,"client_count":2,"join_policy":{"Prefix":1}}"#)
                .unwrap();
        assert_eq!(cfg.capacity, 1);
        assert_eq!(cfg.client_count, 2);
        assert_eq!(cfg.join_policy, JoinPolicy::Prefix(1));
        assert_eq!(cfg.service_duration, DurationRange::new(2, 6));
    }
}

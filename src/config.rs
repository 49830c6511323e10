use crate::{
    agent::DrivingAgent,
    error::{Error, Result},
    route_manager::RouteManager,
};
use noisy_float::types::{r64, R64};

pub const DEFAULT_MIN_WAYPOINTS: usize = 5;
pub const DEFAULT_CRITICAL_WAYPOINTS: usize = 1;
pub const DEFAULT_TARGET_SPEED_KMH: f64 = 20.0;
pub const DEFAULT_MAX_PLANNING_ATTEMPTS: usize = 3;

/// Remaining-waypoint bounds of the local plan.
///
/// A re-plan is requested when the count is at or below `num_min_waypoints`.
/// At or below `critical_waypoints` the vehicle is about to run out of road
/// and the tick is reported as critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thresholds {
    pub num_min_waypoints: usize,
    pub critical_waypoints: usize,
}

impl Thresholds {
    pub fn is_low(&self, remaining: usize) -> bool {
        remaining <= self.num_min_waypoints
    }

    pub fn is_critical(&self, remaining: usize) -> bool {
        remaining <= self.critical_waypoints
    }

    pub fn validate(&self) -> Result<()> {
        if self.critical_waypoints > self.num_min_waypoints {
            return Err(Error::Config(format!(
                "critical_waypoints ({}) must not exceed num_min_waypoints ({})",
                self.critical_waypoints, self.num_min_waypoints
            )));
        }
        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            num_min_waypoints: DEFAULT_MIN_WAYPOINTS,
            critical_waypoints: DEFAULT_CRITICAL_WAYPOINTS,
        }
    }
}

/// What happens to a queued destination whose planning call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FailedDestinationPolicy {
    /// The destination is consumed and forgotten.
    #[default]
    Drop,
    /// The destination goes to the back of the queue and is tried again once the
    /// destinations ahead of it are served. It is dropped after
    /// `max_planning_attempts` failures.
    Requeue,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RouteManagerInit {
    pub thresholds: Thresholds,
    /// Cruise speed in km/h pushed to the agent on every tick.
    pub target_speed_kmh: R64,
    pub failed_destination: FailedDestinationPolicy,
    /// Planning attempts per destination under [FailedDestinationPolicy::Requeue].
    pub max_planning_attempts: usize,
    /// Initial state of the agent's speed and route logging.
    pub log_target_speed: bool,
}

impl Default for RouteManagerInit {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            target_speed_kmh: r64(DEFAULT_TARGET_SPEED_KMH),
            failed_destination: FailedDestinationPolicy::default(),
            max_planning_attempts: DEFAULT_MAX_PLANNING_ATTEMPTS,
            log_target_speed: false,
        }
    }
}

impl RouteManagerInit {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        validate_speed(self.target_speed_kmh.raw())?;
        if self.max_planning_attempts == 0 {
            return Err(Error::Config(
                "max_planning_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build<A>(&self, agent: A) -> Result<RouteManager<A>>
    where
        A: DrivingAgent,
    {
        self.validate()?;
        Ok(RouteManager::new(self.clone(), agent))
    }
}

/// Checks a speed in km/h and converts it to a finite float.
pub fn validate_speed(speed_kmh: f64) -> Result<R64> {
    match R64::try_new(speed_kmh) {
        Some(speed) if speed_kmh >= 0.0 => Ok(speed),
        _ => Err(Error::Config(format!(
            "speed must be finite and non-negative, got {speed_kmh}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let thresholds = Thresholds {
            num_min_waypoints: 5,
            critical_waypoints: 1,
        };
        assert!(!thresholds.is_low(6));
        assert!(thresholds.is_low(5));
        assert!(thresholds.is_low(0));
        assert!(!thresholds.is_critical(2));
        assert!(thresholds.is_critical(1));
    }

    #[test]
    fn critical_above_min_is_rejected() {
        let thresholds = Thresholds {
            num_min_waypoints: 2,
            critical_waypoints: 3,
        };
        assert!(matches!(thresholds.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_bad_speeds() {
        assert!(validate_speed(f64::NAN).is_err());
        assert!(validate_speed(f64::INFINITY).is_err());
        assert!(validate_speed(-1.0).is_err());
        assert_eq!(validate_speed(30.0).unwrap().raw(), 30.0);
    }

    #[test]
    fn default_init_is_valid() {
        let init = RouteManagerInit::default();
        assert!(init.validate().is_ok());
        assert_eq!(init.thresholds.num_min_waypoints, DEFAULT_MIN_WAYPOINTS);
        assert_eq!(init.failed_destination, FailedDestinationPolicy::Drop);
    }

    #[test]
    fn zero_planning_attempts_is_rejected() {
        let init = RouteManagerInit {
            max_planning_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(init.validate(), Err(Error::Config(_))));
    }
}

use crate::error::Error;
use std::{fmt, str::FromStr};

/// Driving style of an agent. Chosen once when the agent is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Behavior {
    Cautious,
    #[default]
    Normal,
    Aggressive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorParams {
    /// km/h
    pub max_speed: f64,
    /// km/h kept below the road speed limit
    pub speed_lim_dist: f64,
    /// km/h dropped per step when closing in on a leader
    pub speed_decrease: f64,
    /// seconds
    pub safety_time: f64,
    /// meters
    pub min_proximity_threshold: f64,
    /// meters
    pub braking_distance: f64,
    pub tailgate_counter: i32,
}

impl Behavior {
    pub const ALL: [Behavior; 3] = [Self::Cautious, Self::Normal, Self::Aggressive];

    pub fn params(&self) -> BehaviorParams {
        match self {
            Self::Cautious => BehaviorParams {
                max_speed: 40.0,
                speed_lim_dist: 6.0,
                speed_decrease: 12.0,
                safety_time: 3.0,
                min_proximity_threshold: 12.0,
                braking_distance: 6.0,
                tailgate_counter: 0,
            },
            Self::Normal => BehaviorParams {
                max_speed: 50.0,
                speed_lim_dist: 3.0,
                speed_decrease: 10.0,
                safety_time: 3.0,
                min_proximity_threshold: 10.0,
                braking_distance: 5.0,
                tailgate_counter: 0,
            },
            Self::Aggressive => BehaviorParams {
                max_speed: 70.0,
                speed_lim_dist: 1.0,
                speed_decrease: 8.0,
                safety_time: 3.0,
                min_proximity_threshold: 8.0,
                braking_distance: 4.0,
                tailgate_counter: -1,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cautious => "cautious",
            Self::Normal => "normal",
            Self::Aggressive => "aggressive",
        }
    }
}

impl BehaviorParams {
    /// Limits a requested speed to what this profile allows.
    pub fn cap_speed(&self, speed_kmh: f64) -> f64 {
        speed_kmh.clamp(0.0, self.max_speed)
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|behavior| behavior.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown behavior '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_names() {
        for behavior in Behavior::ALL {
            assert_eq!(behavior.to_string().parse::<Behavior>().unwrap(), behavior);
        }
        assert_eq!("Cautious".parse::<Behavior>().unwrap(), Behavior::Cautious);
        assert!("reckless".parse::<Behavior>().is_err());
    }

    #[test]
    fn aggressive_drives_faster_with_shorter_gaps() {
        let cautious = Behavior::Cautious.params();
        let aggressive = Behavior::Aggressive.params();
        assert!(aggressive.max_speed > cautious.max_speed);
        assert!(aggressive.braking_distance < cautious.braking_distance);
        assert!(aggressive.min_proximity_threshold < cautious.min_proximity_threshold);
    }

    #[test]
    fn cap_speed_respects_profile_limit() {
        let params = Behavior::Normal.params();
        assert_eq!(params.cap_speed(80.0), 50.0);
        assert_eq!(params.cap_speed(20.0), 20.0);
        assert_eq!(params.cap_speed(-5.0), 0.0);
    }
}

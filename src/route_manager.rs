use crate::{
    agent::{Actuator, DrivingAgent, Route},
    config::{validate_speed, FailedDestinationPolicy, RouteManagerInit},
    error::{Error, Result},
    queue::DestinationQueue,
};
use log::{debug, info, warn};
use noisy_float::types::R64;

/// Whether the last tick had to pick a new route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// The local plan had enough waypoints left.
    #[default]
    Cruising,
    /// The local plan ran low and a destination was selected.
    Replanning,
}

/// Counters accumulated over a control session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub ticks: usize,
    pub auto_routes: usize,
    pub destination_routes: usize,
    pub planning_failures: usize,
    pub dropped_destinations: usize,
    pub critical_ticks: usize,
}

/// Keeps one vehicle supplied with routes.
///
/// Each [tick](Self::tick) checks how much of the agent's local plan is left. When
/// the plan is low, the manager routes the vehicle to the next queued destination.
/// With an empty queue it lets the agent invent a route. It then obtains a control
/// command from the agent and applies it to the vehicle.
pub struct RouteManager<A>
where
    A: DrivingAgent,
{
    agent: A,
    destinations: DestinationQueue<A::Waypoint>,
    active_route: Route<A::Waypoint>,
    init: RouteManagerInit,
    speed_override: Option<R64>,
    phase: Phase,
    stats: RouteStats,
}

impl<A> RouteManager<A>
where
    A: DrivingAgent,
{
    pub(crate) fn new(init: RouteManagerInit, mut agent: A) -> Self {
        agent.set_logging_enabled(init.log_target_speed);

        Self {
            agent,
            destinations: DestinationQueue::new(),
            active_route: Route::new(),
            init,
            speed_override: None,
            phase: Phase::default(),
            stats: RouteStats::default(),
        }
    }

    /// Queues a destination behind any already waiting.
    pub fn add_route(&mut self, waypoint: A::Waypoint) {
        self.destinations.push_back(waypoint);
    }

    /// Shared handle to the destination queue for producers outside the driving loop.
    pub fn destinations(&self) -> DestinationQueue<A::Waypoint> {
        self.destinations.clone()
    }

    pub fn pending_destinations(&self) -> Vec<A::Waypoint> {
        self.destinations.snapshot()
    }

    pub fn tick<V>(&mut self, vehicle: &mut V) -> Result<()>
    where
        V: Actuator<A::Control>,
    {
        self.stats.ticks += 1;

        let remaining = self
            .agent
            .remaining_waypoint_count()
            .map_err(|err| Error::Query(err.into()))?;
        let thresholds = self.init.thresholds;

        if thresholds.is_critical(remaining) {
            self.stats.critical_ticks += 1;
            warn!(
                "local plan nearly exhausted: {remaining} waypoints left (critical at {})",
                thresholds.critical_waypoints
            );
        }

        // A failed plan still leaves the agent's current local plan to drive on, so
        // the error is reported only after this tick's control is applied.
        let planned = if thresholds.is_low(remaining) {
            self.phase = Phase::Replanning;
            debug!(
                "{remaining} waypoints left (min {}), selecting a new route",
                thresholds.num_min_waypoints
            );
            self.replan()
        } else {
            self.phase = Phase::Cruising;
            Ok(())
        };

        let speed = self.target_speed_kmh();
        self.agent.set_target_speed(speed);

        let control = self
            .agent
            .compute_control()
            .map_err(|err| Error::Control(err.into()))?;
        vehicle
            .apply_control(&control)
            .map_err(|err| Error::Actuation(err.into()))?;

        planned
    }

    fn replan(&mut self) -> Result<()> {
        let Some(mut pending) = self.destinations.pop_pending() else {
            return self.replan_auto();
        };
        let destination = &pending.waypoint;

        let planned = self
            .agent
            .current_waypoint()
            .and_then(|from| self.agent.plan_route(&from, destination));

        match planned {
            Ok(route) => {
                self.stats.destination_routes += 1;
                info!(
                    "routing to queued destination {destination:?} ({} points, {} queued)",
                    route.len(),
                    self.destinations.len()
                );
                self.active_route = route;
                Ok(())
            }
            Err(err) => {
                self.stats.planning_failures += 1;
                let label = format!("{destination:?}");

                pending.failed_attempts += 1;

                let requeue = match self.init.failed_destination {
                    FailedDestinationPolicy::Drop => false,
                    FailedDestinationPolicy::Requeue => {
                        pending.failed_attempts < self.init.max_planning_attempts
                    }
                };

                if requeue {
                    warn!(
                        "planning to {label} failed (attempt {}/{}), requeueing it: {err}",
                        pending.failed_attempts, self.init.max_planning_attempts
                    );
                    self.destinations.requeue(pending);
                } else {
                    self.stats.dropped_destinations += 1;
                    warn!(
                        "planning to {label} failed after {} attempt(s), dropping it: {err}",
                        pending.failed_attempts
                    );
                }

                Err(Error::Planning {
                    destination: Some(label),
                    source: err.into(),
                })
            }
        }
    }

    fn replan_auto(&mut self) -> Result<()> {
        match self.agent.plan_auto_route() {
            Ok(route) => {
                self.stats.auto_routes += 1;
                info!(
                    "no destination queued, following automatic route #{} ({} points)",
                    self.stats.auto_routes,
                    route.len()
                );
                self.active_route = route;
                Ok(())
            }
            Err(err) => {
                self.stats.planning_failures += 1;
                warn!("automatic route planning failed: {err}");
                Err(Error::Planning {
                    destination: None,
                    source: err.into(),
                })
            }
        }
    }

    /// Turns the agent's speed and route logging on or off.
    pub fn request_target_speed_log(&mut self, enabled: bool) {
        self.agent.set_logging_enabled(enabled);
    }

    pub fn set_target_speed(&mut self, speed_kmh: f64) -> Result<()> {
        self.init.target_speed_kmh = validate_speed(speed_kmh)?;
        Ok(())
    }

    /// Forces the vehicle to a fixed speed, or returns it to the cruise speed with
    /// `None`.
    pub fn set_speed_override(&mut self, speed_kmh: Option<f64>) -> Result<()> {
        self.speed_override = speed_kmh.map(validate_speed).transpose()?;
        Ok(())
    }

    pub fn speed_override(&self) -> Option<f64> {
        self.speed_override.map(|speed| speed.raw())
    }

    /// Speed forwarded to the agent on the next tick.
    pub fn target_speed_kmh(&self) -> f64 {
        self.speed_override
            .unwrap_or(self.init.target_speed_kmh)
            .raw()
    }

    pub fn active_route(&self) -> &Route<A::Waypoint> {
        &self.active_route
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> &RouteStats {
        &self.stats
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn into_agent(self) -> A {
        self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Default)]
    struct IdleAgent {
        speeds: Vec<f64>,
        logging: Vec<bool>,
    }

    impl DrivingAgent for IdleAgent {
        type Waypoint = u32;
        type Control = f64;
        type Error = Infallible;

        fn remaining_waypoint_count(&self) -> Result<usize, Infallible> {
            Ok(100)
        }

        fn current_waypoint(&self) -> Result<u32, Infallible> {
            Ok(0)
        }

        fn plan_route(&mut self, _from: &u32, _to: &u32) -> Result<Route<u32>, Infallible> {
            Ok(Route::new())
        }

        fn plan_auto_route(&mut self) -> Result<Route<u32>, Infallible> {
            Ok(Route::new())
        }

        fn compute_control(&mut self) -> Result<f64, Infallible> {
            Ok(self.speeds.last().copied().unwrap_or_default())
        }

        fn set_logging_enabled(&mut self, enabled: bool) {
            self.logging.push(enabled);
        }

        fn set_target_speed(&mut self, speed_kmh: f64) {
            self.speeds.push(speed_kmh);
        }
    }

    #[derive(Default)]
    struct Sink(Vec<f64>);

    impl Actuator<f64> for Sink {
        type Error = Infallible;

        fn apply_control(&mut self, control: &f64) -> Result<(), Infallible> {
            self.0.push(*control);
            Ok(())
        }
    }

    #[test]
    fn speed_override_takes_precedence_until_cleared() {
        let mut manager = RouteManagerInit::default()
            .build(IdleAgent::default())
            .unwrap();
        let mut sink = Sink::default();

        manager.tick(&mut sink).unwrap();
        manager.set_speed_override(Some(0.0)).unwrap();
        manager.tick(&mut sink).unwrap();
        manager.set_speed_override(None).unwrap();
        manager.set_target_speed(35.0).unwrap();
        manager.tick(&mut sink).unwrap();

        assert_eq!(manager.agent().speeds, vec![20.0, 0.0, 35.0]);
        assert_eq!(sink.0, vec![20.0, 0.0, 35.0]);
        assert_eq!(manager.phase(), Phase::Cruising);
    }

    #[test]
    fn invalid_speed_keeps_previous_value() {
        let mut manager = RouteManagerInit::default()
            .build(IdleAgent::default())
            .unwrap();

        assert!(manager.set_target_speed(f64::NAN).is_err());
        assert!(manager.set_speed_override(Some(-3.0)).is_err());
        assert_eq!(manager.target_speed_kmh(), 20.0);
        assert_eq!(manager.speed_override(), None);
    }

    #[test]
    fn logging_flag_is_forwarded() {
        let init = RouteManagerInit {
            log_target_speed: true,
            ..Default::default()
        };
        let mut manager = init.build(IdleAgent::default()).unwrap();
        manager.request_target_speed_log(false);

        assert_eq!(manager.into_agent().logging, vec![true, false]);
    }
}

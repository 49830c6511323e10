//! Interfaces to the services the route manager drives.
//!
//! The simulator owns the world, the map and the vehicle. A driving agent owns the
//! local plan and the control synthesis. The route manager only decides when to ask
//! the agent for a new route and where that route should go.

use std::fmt::Debug;

/// Maneuver hint attached to each point of a planned route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoadOption {
    #[default]
    Void,
    Left,
    Right,
    Straight,
    LaneFollow,
    ChangeLaneLeft,
    ChangeLaneRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint<W> {
    pub waypoint: W,
    pub option: RoadOption,
}

impl<W> RoutePoint<W> {
    pub fn new(waypoint: W, option: RoadOption) -> Self {
        Self { waypoint, option }
    }
}

pub type Route<W> = Vec<RoutePoint<W>>;

/// A vehicle-scoped driving agent.
///
/// Every call may block and every call may fail. An agent keeps per-vehicle state
/// (its local plan), so one agent must never serve two managers.
pub trait DrivingAgent {
    /// Opaque road network handle resolved by the map service.
    type Waypoint: Clone + Debug;
    type Control;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of waypoints left in the agent's local plan.
    fn remaining_waypoint_count(&self) -> Result<usize, Self::Error>;

    /// The waypoint a new plan should start from, usually some lookahead
    /// distance in front of the vehicle.
    fn current_waypoint(&self) -> Result<Self::Waypoint, Self::Error>;

    fn plan_route(
        &mut self,
        from: &Self::Waypoint,
        to: &Self::Waypoint,
    ) -> Result<Route<Self::Waypoint>, Self::Error>;

    /// Invent a route that keeps the vehicle moving when no destination is queued.
    fn plan_auto_route(&mut self) -> Result<Route<Self::Waypoint>, Self::Error>;

    fn compute_control(&mut self) -> Result<Self::Control, Self::Error>;

    fn set_logging_enabled(&mut self, enabled: bool);

    fn set_target_speed(&mut self, speed_kmh: f64);
}

/// Applies control commands to a vehicle.
pub trait Actuator<C> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn apply_control(&mut self, control: &C) -> Result<(), Self::Error>;
}

impl<C, T> Actuator<C> for &mut T
where
    T: Actuator<C> + ?Sized,
{
    type Error = T::Error;

    fn apply_control(&mut self, control: &C) -> Result<(), Self::Error> {
        (**self).apply_control(control)
    }
}

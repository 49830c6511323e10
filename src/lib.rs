pub mod agent;
pub mod behavior;
pub mod config;
pub mod control;
pub mod error;
pub mod queue;
pub mod route_manager;

pub use agent::{Actuator, DrivingAgent, RoadOption, Route, RoutePoint};
pub use behavior::{Behavior, BehaviorParams};
pub use config::{FailedDestinationPolicy, RouteManagerInit, Thresholds};
pub use control::ControlCommand;
pub use error::{Error, Result};
pub use queue::DestinationQueue;
pub use route_manager::{Phase, RouteManager, RouteStats};

use anyhow::{Context, Result};
use carla_route_manager::{
    config::validate_speed, Actuator, Behavior, BehaviorParams, ControlCommand, DrivingAgent,
    FailedDestinationPolicy, RoadOption, Route, RouteManagerInit, RoutePoint, Thresholds,
};
use clap::Parser;
use rand::prelude::*;
use std::{collections::VecDeque, convert::Infallible, fmt, thread, time::Duration};

#[derive(Parser)]
struct Opts {
    /// Number of waypoints on the simulated ring road.
    #[clap(long, default_value = "200")]
    pub ring_size: u32,
    #[clap(long, default_value = "300")]
    pub ticks: usize,
    #[clap(long, default_value = "normal")]
    pub behavior: Behavior,
    #[clap(long, default_value = "20.0")]
    pub target_speed: f64,
    #[clap(long, default_value = "5")]
    pub min_waypoints: usize,
    #[clap(long, default_value = "1")]
    pub critical_waypoints: usize,
    /// Put destinations that fail to plan back at the end of the queue.
    #[clap(long)]
    pub requeue: bool,
    #[clap(long, default_value = "3")]
    pub max_planning_attempts: usize,
    /// Destinations sent by the input thread.
    #[clap(long, default_value = "4")]
    pub destinations: usize,
    #[clap(long)]
    pub log_speed: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    anyhow::ensure!(opts.ring_size > 0, "ring size must be positive");

    let init = RouteManagerInit {
        thresholds: Thresholds {
            num_min_waypoints: opts.min_waypoints,
            critical_waypoints: opts.critical_waypoints,
        },
        target_speed_kmh: validate_speed(opts.target_speed)?,
        failed_destination: if opts.requeue {
            FailedDestinationPolicy::Requeue
        } else {
            FailedDestinationPolicy::Drop
        },
        max_planning_attempts: opts.max_planning_attempts,
        log_target_speed: opts.log_speed,
    };
    let agent = RingRoadAgent::new(opts.ring_size, opts.behavior);
    let mut manager = init.build(agent)?;
    let mut vehicle = PrintVehicle::default();

    // Destinations arrive from an input thread while the loop drives.
    let producer = {
        let queue = manager.destinations();
        let ring_size = opts.ring_size;
        let count = opts.destinations;

        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for _ in 0..count {
                // Every fifth pick lands off the ring to exercise planning failures.
                let waypoint = if rng.gen_ratio(1, 5) {
                    ring_size + rng.gen_range(0..10)
                } else {
                    rng.gen_range(0..ring_size)
                };
                queue.push_back(waypoint);
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    for tick in 0..opts.ticks {
        if tick == opts.ticks / 2 {
            println!("remote stop for 10 ticks");
            manager.set_speed_override(Some(0.0))?;
        } else if tick == opts.ticks / 2 + 10 {
            manager.set_speed_override(None)?;
        }

        if let Err(err) = manager.tick(&mut vehicle) {
            if !err.is_planning_failure() {
                return Err(err).with_context(|| format!("tick {tick} failed"));
            }
            eprintln!("tick {tick}: {err}");
        }
        thread::sleep(Duration::from_millis(1));
    }

    producer
        .join()
        .map_err(|_| anyhow::anyhow!("destination producer panicked"))?;

    println!("pending destinations: {:?}", manager.pending_destinations());
    println!("{:#?}", manager.stats());
    Ok(())
}

#[derive(Debug)]
struct OffRoad(u32);

impl fmt::Display for OffRoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "waypoint {} is not on the road network", self.0)
    }
}

impl std::error::Error for OffRoad {}

/// A vehicle going around a one-way ring of numbered waypoints.
struct RingRoadAgent {
    ring_size: u32,
    position: u32,
    local_plan: VecDeque<u32>,
    params: BehaviorParams,
    target_speed: f64,
    log: bool,
    rng: StdRng,
}

impl RingRoadAgent {
    const LOOKAHEAD: u32 = 2;

    fn new(ring_size: u32, behavior: Behavior) -> Self {
        Self {
            ring_size,
            position: 0,
            local_plan: VecDeque::new(),
            params: behavior.params(),
            target_speed: 0.0,
            log: false,
            rng: StdRng::seed_from_u64(ring_size as u64),
        }
    }

    fn trace(&self, from: u32, to: u32) -> Route<u32> {
        let len = (to + self.ring_size - from) % self.ring_size;
        (0..=len)
            .map(|step| {
                let waypoint = (from + step) % self.ring_size;
                let option = if step == len {
                    RoadOption::Straight
                } else {
                    RoadOption::LaneFollow
                };
                RoutePoint::new(waypoint, option)
            })
            .collect()
    }

    fn adopt(&mut self, route: &Route<u32>) {
        self.local_plan = route.iter().map(|point| point.waypoint).collect();
    }
}

impl DrivingAgent for RingRoadAgent {
    type Waypoint = u32;
    type Control = ControlCommand;
    type Error = OffRoad;

    fn remaining_waypoint_count(&self) -> Result<usize, OffRoad> {
        Ok(self.local_plan.len())
    }

    fn current_waypoint(&self) -> Result<u32, OffRoad> {
        Ok((self.position + Self::LOOKAHEAD) % self.ring_size)
    }

    fn plan_route(&mut self, from: &u32, to: &u32) -> Result<Route<u32>, OffRoad> {
        if *to >= self.ring_size {
            return Err(OffRoad(*to));
        }
        let route = self.trace(*from, *to);
        self.adopt(&route);
        Ok(route)
    }

    fn plan_auto_route(&mut self) -> Result<Route<u32>, OffRoad> {
        let from = self.current_waypoint()?;
        let distance = self.rng.gen_range(10..30);
        let route = self.trace(from, (from + distance) % self.ring_size);
        self.adopt(&route);
        Ok(route)
    }

    fn compute_control(&mut self) -> Result<ControlCommand, OffRoad> {
        let speed = self.params.cap_speed(self.target_speed);
        if speed > 0.0 {
            if let Some(next) = self.local_plan.pop_front() {
                self.position = next;
            }
        }
        if self.log {
            println!(
                "speed {speed:.1} km/h at waypoint {} ({} left)",
                self.position,
                self.local_plan.len()
            );
        }

        let control = if speed > 0.0 {
            ControlCommand {
                throttle: speed / self.params.max_speed,
                brake: 0.0,
                hand_brake: false,
                ..Default::default()
            }
        } else {
            ControlCommand::default()
        };
        Ok(control)
    }

    fn set_logging_enabled(&mut self, enabled: bool) {
        self.log = enabled;
    }

    fn set_target_speed(&mut self, speed_kmh: f64) {
        self.target_speed = speed_kmh;
    }
}

#[derive(Default)]
struct PrintVehicle {
    applied: usize,
}

impl Actuator<ControlCommand> for PrintVehicle {
    type Error = Infallible;

    fn apply_control(&mut self, control: &ControlCommand) -> Result<(), Infallible> {
        self.applied += 1;
        if self.applied % 50 == 0 {
            println!("control #{}: {control:?}", self.applied);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlCommand {
    pub throttle: f64,
    pub steer: f64,
    pub brake: f64,
    pub reverse: bool,
    pub hand_brake: bool,
}

impl Default for ControlCommand {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            brake: 1.0,
            steer: 0.0,
            reverse: false,
            hand_brake: true,
        }
    }
}

impl ControlCommand {
    pub fn clamped(&self) -> Self {
        let Self {
            throttle,
            steer,
            brake,
            reverse,
            hand_brake,
        } = *self;

        Self {
            throttle: throttle.clamp(0.0, 1.0),
            steer: steer.clamp(-1.0, 1.0),
            brake: brake.clamp(0.0, 1.0),
            reverse,
            hand_brake,
        }
    }
}

#[cfg(feature = "carla")]
mod carla_bridge {
    use super::ControlCommand;
    use crate::agent::Actuator;
    use carla::{client::Vehicle, rpc::VehicleControl};
    use std::convert::Infallible;

    impl From<&ControlCommand> for VehicleControl {
        fn from(control: &ControlCommand) -> Self {
            let ControlCommand {
                throttle,
                steer,
                brake,
                reverse,
                hand_brake,
            } = control.clamped();

            VehicleControl {
                throttle: throttle as f32,
                steer: steer as f32,
                brake: brake as f32,
                hand_brake,
                reverse,
                manual_gear_shift: false,
                gear: 0,
            }
        }
    }

    impl Actuator<ControlCommand> for Vehicle {
        type Error = Infallible;

        fn apply_control(&mut self, control: &ControlCommand) -> Result<(), Self::Error> {
            Vehicle::apply_control(self, &VehicleControl::from(control));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_holds_the_vehicle() {
        let control = ControlCommand::default();
        assert_eq!(control.throttle, 0.0);
        assert_eq!(control.brake, 1.0);
        assert!(control.hand_brake);
    }

    #[test]
    fn clamped_limits_ranges() {
        let control = ControlCommand {
            throttle: 1.7,
            steer: -2.0,
            brake: -0.3,
            reverse: true,
            hand_brake: false,
        }
        .clamped();

        assert_eq!(control.throttle, 1.0);
        assert_eq!(control.steer, -1.0);
        assert_eq!(control.brake, 0.0);
        assert!(control.reverse);
    }
}

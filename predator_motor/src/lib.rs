//! Pursuing-predator steering (horizontal seek with a suppression latch).
#![forbid(unsafe_code)]

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

const DIRECTION_EPSILON: Real = 1.0e-6;

#[derive(Clone, Copy, Debug)]
pub struct PredatorConfig {
    pub speed: Real,
    pub ground_level: Real,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            ground_level: -20.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PredatorPose {
    pub position: Vector<Real>,
    /// Yaw toward the player, radians, `atan2(dir.x, dir.z)` convention.
    pub facing: Real,
}

pub struct PredatorMotor {
    config: PredatorConfig,
    position: Vector<Real>,
    facing: Real,
    suppressed: bool,
}

impl PredatorMotor {
    pub fn new(config: PredatorConfig, spawn: Vector<Real>) -> Self {
        let mut position = spawn;
        position.y = config.ground_level;
        Self {
            config,
            position,
            facing: 0.0,
            suppressed: false,
        }
    }

    pub fn pose(&self) -> PredatorPose {
        PredatorPose {
            position: self.position,
            facing: self.facing,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// One-way latch: once set the predator never advances again. It keeps
    /// existing and reporting a pose for rendering.
    pub fn suppress(&mut self) {
        self.suppressed = true;
    }

    pub fn step(&mut self, player_position: Vector<Real>, dt: Real) {
        if self.suppressed {
            return;
        }
        let dt = dt.max(0.0);
        let to_player = Vector::new(
            player_position.x - self.position.x,
            0.0,
            player_position.z - self.position.z,
        );
        let len2 = to_player.norm_squared();
        if len2 <= DIRECTION_EPSILON {
            // Sharing the player's horizontal position: no direction to
            // steer along, so hold still instead of producing NaN.
            return;
        }
        let direction = to_player / len2.sqrt();
        self.position += direction * (self.config.speed * dt);
        self.position.y = self.config.ground_level;
        self.facing = direction.x.atan2(direction.z);
    }
}

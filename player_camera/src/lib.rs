//! First-person camera: look basis, ground-pinned movement, jump arc.
#![forbid(unsafe_code)]

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

const PITCH_LIMIT_DEG: Real = 89.0;
const INITIAL_YAW_DEG: Real = -90.0;

fn world_up() -> Vector<Real> {
    Vector::new(0.0, 1.0, 0.0)
}

#[derive(Clone, Copy, Debug)]
pub struct CameraConfig {
    pub ground_level: Real,
    pub eye_height: Real,
    pub gravity: Real,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ground_level: -20.0,
            eye_height: 14.0,
            gravity: 50.0,
        }
    }
}

/// Camera state. The view basis stays orthonormal: it is recomputed from
/// (yaw, pitch) on every rotation, never integrated incrementally.
#[derive(Clone, Copy, Debug)]
pub struct PlayerCamera {
    config: CameraConfig,
    position: Vector<Real>,
    view_dir: Vector<Real>,
    up: Vector<Real>,
    right: Vector<Real>,
    yaw_deg: Real,
    pitch_deg: Real,
    jump_velocity: Real,
    jumping: bool,
}

impl PlayerCamera {
    pub fn new(config: CameraConfig, spawn: Vector<Real>) -> Self {
        let mut camera = Self {
            config,
            position: spawn,
            view_dir: Vector::new(0.0, 0.0, -1.0),
            up: world_up(),
            right: Vector::new(1.0, 0.0, 0.0),
            yaw_deg: INITIAL_YAW_DEG,
            pitch_deg: 0.0,
            jump_velocity: 0.0,
            jumping: false,
        };
        camera.rebuild_basis();
        camera
    }

    pub fn position(&self) -> Vector<Real> {
        self.position
    }

    pub fn view_direction(&self) -> Vector<Real> {
        self.view_dir
    }

    pub fn up(&self) -> Vector<Real> {
        self.up
    }

    pub fn right(&self) -> Vector<Real> {
        self.right
    }

    pub fn yaw_deg(&self) -> Real {
        self.yaw_deg
    }

    pub fn pitch_deg(&self) -> Real {
        self.pitch_deg
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Resting camera altitude: ground level plus eye height.
    pub fn eye_level(&self) -> Real {
        self.config.ground_level + self.config.eye_height
    }

    /// Used by the orchestrator to commit or revert a move after the
    /// collision verdict.
    pub fn set_position(&mut self, position: Vector<Real>) {
        self.position = position;
    }

    pub fn move_forward(&mut self, distance: Real) {
        let flat = self.flat_view();
        self.displace(flat * distance);
    }

    pub fn move_back(&mut self, distance: Real) {
        let flat = self.flat_view();
        self.displace(-flat * distance);
    }

    pub fn move_left(&mut self, distance: Real) {
        let flat = self.flat_right();
        self.displace(-flat * distance);
    }

    pub fn move_right(&mut self, distance: Real) {
        let flat = self.flat_right();
        self.displace(flat * distance);
    }

    pub fn rotate(&mut self, yaw_delta_deg: Real, pitch_delta_deg: Real) {
        self.yaw_deg += yaw_delta_deg;
        self.pitch_deg =
            (self.pitch_deg + pitch_delta_deg).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        self.rebuild_basis();
    }

    /// At most one jump may be airborne: a no-op while already jumping.
    pub fn start_jump(&mut self, initial_velocity: Real) {
        if self.jumping {
            return;
        }
        self.jump_velocity = initial_velocity;
        self.jumping = true;
    }

    pub fn advance_jump(&mut self, dt: Real) {
        if !self.jumping {
            return;
        }
        let dt = dt.max(0.0);
        self.position.y += self.jump_velocity * dt;
        self.jump_velocity -= self.config.gravity * dt;
        if self.position.y <= self.eye_level() {
            self.position.y = self.eye_level();
            self.jump_velocity = 0.0;
            self.jumping = false;
        }
    }

    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        let forward = self.view_dir;
        let right = self.right;
        let up = self.up;
        [
            [right.x, up.x, -forward.x, 0.0],
            [right.y, up.y, -forward.y, 0.0],
            [right.z, up.z, -forward.z, 0.0],
            [
                -right.dot(&self.position),
                -up.dot(&self.position),
                forward.dot(&self.position),
                1.0,
            ],
        ]
    }

    fn flat_view(&self) -> Vector<Real> {
        normalize_or_zero(Vector::new(self.view_dir.x, 0.0, self.view_dir.z))
    }

    fn flat_right(&self) -> Vector<Real> {
        normalize_or_zero(Vector::new(self.right.x, 0.0, self.right.z))
    }

    fn displace(&mut self, delta: Vector<Real>) {
        self.position += delta;
        if !self.jumping {
            self.position.y = self.eye_level();
        }
    }

    fn rebuild_basis(&mut self) {
        let yaw = self.yaw_deg.to_radians();
        let pitch = self.pitch_deg.to_radians();
        let direction = Vector::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.view_dir = direction.normalize();
        self.right = self.view_dir.cross(&world_up()).normalize();
        self.up = self.right.cross(&self.view_dir).normalize();
    }
}

fn normalize_or_zero(value: Vector<Real>) -> Vector<Real> {
    let len2 = value.norm_squared();
    if len2 > 0.0 {
        value / len2.sqrt()
    } else {
        Vector::zeros()
    }
}

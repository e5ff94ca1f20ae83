//! Falling-meteor arena: spawn, advance, retire, recycle.
//!
//! Slots are index-stable; retired meteors go on a free list and are reused
//! by later spawns, so storage stays bounded over long sessions.
#![forbid(unsafe_code)]

use rand::Rng;
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug)]
pub struct SpawnConfig {
    /// Half-extent of the square spawn area on the ground plane.
    pub horizontal_range: Real,
    pub spawn_altitude: Real,
    pub fall_speed_min: Real,
    pub fall_speed_max: Real,
    pub scale_min: Real,
    pub scale_max: Real,
    /// Meteors below this altitude are retired.
    pub ground_threshold: Real,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            horizontal_range: 300.0,
            spawn_altitude: 200.0,
            fall_speed_min: 50.0,
            fall_speed_max: 100.0,
            scale_min: 1.0,
            scale_max: 5.0,
            ground_threshold: -20.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Meteor {
    pub position: Vector<Real>,
    pub velocity: Vector<Real>,
    pub scale: Real,
    pub active: bool,
}

pub struct MeteorPool {
    config: SpawnConfig,
    slots: Vec<Meteor>,
    free: Vec<usize>,
}

impl MeteorPool {
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn config(&self) -> SpawnConfig {
        self.config
    }

    /// Spawns one meteor, reusing a retired slot when one is available.
    /// Returns the slot index.
    pub fn spawn<R: Rng>(&mut self, rng: &mut R) -> usize {
        let range = self.config.horizontal_range;
        let meteor = Meteor {
            position: Vector::new(
                rng.gen_range(-range..=range),
                self.config.spawn_altitude,
                rng.gen_range(-range..=range),
            ),
            velocity: Vector::new(
                0.0,
                -rng.gen_range(self.config.fall_speed_min..=self.config.fall_speed_max),
                0.0,
            ),
            scale: rng.gen_range(self.config.scale_min..=self.config.scale_max),
            active: true,
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = meteor;
                index
            }
            None => {
                self.slots.push(meteor);
                self.slots.len() - 1
            }
        }
    }

    pub fn advance(&mut self, dt: Real) {
        let dt = dt.max(0.0);
        for (index, meteor) in self.slots.iter_mut().enumerate() {
            if !meteor.active {
                continue;
            }
            meteor.position += meteor.velocity * dt;
            if meteor.position.y < self.config.ground_threshold {
                meteor.active = false;
                self.free.push(index);
            }
        }
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Meteor> {
        self.slots.iter().filter(|meteor| meteor.active)
    }

    pub fn active_len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Total slot count, recycled or not. Stays flat once spawn and retire
    /// rates balance.
    pub fn slot_len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn spawned_meteor_lands_within_the_configured_ranges() {
        let mut pool = MeteorPool::new(SpawnConfig::default());
        let mut rng = seeded_rng();
        let index = pool.spawn(&mut rng);
        let meteor = pool.slots[index];
        assert!(meteor.active);
        assert_eq!(meteor.position.y, 200.0);
        assert!(meteor.position.x.abs() <= 300.0);
        assert!(meteor.position.z.abs() <= 300.0);
        assert!(meteor.velocity.y <= -50.0 && meteor.velocity.y >= -100.0);
        assert!(meteor.scale >= 1.0 && meteor.scale <= 5.0);
    }

    #[test]
    fn meteor_retires_after_the_expected_fall_time_and_stays_retired() {
        let mut pool = MeteorPool::new(SpawnConfig::default());
        let mut rng = seeded_rng();
        let index = pool.spawn(&mut rng);
        let meteor = pool.slots[index];
        let fall_time =
            (meteor.position.y - pool.config.ground_threshold) / meteor.velocity.y.abs();

        let dt = 0.05;
        let mut elapsed = 0.0;
        while pool.slots[index].active {
            pool.advance(dt);
            elapsed += dt;
            assert!(elapsed < 60.0, "meteor never retired");
        }
        assert!(elapsed + 1.0e-3 >= fall_time);

        for _ in 0..100 {
            pool.advance(dt);
            assert!(!pool.slots[index].active);
        }
    }

    #[test]
    fn retired_slots_are_recycled_instead_of_growing_storage() {
        let mut pool = MeteorPool::new(SpawnConfig::default());
        let mut rng = seeded_rng();
        for _ in 0..8 {
            pool.spawn(&mut rng);
            // Fall speed is at most 100 and spawn altitude 200, so four
            // seconds always reaches the ground threshold.
            for _ in 0..80 {
                pool.advance(0.05);
            }
        }
        assert_eq!(pool.slot_len(), 1);
        assert_eq!(pool.active_len(), 0);
    }

    #[test]
    fn active_iteration_skips_retired_slots() {
        let mut pool = MeteorPool::new(SpawnConfig::default());
        let mut rng = seeded_rng();
        pool.spawn(&mut rng);
        pool.spawn(&mut rng);
        for _ in 0..80 {
            pool.advance(0.05);
        }
        pool.spawn(&mut rng);
        assert_eq!(pool.iter_active().count(), 1);
        assert_eq!(pool.slot_len(), 2);
    }
}

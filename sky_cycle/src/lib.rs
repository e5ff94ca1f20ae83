//! Wrapping day-night clock driving sun position and ambient color.
#![forbid(unsafe_code)]

use std::f32::consts::TAU;

const DEFAULT_PERIOD: f32 = 60.0;
const SUN_ORBIT_RADIUS: f32 = 200.0;
const SUN_BASE_HEIGHT: f32 = 200.0;
const SUN_HEIGHT_SWING: f32 = 100.0;

pub const NIGHT_COLOR: [f32; 3] = [0.05, 0.05, 0.1];
pub const DAY_COLOR: [f32; 3] = [0.5, 0.7, 1.0];

#[derive(Clone, Copy, Debug)]
pub struct DayNightCycle {
    elapsed: f32,
    period: f32,
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl DayNightCycle {
    pub fn new(period: f32) -> Self {
        Self {
            elapsed: 0.0,
            period: period.max(f32::EPSILON),
        }
    }

    /// Modular subtraction on wrap keeps the phase continuous: the overshoot
    /// past the period is carried into the next cycle instead of discarded.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
        while self.elapsed >= self.period {
            self.elapsed -= self.period;
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn phase_angle(&self) -> f32 {
        TAU * (self.elapsed / self.period)
    }

    pub fn sun_position(&self) -> [f32; 3] {
        let phase = self.phase_angle();
        [
            SUN_ORBIT_RADIUS * phase.cos(),
            SUN_BASE_HEIGHT + SUN_HEIGHT_SWING * phase.sin(),
            SUN_ORBIT_RADIUS * phase.sin(),
        ]
    }

    /// 1.0 at solar zenith, 0.0 at the darkest point.
    pub fn day_factor(&self) -> f32 {
        0.5 * (1.0 + self.phase_angle().sin())
    }

    pub fn ambient_color(&self) -> [f32; 3] {
        let factor = self.day_factor();
        [
            lerp(NIGHT_COLOR[0], DAY_COLOR[0], factor),
            lerp(NIGHT_COLOR[1], DAY_COLOR[1], factor),
            lerp(NIGHT_COLOR[2], DAY_COLOR[2], factor),
        ]
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_full_period_returns_the_blend_to_its_start() {
        let mut cycle = DayNightCycle::new(60.0);
        let start = cycle.day_factor();
        for _ in 0..600 {
            cycle.advance(0.1);
        }
        assert!((cycle.day_factor() - start).abs() < 1.0e-3);
    }

    #[test]
    fn wrap_preserves_phase_overshoot() {
        let mut cycle = DayNightCycle::new(60.0);
        cycle.advance(60.5);
        assert!((cycle.elapsed() - 0.5).abs() < 1.0e-4);
    }

    #[test]
    fn day_factor_stays_in_unit_range() {
        let mut cycle = DayNightCycle::new(60.0);
        for _ in 0..1000 {
            cycle.advance(0.217);
            let factor = cycle.day_factor();
            assert!((0.0..=1.0).contains(&factor));
        }
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut cycle = DayNightCycle::new(60.0);
        cycle.advance(5.0);
        cycle.advance(-3.0);
        assert!((cycle.elapsed() - 5.0).abs() < 1.0e-6);
    }

    #[test]
    fn ambient_blends_between_night_and_day() {
        let cycle = DayNightCycle::new(60.0);
        // Phase zero sits exactly halfway through the blend.
        let ambient = cycle.ambient_color();
        for (channel, (night, day)) in ambient
            .iter()
            .zip(NIGHT_COLOR.iter().zip(DAY_COLOR.iter()))
        {
            assert!((channel - 0.5 * (night + day)).abs() < 1.0e-5);
        }
    }
}

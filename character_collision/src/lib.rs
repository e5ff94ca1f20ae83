//! Sphere collision resolver for candidate camera positions.
//!
//! Pure verdicts only: the resolver never moves anything. The orchestrator
//! commits or reverts based on the result.
#![forbid(unsafe_code)]

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

/// Static blocking sphere (tree trunk, rock formation).
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleSphere {
    pub id: String,
    pub center: Vector<Real>,
    pub radius: Real,
}

/// The playable area: candidates must stay inside this sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundarySphere {
    pub center: Vector<Real>,
    pub radius: Real,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MoveVerdict {
    Accept,
    /// Overlapped the named obstacle. Contact at exactly the sum of radii
    /// counts as overlap.
    RejectObstacle { id: String },
    /// Left the playable sphere. Touching the boundary exactly is allowed.
    RejectBoundary,
}

impl MoveVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, MoveVerdict::Accept)
    }
}

pub fn resolve(
    candidate: Vector<Real>,
    candidate_radius: Real,
    obstacles: &[ObstacleSphere],
    boundary: BoundarySphere,
) -> MoveVerdict {
    for obstacle in obstacles {
        let distance = (candidate - obstacle.center).norm();
        if distance <= obstacle.radius + candidate_radius {
            return MoveVerdict::RejectObstacle {
                id: obstacle.id.clone(),
            };
        }
    }

    let to_center = (candidate - boundary.center).norm();
    if to_center > boundary.radius - candidate_radius {
        return MoveVerdict::RejectBoundary;
    }

    MoveVerdict::Accept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(id: &str, x: Real, z: Real, radius: Real) -> ObstacleSphere {
        ObstacleSphere {
            id: id.to_string(),
            center: Vector::new(x, -20.0, z),
            radius,
        }
    }

    fn wide_boundary() -> BoundarySphere {
        BoundarySphere {
            center: Vector::zeros(),
            radius: 1_000.0,
        }
    }

    #[test]
    fn overlapping_candidate_is_rejected_with_the_obstacle_id() {
        let obstacles = vec![obstacle("tree_03", 10.0, 0.0, 20.0)];
        let verdict = resolve(
            Vector::new(0.0, -20.0, 0.0),
            2.0,
            &obstacles,
            wide_boundary(),
        );
        assert_eq!(
            verdict,
            MoveVerdict::RejectObstacle {
                id: "tree_03".to_string()
            }
        );
    }

    #[test]
    fn contact_at_exactly_the_radius_sum_counts_as_collision() {
        let obstacles = vec![obstacle("rock_00", 22.0, 0.0, 20.0)];
        let verdict = resolve(
            Vector::new(0.0, -20.0, 0.0),
            2.0,
            &obstacles,
            wide_boundary(),
        );
        assert!(!verdict.is_accept());
    }

    #[test]
    fn clear_candidate_inside_the_boundary_is_accepted() {
        let obstacles = vec![obstacle("tree_00", 100.0, 100.0, 20.0)];
        let verdict = resolve(
            Vector::new(0.0, -20.0, 0.0),
            2.0,
            &obstacles,
            wide_boundary(),
        );
        assert_eq!(verdict, MoveVerdict::Accept);
    }

    #[test]
    fn candidate_past_the_boundary_shell_is_rejected() {
        let boundary = BoundarySphere {
            center: Vector::zeros(),
            radius: 100.0,
        };
        let verdict = resolve(Vector::new(99.0, 0.0, 0.0), 2.0, &[], boundary);
        assert_eq!(verdict, MoveVerdict::RejectBoundary);
    }

    #[test]
    fn touching_the_boundary_shell_exactly_is_accepted() {
        let boundary = BoundarySphere {
            center: Vector::zeros(),
            radius: 100.0,
        };
        let verdict = resolve(Vector::new(98.0, 0.0, 0.0), 2.0, &[], boundary);
        assert_eq!(verdict, MoveVerdict::Accept);
    }

    #[test]
    fn every_obstacle_in_the_set_is_considered() {
        let obstacles = vec![
            obstacle("tree_00", 500.0, 0.0, 20.0),
            obstacle("rock_07", -5.0, 3.0, 40.0),
        ];
        let verdict = resolve(
            Vector::new(0.0, -20.0, 0.0),
            2.0,
            &obstacles,
            wide_boundary(),
        );
        assert_eq!(
            verdict,
            MoveVerdict::RejectObstacle {
                id: "rock_07".to_string()
            }
        );
    }
}

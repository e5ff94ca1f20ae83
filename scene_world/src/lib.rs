//! Island scene asset format, validation, and the built-in layout.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

const SCENE_VERSION: u32 = 1;
const DEFAULT_MAX_OBSTACLES: usize = 4_096;

pub const GROUND_LEVEL: f32 = -20.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneWorld {
    // Plain values first so the TOML writer never sees a value after a table.
    pub version: u32,
    pub name: String,
    pub ground_level: f32,
    pub player_spawn: [f32; 3],
    pub predator_spawn: [f32; 3],
    pub boundary: Boundary,
    pub anchors: Anchors,
    pub obstacles: Vec<Obstacle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub center: [f32; 3],
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    pub kind: ObstacleKind,
    pub position: [f32; 3],
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Tree,
    Rock,
}

/// World anchor with the proximity radius that triggers its quest gate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub position: [f32; 3],
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchors {
    pub survival_pack: Anchor,
    pub ghillie_suit: Anchor,
    pub hidden_map: Anchor,
    pub beacon_key: Anchor,
    pub beacon: Anchor,
    pub extraction: Anchor,
}

impl Anchors {
    pub fn all(&self) -> [(&'static str, Anchor); 6] {
        [
            ("survival_pack", self.survival_pack),
            ("ghillie_suit", self.ghillie_suit),
            ("hidden_map", self.hidden_map),
            ("beacon_key", self.beacon_key),
            ("beacon", self.beacon),
            ("extraction", self.extraction),
        ]
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SceneValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SceneValidationConfig {
    pub max_obstacles: usize,
}

impl Default for SceneValidationConfig {
    fn default() -> Self {
        Self {
            max_obstacles: DEFAULT_MAX_OBSTACLES,
        }
    }
}

impl SceneWorld {
    pub fn parse_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string(self).map_err(|err| err.to_string())
    }

    pub fn validate(&self, config: SceneValidationConfig) -> SceneValidation {
        let mut validation = SceneValidation::default();

        if self.version != SCENE_VERSION {
            validation
                .errors
                .push(format!("unsupported version {}", self.version));
        }

        if self.name.trim().is_empty() {
            validation.errors.push("name must not be empty".to_string());
        }

        if !self.ground_level.is_finite() {
            validation
                .errors
                .push("ground_level must be finite".to_string());
        }

        if !vector_is_finite(self.boundary.center) {
            validation
                .errors
                .push("boundary center must be finite".to_string());
        }
        if !self.boundary.radius.is_finite() || self.boundary.radius <= 0.0 {
            validation
                .errors
                .push("boundary radius must be finite and > 0".to_string());
        }

        if !self.contains(self.player_spawn) {
            validation
                .errors
                .push("player_spawn lies outside the boundary".to_string());
        }
        if !self.contains(self.predator_spawn) {
            validation
                .errors
                .push("predator_spawn lies outside the boundary".to_string());
        }

        if self.obstacles.is_empty() {
            validation
                .warnings
                .push("scene contains no obstacles".to_string());
        }
        if self.obstacles.len() > config.max_obstacles {
            validation.warnings.push(format!(
                "obstacle count {} exceeds limit {}",
                self.obstacles.len(),
                config.max_obstacles
            ));
        }

        let mut seen_ids = std::collections::BTreeSet::new();
        for obstacle in &self.obstacles {
            if obstacle.id.trim().is_empty() {
                validation
                    .errors
                    .push("obstacle id must not be empty".to_string());
            } else if !seen_ids.insert(obstacle.id.as_str()) {
                validation
                    .errors
                    .push(format!("duplicate obstacle id '{}'", obstacle.id));
            }
            if !vector_is_finite(obstacle.position) {
                validation
                    .errors
                    .push(format!("obstacle '{}' has non-finite position", obstacle.id));
            }
            if !obstacle.radius.is_finite() || obstacle.radius <= 0.0 {
                validation.errors.push(format!(
                    "obstacle '{}' radius must be finite and > 0",
                    obstacle.id
                ));
            }
            if !self.contains(obstacle.position) {
                validation.warnings.push(format!(
                    "obstacle '{}' lies outside the boundary",
                    obstacle.id
                ));
            }
        }

        for (name, anchor) in self.anchors.all() {
            if !vector_is_finite(anchor.position) {
                validation
                    .errors
                    .push(format!("anchor '{}' has non-finite position", name));
            }
            if !anchor.radius.is_finite() || anchor.radius <= 0.0 {
                validation
                    .errors
                    .push(format!("anchor '{}' radius must be finite and > 0", name));
            }
            if !self.contains(anchor.position) {
                validation
                    .warnings
                    .push(format!("anchor '{}' lies outside the boundary", name));
            }
        }

        validation
    }

    fn contains(&self, point: [f32; 3]) -> bool {
        let dx = point[0] - self.boundary.center[0];
        let dy = point[1] - self.boundary.center[1];
        let dz = point[2] - self.boundary.center[2];
        (dx * dx + dy * dy + dz * dz).sqrt() <= self.boundary.radius
    }
}

fn vector_is_finite(value: [f32; 3]) -> bool {
    value.iter().all(|component| component.is_finite())
}

const TREE_RADIUS: f32 = 20.0;
const ROCK_RADIUS: f32 = 40.0;

const TREE_POSITIONS: [[f32; 3]; 20] = [
    [95.0, GROUND_LEVEL, 250.0],
    [-80.0, GROUND_LEVEL, -100.0],
    [140.0, GROUND_LEVEL, 320.0],
    [-320.0, GROUND_LEVEL, -180.0],
    [-140.0, GROUND_LEVEL, -240.0],
    [220.0, GROUND_LEVEL, 70.0],
    [170.0, GROUND_LEVEL, -120.0],
    [40.0, GROUND_LEVEL, 95.0],
    [-220.0, GROUND_LEVEL, -110.0],
    [200.0, GROUND_LEVEL, 240.0],
    [-50.0, GROUND_LEVEL, 260.0],
    [10.0, GROUND_LEVEL, 270.0],
    [-100.0, GROUND_LEVEL, -60.0],
    [60.0, GROUND_LEVEL, 150.0],
    [-60.0, GROUND_LEVEL, 50.0],
    [30.0, GROUND_LEVEL, -30.0],
    [200.0, GROUND_LEVEL, -200.0],
    [-200.0, GROUND_LEVEL, 200.0],
    [-250.0, GROUND_LEVEL, 50.0],
    [250.0, GROUND_LEVEL, -50.0],
];

const ROCK_POSITIONS: [[f32; 3]; 12] = [
    [60.0, GROUND_LEVEL, 235.0],
    [-70.0, GROUND_LEVEL, -85.0],
    [255.0, GROUND_LEVEL, -315.0],
    [-285.0, GROUND_LEVEL, -170.0],
    [-110.0, GROUND_LEVEL, -230.0],
    [-110.0, GROUND_LEVEL, 140.0],
    [235.0, GROUND_LEVEL, -145.0],
    [75.0, GROUND_LEVEL, 85.0],
    [-310.0, GROUND_LEVEL, -100.0],
    [-175.0, GROUND_LEVEL, 235.0],
    [-125.0, GROUND_LEVEL, 275.0],
    [-60.0, GROUND_LEVEL, 260.0],
];

/// The fixed island layout the game ships with.
pub fn island_scene() -> SceneWorld {
    let mut obstacles = Vec::with_capacity(TREE_POSITIONS.len() + ROCK_POSITIONS.len());
    for (index, position) in TREE_POSITIONS.iter().enumerate() {
        obstacles.push(Obstacle {
            id: format!("tree_{:02}", index),
            kind: ObstacleKind::Tree,
            position: *position,
            radius: TREE_RADIUS,
        });
    }
    for (index, position) in ROCK_POSITIONS.iter().enumerate() {
        obstacles.push(Obstacle {
            id: format!("rock_{:02}", index),
            kind: ObstacleKind::Rock,
            position: *position,
            radius: ROCK_RADIUS,
        });
    }

    SceneWorld {
        version: SCENE_VERSION,
        name: "island".to_string(),
        ground_level: GROUND_LEVEL,
        player_spawn: [0.0, GROUND_LEVEL + 14.0, 0.0],
        predator_spawn: [200.0, GROUND_LEVEL, 200.0],
        boundary: Boundary {
            center: [-40.0, -10.0, 40.0],
            radius: 360.0,
        },
        anchors: Anchors {
            survival_pack: Anchor {
                position: [200.0, -13.0, 242.0],
                radius: 20.0,
            },
            ghillie_suit: Anchor {
                position: [-280.0, GROUND_LEVEL, -200.0],
                radius: 20.0,
            },
            hidden_map: Anchor {
                position: [250.0, GROUND_LEVEL, 200.0],
                radius: 20.0,
            },
            beacon_key: Anchor {
                position: [-220.0, -10.0, 160.0],
                radius: 10.0,
            },
            beacon: Anchor {
                position: [-260.0, GROUND_LEVEL, 170.0],
                radius: 70.0,
            },
            extraction: Anchor {
                position: [150.0, 0.0, -150.0],
                radius: 70.0,
            },
        },
        obstacles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn island_scene_validates_cleanly() {
        let scene = island_scene();
        let validation = scene.validate(SceneValidationConfig::default());
        assert!(validation.is_ok(), "errors: {:?}", validation.errors);
        assert_eq!(scene.obstacles.len(), 32);
    }

    #[test]
    fn version_gate_rejects_future_documents() {
        let mut scene = island_scene();
        scene.version = 2;
        let validation = scene.validate(SceneValidationConfig::default());
        assert!(!validation.is_ok());
    }

    #[test]
    fn spawn_outside_boundary_is_an_error() {
        let mut scene = island_scene();
        scene.player_spawn = [10_000.0, 0.0, 0.0];
        let validation = scene.validate(SceneValidationConfig::default());
        assert!(validation
            .errors
            .iter()
            .any(|error| error.contains("player_spawn")));
    }

    #[test]
    fn duplicate_obstacle_ids_are_caught() {
        let mut scene = island_scene();
        let duplicate = scene.obstacles[0].clone();
        scene.obstacles.push(duplicate);
        let validation = scene.validate(SceneValidationConfig::default());
        assert!(validation
            .errors
            .iter()
            .any(|error| error.contains("duplicate")));
    }

    #[test]
    fn toml_round_trip_preserves_the_scene() {
        let scene = island_scene();
        let text = scene.to_toml().expect("serialize");
        let parsed = SceneWorld::parse_toml(&text).expect("parse");
        assert_eq!(parsed, scene);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(SceneWorld::parse_toml("version = \"not a number\"").is_err());
    }
}

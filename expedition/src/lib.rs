//! Simulation context and per-tick orchestration.
//!
//! One `Simulation` owns every mutable piece of game state; the shell feeds
//! it input and a frame delta, and reads back a snapshot. The tick order is
//! a contract: collision resolves against the post-move, pre-commit camera
//! position so a rejection is a full revert, quest triggers only ever see a
//! committed position, and the predator observes a suppression latch in the
//! same tick the latch is set.
#![forbid(unsafe_code)]

use character_collision::{BoundarySphere, ObstacleSphere};
use meteor_pool::{Meteor, MeteorPool, SpawnConfig};
use player_camera::{CameraConfig, PlayerCamera};
use predator_motor::{PredatorConfig, PredatorMotor, PredatorPose};
use quest_chain::{EventSink, QuestChain, QuestConfig, Trigger};
use rand::Rng;
use rapier3d::math::Vector;
use rapier3d::prelude::Real;
use scene_world::SceneWorld;
use sky_cycle::DayNightCycle;

const MAX_FRAME_DT: Real = 0.1;

#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    pub walk_speed: Real,
    pub sprint_multiplier: Real,
    pub jump_velocity: Real,
    pub camera_radius: Real,
    /// Degrees of rotation per unit of cursor delta.
    pub look_sensitivity: Real,
    pub meteor_spawn_period: Real,
    pub day_night_period: f32,
    pub camera: CameraConfig,
    pub predator: PredatorConfig,
    pub meteors: SpawnConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            walk_speed: 30.0,
            sprint_multiplier: 5.0,
            jump_velocity: 25.0,
            camera_radius: 2.0,
            look_sensitivity: 0.1,
            meteor_spawn_period: 3.0,
            day_night_period: 60.0,
            camera: CameraConfig::default(),
            predator: PredatorConfig::default(),
            meteors: SpawnConfig::default(),
        }
    }
}

/// Sampled input for one tick: held keys plus the cursor delta since the
/// previous sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub jump: bool,
    pub confirm: bool,
    pub look_delta: [Real; 2],
}

#[derive(Clone, Copy, Debug)]
pub struct FrameSnapshot {
    pub camera_position: Vector<Real>,
    pub view_matrix: [[f32; 4]; 4],
    pub predator: PredatorPose,
    pub sun_position: [f32; 3],
    pub ambient_color: [f32; 3],
    pub day_factor: f32,
    /// End-of-session fade: the shell blacks out the frame.
    pub fade: bool,
    /// True exactly once, on the tick the escape fires.
    pub quit_requested: bool,
}

pub struct Simulation {
    config: SimulationConfig,
    camera: PlayerCamera,
    predator: PredatorMotor,
    cycle: DayNightCycle,
    meteors: MeteorPool,
    quest: QuestChain,
    obstacles: Vec<ObstacleSphere>,
    boundary: BoundarySphere,
    meteor_spawn_accumulator: Real,
    escaped: bool,
    quit_emitted: bool,
}

impl Simulation {
    pub fn new(scene: &SceneWorld, config: SimulationConfig) -> Self {
        let obstacles = scene
            .obstacles
            .iter()
            .map(|obstacle| ObstacleSphere {
                id: obstacle.id.clone(),
                center: to_vector(obstacle.position),
                radius: obstacle.radius,
            })
            .collect();
        let boundary = BoundarySphere {
            center: to_vector(scene.boundary.center),
            radius: scene.boundary.radius,
        };
        let quest = QuestChain::new(QuestConfig {
            survival_pack: to_trigger(scene.anchors.survival_pack),
            ghillie_suit: to_trigger(scene.anchors.ghillie_suit),
            hidden_map: to_trigger(scene.anchors.hidden_map),
            beacon_key: to_trigger(scene.anchors.beacon_key),
            beacon: to_trigger(scene.anchors.beacon),
            extraction: to_trigger(scene.anchors.extraction),
        });

        Self {
            config,
            camera: PlayerCamera::new(config.camera, to_vector(scene.player_spawn)),
            predator: PredatorMotor::new(config.predator, to_vector(scene.predator_spawn)),
            cycle: DayNightCycle::new(config.day_night_period),
            meteors: MeteorPool::new(config.meteors),
            quest,
            obstacles,
            boundary,
            meteor_spawn_accumulator: 0.0,
            escaped: false,
            quit_emitted: false,
        }
    }

    pub fn camera(&self) -> &PlayerCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PlayerCamera {
        &mut self.camera
    }

    pub fn predator(&self) -> &PredatorMotor {
        &self.predator
    }

    pub fn quest(&self) -> &QuestChain {
        &self.quest
    }

    pub fn cycle(&self) -> &DayNightCycle {
        &self.cycle
    }

    pub fn active_meteors(&self) -> impl Iterator<Item = &Meteor> {
        self.meteors.iter_active()
    }

    pub fn meteor_pool(&self) -> &MeteorPool {
        &self.meteors
    }

    pub fn escaped(&self) -> bool {
        self.escaped
    }

    pub fn tick<R: Rng>(
        &mut self,
        input: FrameInput,
        dt: Real,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> FrameSnapshot {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        if self.escaped {
            return self.snapshot(true, false);
        }

        // Camera: motion, look, jump. The pre-tick position is the revert
        // target if the move is rejected.
        let pre_tick_position = self.camera.position();
        let mut step = self.config.walk_speed * dt;
        if input.sprint {
            step *= self.config.sprint_multiplier;
        }
        if input.forward {
            self.camera.move_forward(step);
        }
        if input.back {
            self.camera.move_back(step);
        }
        if input.left {
            self.camera.move_left(step);
        }
        if input.right {
            self.camera.move_right(step);
        }
        let [look_x, look_y] = input.look_delta;
        if look_x != 0.0 || look_y != 0.0 {
            let sensitivity = self.config.look_sensitivity;
            self.camera
                .rotate(look_x * sensitivity, -look_y * sensitivity);
        }
        if input.jump {
            self.camera.start_jump(self.config.jump_velocity);
        }
        self.camera.advance_jump(dt);

        // Collision sees the post-move, pre-commit position.
        let verdict = character_collision::resolve(
            self.camera.position(),
            self.config.camera_radius,
            &self.obstacles,
            self.boundary,
        );
        if !verdict.is_accept() {
            self.camera.set_position(pre_tick_position);
        }

        // Quest triggers read the committed position. Evaluating before the
        // predator step lets the suppression latch land in the same tick.
        let effects = self.quest.tick(self.camera.position(), input.confirm, sink);
        if effects.stealth_acquired {
            self.predator.suppress();
        }

        self.predator.step(self.camera.position(), dt);

        self.cycle.advance(dt);

        self.meteor_spawn_accumulator += dt;
        while self.meteor_spawn_accumulator >= self.config.meteor_spawn_period {
            self.meteor_spawn_accumulator -= self.config.meteor_spawn_period;
            self.meteors.spawn(rng);
        }
        self.meteors.advance(dt);

        if effects.escaped {
            self.escaped = true;
            let quit = !self.quit_emitted;
            self.quit_emitted = true;
            return self.snapshot(true, quit);
        }

        self.snapshot(false, false)
    }

    fn snapshot(&self, fade: bool, quit_requested: bool) -> FrameSnapshot {
        FrameSnapshot {
            camera_position: self.camera.position(),
            view_matrix: self.camera.view_matrix(),
            predator: self.predator.pose(),
            sun_position: self.cycle.sun_position(),
            ambient_color: self.cycle.ambient_color(),
            day_factor: self.cycle.day_factor(),
            fade,
            quit_requested,
        }
    }
}

fn to_vector(value: [f32; 3]) -> Vector<Real> {
    Vector::new(value[0], value[1], value[2])
}

fn to_trigger(anchor: scene_world::Anchor) -> Trigger {
    Trigger {
        position: to_vector(anchor.position),
        radius: anchor.radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_chain::{NullSink, QuestEvent, QuestProp};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use scene_world::{island_scene, Anchor, Boundary, Obstacle, ObstacleKind};

    struct RecordingSink {
        events: Vec<QuestEvent>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { events: Vec::new() }
        }
    }

    impl EventSink for RecordingSink {
        fn notify(&mut self, event: QuestEvent) {
            self.events.push(event);
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn island_sim() -> Simulation {
        Simulation::new(&island_scene(), SimulationConfig::default())
    }

    fn teleport(sim: &mut Simulation, position: [f32; 3]) {
        sim.camera_mut().set_position(to_vector(position));
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn confirm() -> FrameInput {
        FrameInput {
            confirm: true,
            ..FrameInput::default()
        }
    }

    #[test]
    fn forward_motion_covers_walk_speed_times_dt() {
        let mut sim = island_sim();
        let start = sim.camera().position();
        sim.tick(
            FrameInput {
                forward: true,
                ..FrameInput::default()
            },
            0.1,
            &mut rng(),
            &mut NullSink,
        );
        let moved = (sim.camera().position() - start).norm();
        assert!((moved - 3.0).abs() < 1.0e-3);
    }

    #[test]
    fn sprint_scales_the_step() {
        let mut sim = island_sim();
        let start = sim.camera().position();
        sim.tick(
            FrameInput {
                forward: true,
                sprint: true,
                ..FrameInput::default()
            },
            0.1,
            &mut rng(),
            &mut NullSink,
        );
        let moved = (sim.camera().position() - start).norm();
        assert!((moved - 15.0).abs() < 1.0e-3);
    }

    #[test]
    fn rejected_move_restores_the_pre_tick_position() {
        let mut sim = island_sim();
        // Two units outside the contact shell of tree_15 at (30, -20, -30),
        // facing it head on.
        teleport(&mut sim, [30.0, -6.0, -30.0 + 24.0]);
        let before = sim.camera().position();
        sim.tick(
            FrameInput {
                forward: true,
                sprint: true,
                ..FrameInput::default()
            },
            0.1,
            &mut rng(),
            &mut NullSink,
        );
        // Default yaw looks toward -Z, straight at the trunk.
        assert_eq!(sim.camera().position(), before);
    }

    #[test]
    fn rejected_move_cannot_fire_a_quest_trigger() {
        let scene = SceneWorld {
            version: 1,
            name: "ring".to_string(),
            ground_level: -20.0,
            player_spawn: [0.0, -6.0, 14.0],
            predator_spawn: [0.0, -20.0, 300.0],
            boundary: Boundary {
                center: [0.0, -10.0, 0.0],
                radius: 360.0,
            },
            anchors: {
                let far = Anchor {
                    position: [300.0, -20.0, 300.0],
                    radius: 5.0,
                };
                scene_world::Anchors {
                    survival_pack: Anchor {
                        position: [0.0, -6.0, 0.0],
                        radius: 5.0,
                    },
                    ghillie_suit: far,
                    hidden_map: far,
                    beacon_key: far,
                    beacon: far,
                    extraction: far,
                }
            },
            obstacles: vec![Obstacle {
                id: "guard".to_string(),
                kind: ObstacleKind::Rock,
                position: [0.0, -6.0, 0.0],
                radius: 10.0,
            }],
        };
        let mut sim = Simulation::new(&scene, SimulationConfig::default());
        // Default yaw faces -Z: moving forward heads for the anchor but the
        // candidate lands inside the guard sphere and must be reverted
        // before quest evaluation.
        sim.tick(
            FrameInput {
                forward: true,
                ..FrameInput::default()
            },
            0.1,
            &mut rng(),
            &mut NullSink,
        );
        assert!(!sim.quest().objectives()[0].completed);
        assert_eq!(sim.camera().position().z, 14.0);
    }

    #[test]
    fn stealth_latch_stops_the_predator_in_the_same_tick() {
        let mut sim = island_sim();
        let mut sink = RecordingSink::new();

        teleport(&mut sim, [200.0, -13.0, 242.0]);
        sim.tick(idle(), 0.016, &mut rng(), &mut sink);
        assert!(sim.quest().objectives()[0].completed);
        assert!(!sim.predator().is_suppressed());

        let predator_before = sim.predator().pose().position;
        teleport(&mut sim, [-280.0, -20.0, -200.0]);
        sim.tick(idle(), 0.016, &mut rng(), &mut sink);
        assert!(sim.predator().is_suppressed());
        let predator_after = sim.predator().pose().position;
        assert_eq!(predator_before.x, predator_after.x);
        assert_eq!(predator_before.z, predator_after.z);

        // The latch holds even after the player moves far away.
        teleport(&mut sim, [0.0, -6.0, 0.0]);
        for _ in 0..60 {
            sim.tick(idle(), 0.016, &mut rng(), &mut sink);
        }
        assert_eq!(sim.predator().pose().position.x, predator_after.x);
    }

    #[test]
    fn predator_closes_in_on_the_player() {
        let mut sim = island_sim();
        let player = sim.camera().position();
        let start_gap = (sim.predator().pose().position - player).norm();
        for _ in 0..30 {
            sim.tick(idle(), 0.1, &mut rng(), &mut NullSink);
        }
        let end_gap = (sim.predator().pose().position - sim.camera().position()).norm();
        assert!(end_gap < start_gap);
    }

    #[test]
    fn beacon_needs_key_and_confirm_at_the_anchor() {
        let mut sim = island_sim();
        let mut sink = RecordingSink::new();
        teleport(&mut sim, [200.0, -13.0, 242.0]);
        sim.tick(idle(), 0.016, &mut rng(), &mut sink);
        teleport(&mut sim, [-280.0, -20.0, -200.0]);
        sim.tick(idle(), 0.016, &mut rng(), &mut sink);
        teleport(&mut sim, [250.0, -20.0, 200.0]);
        sim.tick(idle(), 0.016, &mut rng(), &mut sink);

        // Confirm at the beacon without the key: nothing.
        teleport(&mut sim, [-260.0, -20.0, 170.0]);
        sim.tick(confirm(), 0.016, &mut rng(), &mut sink);
        assert!(!sim.quest().beacon_activated());

        teleport(&mut sim, [-220.0, -10.0, 160.0]);
        sim.tick(idle(), 0.016, &mut rng(), &mut sink);
        assert!(sim.quest().key_collected());

        teleport(&mut sim, [-260.0, -20.0, 170.0]);
        sim.tick(confirm(), 0.016, &mut rng(), &mut sink);
        assert!(sim.quest().beacon_activated());
        assert!(sim.quest().is_prop_visible(QuestProp::Helicopter));
    }

    #[test]
    fn escape_fades_and_emits_quit_exactly_once() {
        let mut sim = island_sim();
        let mut sink = RecordingSink::new();
        for anchor in [
            [200.0, -13.0, 242.0],
            [-280.0, -20.0, -200.0],
            [250.0, -20.0, 200.0],
            [-220.0, -10.0, 160.0],
        ] {
            teleport(&mut sim, anchor);
            sim.tick(idle(), 0.016, &mut rng(), &mut sink);
        }
        teleport(&mut sim, [-260.0, -20.0, 170.0]);
        sim.tick(confirm(), 0.016, &mut rng(), &mut sink);

        teleport(&mut sim, [150.0, 0.0, -150.0]);
        let snapshot = sim.tick(confirm(), 0.016, &mut rng(), &mut sink);
        assert!(snapshot.fade);
        assert!(snapshot.quit_requested);
        assert!(sim.escaped());

        for _ in 0..5 {
            let snapshot = sim.tick(confirm(), 0.016, &mut rng(), &mut sink);
            assert!(snapshot.fade);
            assert!(!snapshot.quit_requested);
        }
        let escapes = sink
            .events
            .iter()
            .filter(|event| **event == QuestEvent::Escaped)
            .count();
        assert_eq!(escapes, 1);
    }

    #[test]
    fn meteors_spawn_on_the_three_second_cadence() {
        // Slow the fall so the first meteor cannot retire (and donate its
        // slot) before the second spawn lands.
        let mut config = SimulationConfig::default();
        config.meteors.fall_speed_min = 1.0;
        config.meteors.fall_speed_max = 2.0;
        let mut sim = Simulation::new(&island_scene(), config);
        let mut rng = rng();
        for _ in 0..29 {
            sim.tick(idle(), 0.1, &mut rng, &mut NullSink);
        }
        assert_eq!(sim.meteor_pool().slot_len(), 0);
        sim.tick(idle(), 0.1, &mut rng, &mut NullSink);
        assert_eq!(sim.meteor_pool().slot_len(), 1);
        for _ in 0..30 {
            sim.tick(idle(), 0.1, &mut rng, &mut NullSink);
        }
        assert_eq!(sim.meteor_pool().slot_len(), 2);
        assert_eq!(sim.active_meteors().count(), 2);
    }

    #[test]
    fn negative_dt_is_inert() {
        let mut sim = island_sim();
        let before = sim.camera().position();
        let elapsed = sim.cycle().elapsed();
        sim.tick(
            FrameInput {
                forward: true,
                ..FrameInput::default()
            },
            -0.5,
            &mut rng(),
            &mut NullSink,
        );
        assert_eq!(sim.camera().position(), before);
        assert_eq!(sim.cycle().elapsed(), elapsed);
    }
}

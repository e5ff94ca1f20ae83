use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use engine_core::logging;
use expedition::{FrameInput, FrameSnapshot, Simulation, SimulationConfig};
use platform_winit::{
    create_window, grab_cursor, ControlFlow, DeviceEvent, ElementState, Event, HeldKeys, KeyCode,
    MouseButton, MouseLook, PhysicalKey, Window, WindowEvent,
};
use quest_chain::{EventSink, QuestEvent, QuestProp};
use rand::rngs::StdRng;
use rand::SeedableRng;
use render_wgpu::{LightParams, MeshError, MeshId, Renderer};
use scene_world::{island_scene, ObstacleKind, SceneValidationConfig, SceneWorld};
use settings::Settings;

mod props;
mod settings;

const EXIT_USAGE: i32 = 2;
const EXIT_SCENE: i32 = 10;
const EXIT_WINDOW: i32 = 11;
const EXIT_RENDERER: i32 = 12;

const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 10_000.0;
const SKY_RADIUS: f32 = 4_000.0;
const WALL_HEIGHT: f32 = 30.0;

const OPENGL_TO_WGPU: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5, 1.0],
];

struct CliArgs {
    scene: Option<PathBuf>,
    headless_ticks: Option<u64>,
    seed: Option<u64>,
}

enum ArgParseError {
    Help,
    Message(String),
}

struct ExitError {
    code: i32,
    message: String,
}

impl ExitError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Logs quest transitions and remembers that the displayed objective needs
/// re-announcing.
#[derive(Default)]
struct ShellSink {
    dirty: bool,
}

impl ShellSink {
    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl EventSink for ShellSink {
    fn notify(&mut self, event: QuestEvent) {
        self.dirty = true;
        let message = match event {
            QuestEvent::ObjectiveCompleted { index } => match index {
                0 => "You found the survival pack!",
                1 => "You found the ghillie suit! The predator loses your scent.",
                2 => "You found the hidden map!",
                3 => "You activated the beacon! Help is on the way!",
                _ => "Good job, you escaped!",
            },
            QuestEvent::KeyCollected => "You picked up the key.",
            // Covered by the paired objective message.
            QuestEvent::BeaconActivated | QuestEvent::Escaped => return,
        };
        logging::info("quest", message);
    }
}

fn announce_objective(sim: &Simulation) {
    if let Some(objective) = sim.quest().current_objective() {
        logging::info("quest", format!("Story: {}", objective.story));
        logging::info("quest", format!("Objective: {}", objective.objective));
    }
}

struct PropSet {
    sky: MeshId,
    ground: MeshId,
    wall: MeshId,
    trunk: MeshId,
    crown: MeshId,
    rock: MeshId,
    predator: MeshId,
    sun: MeshId,
    meteor: MeshId,
    backpack: MeshId,
    ghillie: MeshId,
    map: MeshId,
    key: MeshId,
    beacon: MeshId,
    helicopter: MeshId,
}

fn upload_props(renderer: &mut Renderer<'_>) -> Result<PropSet, MeshError> {
    Ok(PropSet {
        sky: renderer.upload_mesh(&props::sky_dome(
            SKY_RADIUS,
            12,
            24,
            [0.75, 0.85, 1.0],
            [0.25, 0.45, 0.95],
        ))?,
        ground: renderer.upload_mesh(&props::ground(800.0, [0.25, 0.55, 0.2]))?,
        wall: renderer.upload_mesh(&props::wall_ring(48, [0.45, 0.42, 0.38]))?,
        trunk: renderer.upload_mesh(&props::cylinder(2.5, 26.0, 10, [0.45, 0.3, 0.15]))?,
        crown: renderer.upload_mesh(&props::cone(11.0, 22.0, 10, [0.15, 0.45, 0.18]))?,
        rock: renderer.upload_mesh(&props::sphere(1.0, 8, 12, [0.5, 0.5, 0.52]))?,
        predator: renderer.upload_mesh(&props::cuboid([0.5, 0.5, 0.5], [0.2, 0.35, 0.15]))?,
        sun: renderer.upload_mesh(&props::sphere(1.0, 10, 16, [1.0, 0.95, 0.7]))?,
        meteor: renderer.upload_mesh(&props::sphere(1.0, 6, 8, [0.9, 0.45, 0.1]))?,
        backpack: renderer.upload_mesh(&props::cuboid([2.0, 2.5, 1.2], [0.55, 0.3, 0.1]))?,
        ghillie: renderer.upload_mesh(&props::cuboid([1.5, 3.0, 1.5], [0.35, 0.4, 0.2]))?,
        map: renderer.upload_mesh(&props::cuboid([2.0, 0.4, 1.5], [0.8, 0.7, 0.5]))?,
        key: renderer.upload_mesh(&props::cuboid([3.0, 1.0, 0.6], [0.85, 0.7, 0.2]))?,
        beacon: renderer.upload_mesh(&props::cylinder(2.0, 16.0, 10, [0.8, 0.15, 0.1]))?,
        helicopter: renderer.upload_mesh(&props::cuboid([10.0, 5.0, 16.0], [0.55, 0.55, 0.6]))?,
    })
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(ArgParseError::Help) => {
            print_usage();
            return;
        }
        Err(ArgParseError::Message(message)) => {
            eprintln!("{}", message);
            print_usage();
            std::process::exit(EXIT_USAGE);
        }
    };

    let scene = match load_scene(&args) {
        Ok(scene) => scene,
        Err(err) => {
            logging::error("scene", &err.message);
            std::process::exit(err.code);
        }
    };

    let settings = Settings::load();
    let mut sim_config = SimulationConfig::default();
    sim_config.look_sensitivity = settings.mouse_sensitivity;
    sim_config.camera.ground_level = scene.ground_level;
    sim_config.predator.ground_level = scene.ground_level;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sim = Simulation::new(&scene, sim_config);

    if let Some(ticks) = args.headless_ticks {
        run_headless(sim, ticks, rng);
        return;
    }

    run_windowed(sim, scene, settings, rng);
}

fn run_headless(mut sim: Simulation, ticks: u64, mut rng: StdRng) {
    let mut sink = ShellSink::default();
    announce_objective(&sim);

    let dt = 1.0 / 60.0;
    let mut simulated = 0u64;
    for _ in 0..ticks {
        let snapshot = sim.tick(FrameInput::default(), dt, &mut rng, &mut sink);
        simulated += 1;
        if sink.take_dirty() {
            announce_objective(&sim);
        }
        if snapshot.quit_requested {
            break;
        }
    }

    let player = sim.camera().position();
    let predator = sim.predator().pose().position;
    let gap = (player - predator).norm();
    println!(
        "headless run: {} ticks, predator {:.1} units away, {} meteors active, {} of {} objectives complete",
        simulated,
        gap,
        sim.active_meteors().count(),
        sim.quest()
            .objectives()
            .iter()
            .filter(|objective| objective.completed)
            .count(),
        sim.quest().objectives().len(),
    );
}

fn run_windowed(mut sim: Simulation, scene: SceneWorld, settings: Settings, mut rng: StdRng) {
    let (event_loop, window) = match create_window(
        "Castaway",
        settings.resolution[0],
        settings.resolution[1],
    ) {
        Ok(result) => result,
        Err(err) => {
            logging::error("shell", format!("window init failed: {}", err));
            std::process::exit(EXIT_WINDOW);
        }
    };
    let window: &'static Window = Box::leak(Box::new(window));

    let mut renderer = match Renderer::new(window, settings.vsync) {
        Ok(renderer) => renderer,
        Err(err) => {
            logging::error("shell", format!("renderer init failed: {}", err));
            std::process::exit(EXIT_RENDERER);
        }
    };
    let prop_set = match upload_props(&mut renderer) {
        Ok(props) => props,
        Err(err) => {
            logging::error("shell", format!("mesh upload failed: {}", err));
            std::process::exit(EXIT_RENDERER);
        }
    };

    let mut sink = ShellSink::default();
    announce_objective(&sim);

    let mut keys = HeldKeys::default();
    let mut look = MouseLook::default();
    let mut mouse_grabbed = grab_cursor(window, true);
    let mut last_frame = Instant::now();

    if let Err(err) = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => renderer.resize(size),
                WindowEvent::Focused(false) => {
                    keys.clear();
                    mouse_grabbed = grab_cursor(window, false);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let pressed = event.state == ElementState::Pressed;
                    if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                        if pressed {
                            elwt.exit();
                        }
                    } else {
                        keys.apply(event.physical_key, pressed);
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if state == ElementState::Pressed
                        && button == MouseButton::Left
                        && !mouse_grabbed
                    {
                        mouse_grabbed = grab_cursor(window, true);
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = (now - last_frame).as_secs_f32().min(0.1);
                    last_frame = now;

                    let mut look_delta = look.take();
                    if !mouse_grabbed {
                        look_delta = [0.0, 0.0];
                    }
                    if settings.invert_y {
                        look_delta[1] = -look_delta[1];
                    }

                    let input = FrameInput {
                        forward: keys.forward,
                        back: keys.back,
                        left: keys.left,
                        right: keys.right,
                        sprint: keys.sprint,
                        jump: keys.jump,
                        confirm: keys.confirm,
                        look_delta,
                    };
                    let snapshot = sim.tick(input, dt, &mut rng, &mut sink);
                    if sink.take_dirty() {
                        announce_objective(&sim);
                    }
                    if snapshot.quit_requested {
                        logging::info("shell", "extraction complete, ending session");
                        elwt.exit();
                    }

                    draw_frame(
                        &mut renderer,
                        &sim,
                        &scene,
                        &prop_set,
                        &snapshot,
                        settings.fov_deg,
                    );
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                if mouse_grabbed {
                    look.accumulate(delta);
                }
            }
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        }
    }) {
        logging::error("shell", format!("event loop failed: {}", err));
    }
}

fn draw_frame(
    renderer: &mut Renderer<'_>,
    sim: &Simulation,
    scene: &SceneWorld,
    prop_set: &PropSet,
    snapshot: &FrameSnapshot,
    fov_deg: f32,
) {
    if snapshot.fade {
        renderer.set_clear_color(0.0, 0.0, 0.0);
        let light = LightParams {
            sun_position: snapshot.sun_position,
            light_color: [0.0, 0.0, 0.0],
            view_position: [0.0, 0.0, 0.0],
            ambient: [0.0, 0.0, 0.0],
        };
        renderer.begin_frame(OPENGL_TO_WGPU, light);
        if let Err(err) = renderer.render() {
            logging::warn("render", format!("{}", err));
        }
        return;
    }

    let ambient = snapshot.ambient_color;
    renderer.set_clear_color(ambient[0] as f64, ambient[1] as f64, ambient[2] as f64);

    let camera_position = snapshot.camera_position;
    let projection = perspective(fov_deg.to_radians(), renderer.aspect_ratio());
    let view_proj = mat4_mul(mat4_mul(OPENGL_TO_WGPU, projection), snapshot.view_matrix);
    let light = LightParams {
        sun_position: snapshot.sun_position,
        light_color: [1.0, 1.0, 1.0],
        view_position: [camera_position.x, camera_position.y, camera_position.z],
        ambient,
    };
    renderer.begin_frame(view_proj, light);

    renderer.draw_sky(
        prop_set.sky,
        translate([camera_position.x, camera_position.y, camera_position.z]),
    );

    renderer.draw(prop_set.ground, translate([0.0, scene.ground_level, 0.0]));
    renderer.draw(
        prop_set.wall,
        mat4_mul(
            translate(scene.boundary.center),
            scale([scene.boundary.radius, WALL_HEIGHT, scene.boundary.radius]),
        ),
    );

    for obstacle in &scene.obstacles {
        match obstacle.kind {
            ObstacleKind::Tree => {
                renderer.draw(prop_set.trunk, translate(obstacle.position));
                let mut crown_base = obstacle.position;
                crown_base[1] += 14.0;
                renderer.draw(prop_set.crown, translate(crown_base));
            }
            ObstacleKind::Rock => {
                let r = obstacle.radius;
                renderer.draw(
                    prop_set.rock,
                    mat4_mul(
                        translate(obstacle.position),
                        scale([r * 0.6, r * 0.3, r * 0.6]),
                    ),
                );
            }
        }
    }

    let predator = snapshot.predator;
    renderer.draw(
        prop_set.predator,
        mat4_mul(
            mat4_mul(
                translate([
                    predator.position.x,
                    predator.position.y + 9.0,
                    predator.position.z,
                ]),
                rotate_y(predator.facing),
            ),
            scale([6.0, 18.0, 14.0]),
        ),
    );

    renderer.draw(
        prop_set.sun,
        mat4_mul(translate(snapshot.sun_position), scale([12.0, 12.0, 12.0])),
    );

    for meteor in sim.active_meteors() {
        renderer.draw(
            prop_set.meteor,
            mat4_mul(
                translate([meteor.position.x, meteor.position.y, meteor.position.z]),
                scale([meteor.scale, meteor.scale, meteor.scale]),
            ),
        );
    }

    let quest = sim.quest();
    let anchors = &scene.anchors;
    if quest.is_prop_visible(QuestProp::SurvivalPack) {
        renderer.draw(prop_set.backpack, translate(anchors.survival_pack.position));
    }
    if quest.is_prop_visible(QuestProp::GhillieSuit) {
        renderer.draw(prop_set.ghillie, translate(anchors.ghillie_suit.position));
    }
    if quest.is_prop_visible(QuestProp::HiddenMap) {
        renderer.draw(prop_set.map, translate(anchors.hidden_map.position));
    }
    if quest.is_prop_visible(QuestProp::BeaconKey) {
        renderer.draw(prop_set.key, translate(anchors.beacon_key.position));
    }
    if quest.is_prop_visible(QuestProp::Beacon) {
        renderer.draw(prop_set.beacon, translate(anchors.beacon.position));
    }
    if quest.is_prop_visible(QuestProp::Helicopter) {
        renderer.draw(prop_set.helicopter, translate(anchors.extraction.position));
    }

    if let Err(err) = renderer.render() {
        logging::warn("render", format!("{}", err));
    }
}

fn load_scene(args: &CliArgs) -> Result<SceneWorld, ExitError> {
    let scene = match &args.scene {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|err| {
                ExitError::new(EXIT_SCENE, format!("cannot read {}: {}", path.display(), err))
            })?;
            SceneWorld::parse_toml(&text).map_err(|err| {
                ExitError::new(EXIT_SCENE, format!("invalid scene {}: {}", path.display(), err))
            })?
        }
        None => island_scene(),
    };

    let validation = scene.validate(SceneValidationConfig::default());
    for warning in &validation.warnings {
        logging::warn("scene", warning);
    }
    if !validation.is_ok() {
        for error in &validation.errors {
            logging::error("scene", error);
        }
        return Err(ExitError::new(EXIT_SCENE, "scene validation failed"));
    }
    Ok(scene)
}

fn parse_args() -> Result<CliArgs, ArgParseError> {
    let mut scene = None;
    let mut headless_ticks = None;
    let mut seed = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scene" => {
                let value = args
                    .next()
                    .ok_or_else(|| ArgParseError::Message("--scene expects <path>".to_string()))?;
                scene = Some(PathBuf::from(value));
            }
            "--headless" => {
                let value = args.next().ok_or_else(|| {
                    ArgParseError::Message("--headless expects <ticks>".to_string())
                })?;
                let ticks = value
                    .parse::<u64>()
                    .map_err(|_| ArgParseError::Message("invalid --headless value".to_string()))?;
                headless_ticks = Some(ticks.max(1));
            }
            "--seed" => {
                let value = args
                    .next()
                    .ok_or_else(|| ArgParseError::Message("--seed expects <n>".to_string()))?;
                let parsed = value
                    .parse::<u64>()
                    .map_err(|_| ArgParseError::Message("invalid --seed value".to_string()))?;
                seed = Some(parsed);
            }
            "-h" | "--help" => return Err(ArgParseError::Help),
            _ => {
                return Err(ArgParseError::Message(format!(
                    "unexpected argument: {}",
                    arg
                )))
            }
        }
    }

    Ok(CliArgs {
        scene,
        headless_ticks,
        seed,
    })
}

fn print_usage() {
    eprintln!("usage: castaway [--scene <path>] [--headless <ticks>] [--seed <n>]");
    eprintln!("  --scene <path>      load a scene document instead of the built-in island");
    eprintln!("  --headless <ticks>  run the simulation without a window for <ticks> ticks");
    eprintln!("  --seed <n>          seed the meteor spawner for reproducible runs");
}

fn perspective(fov_y_rad: f32, aspect: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fov_y_rad * 0.5).tan();
    let near = CAMERA_NEAR;
    let far = CAMERA_FAR;
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, (far + near) / (near - far), -1.0],
        [0.0, 0.0, (2.0 * far * near) / (near - far), 0.0],
    ]
}

fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            out[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    out
}

fn translate(t: [f32; 3]) -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [t[0], t[1], t[2], 1.0],
    ]
}

fn scale(s: [f32; 3]) -> [[f32; 4]; 4] {
    [
        [s[0], 0.0, 0.0, 0.0],
        [0.0, s[1], 0.0, 0.0],
        [0.0, 0.0, s[2], 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

fn rotate_y(angle: f32) -> [[f32; 4]; 4] {
    let (sin, cos) = angle.sin_cos();
    [
        [cos, 0.0, -sin, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [sin, 0.0, cos, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

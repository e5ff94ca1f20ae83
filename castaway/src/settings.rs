use std::fs;
use std::path::PathBuf;

use engine_core::path_policy::user_config_root;

const SETTINGS_VERSION: u32 = 1;
const SETTINGS_FILE: &str = "settings.cfg";
const MIN_SENSITIVITY: f32 = 0.01;
const MAX_SENSITIVITY: f32 = 1.0;
const MIN_FOV: f32 = 50.0;
const MAX_FOV: f32 = 120.0;
const DEFAULT_RESOLUTION: [u32; 2] = [1600, 900];
const MIN_RESOLUTION: [u32; 2] = [640, 480];
const MAX_RESOLUTION: [u32; 2] = [7680, 4320];

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub version: u32,
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
    pub fov_deg: f32,
    pub vsync: bool,
    pub resolution: [u32; 2],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            mouse_sensitivity: 0.1,
            invert_y: false,
            fov_deg: 90.0,
            vsync: true,
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let path = settings_path();
        if let Ok(contents) = fs::read_to_string(&path) {
            if let Some(settings) = Self::parse(&contents) {
                return settings;
            }
        }
        Self::default()
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = settings_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut data = self.lines().join("\n");
        data.push('\n');
        fs::write(path, data)
    }

    pub fn parse(contents: &str) -> Option<Self> {
        let mut settings = Self::default();
        let mut version = None;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "version" => {
                    version = value.parse::<u32>().ok();
                }
                "mouse_sensitivity" => {
                    if let Ok(value) = value.parse::<f32>() {
                        settings.mouse_sensitivity = value;
                    }
                }
                "invert_y" => {
                    if let Some(value) = parse_bool(value) {
                        settings.invert_y = value;
                    }
                }
                "fov" => {
                    if let Ok(value) = value.parse::<f32>() {
                        settings.fov_deg = value;
                    }
                }
                "vsync" => {
                    if let Some(value) = parse_bool(value) {
                        settings.vsync = value;
                    }
                }
                "resolution" => {
                    if let Some(value) = parse_resolution(value) {
                        settings.resolution = value;
                    }
                }
                _ => {}
            }
        }
        if let Some(version) = version {
            if version != SETTINGS_VERSION {
                return Some(Self::default());
            }
        }
        settings.normalize();
        settings.version = SETTINGS_VERSION;
        Some(settings)
    }

    pub fn normalize(&mut self) {
        self.mouse_sensitivity = self
            .mouse_sensitivity
            .clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
        self.fov_deg = self.fov_deg.clamp(MIN_FOV, MAX_FOV);
        self.resolution = [
            self.resolution[0].clamp(MIN_RESOLUTION[0], MAX_RESOLUTION[0]),
            self.resolution[1].clamp(MIN_RESOLUTION[1], MAX_RESOLUTION[1]),
        ];
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("version={}", SETTINGS_VERSION),
            format!("mouse_sensitivity={:.3}", self.mouse_sensitivity),
            format!("invert_y={}", format_bool(self.invert_y)),
            format!("fov={:.1}", self.fov_deg),
            format!("vsync={}", format_bool(self.vsync)),
            format!(
                "resolution={}x{}",
                self.resolution[0], self.resolution[1]
            ),
        ]
    }
}

fn settings_path() -> PathBuf {
    user_config_root().join(SETTINGS_FILE)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn parse_resolution(value: &str) -> Option<[u32; 2]> {
    let (width, height) = value
        .split_once('x')
        .or_else(|| value.split_once(','))
        .or_else(|| value.split_once('X'))?;
    let width = width.trim().parse::<u32>().ok()?;
    let height = height.trim().parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some([width, height])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_round_trip_through_parse() {
        let mut settings = Settings::default();
        settings.mouse_sensitivity = 0.25;
        settings.invert_y = true;
        settings.resolution = [1280, 720];
        let text = settings.lines().join("\n");
        let parsed = Settings::parse(&text).expect("parse");
        assert_eq!(parsed, settings);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let parsed =
            Settings::parse("mouse_sensitivity=50\nfov=200\nresolution=100x100").expect("parse");
        assert_eq!(parsed.mouse_sensitivity, MAX_SENSITIVITY);
        assert_eq!(parsed.fov_deg, MAX_FOV);
        assert_eq!(parsed.resolution, MIN_RESOLUTION);
    }

    #[test]
    fn unknown_keys_and_comments_are_ignored() {
        let parsed = Settings::parse("# comment\nnot_a_key=1\nvsync=0").expect("parse");
        assert!(!parsed.vsync);
        assert_eq!(parsed.mouse_sensitivity, Settings::default().mouse_sensitivity);
    }

    #[test]
    fn version_mismatch_falls_back_to_defaults() {
        let parsed = Settings::parse("version=99\nvsync=0").expect("parse");
        assert_eq!(parsed, Settings::default());
    }
}

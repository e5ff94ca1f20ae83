use std::env;
use std::path::PathBuf;

const CONFIG_ROOT_OVERRIDE: &str = "CASTAWAY_CONFIG_ROOT";

/// Directory that holds the user's settings file.
///
/// Resolution order: explicit env override, then the platform config home,
/// then a dot directory next to the working directory as a last resort.
pub fn user_config_root() -> PathBuf {
    if let Some(root) = env::var_os(CONFIG_ROOT_OVERRIDE) {
        return PathBuf::from(root);
    }
    if let Some(appdata) = env::var_os("APPDATA") {
        return PathBuf::from(appdata).join("Castaway");
    }
    if let Some(config) = env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(config).join("castaway");
    }
    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".config").join("castaway");
    }
    PathBuf::from(".castaway")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins() {
        env::set_var(CONFIG_ROOT_OVERRIDE, "/tmp/castaway-test-config");
        let root = user_config_root();
        env::remove_var(CONFIG_ROOT_OVERRIDE);
        assert_eq!(root, PathBuf::from("/tmp/castaway-test-config"));
    }
}

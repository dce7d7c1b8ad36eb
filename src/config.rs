use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Nesting limit used when a config leaves `max_depth` unset.
pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub commands: Commands,
    /// Category name to the canonical commands (or bare tool names) in it.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Commands {
    /// Multi-word canonical commands, e.g. `"defects4j test"`.
    #[serde(default)]
    pub phrases: Vec<String>,
    /// Tools whose non-flag second word is always joined.
    #[serde(default)]
    pub subcommand_tools: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    commands: CommandsOverlay,
    /// Per-category replacement; an empty list clears the category.
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    max_depth: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    phrases: Vec<String>,
    #[serde(default)]
    subcommand_tools: Vec<String>,
    #[serde(default)]
    remove_phrases: Vec<String>,
    #[serde(default)]
    remove_subcommand_tools: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn user_overlay_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".config/cmdseq/config.toml"))
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/cmdseq/config.toml (if exists)
    ///
    /// User config merges with defaults: lists extend, scalars override.
    /// Set `replace = true` in a section to replace its defaults entirely.
    /// Use `remove_<field>` lists to subtract specific items from defaults.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(path) = user_overlay_path()
            && path.exists()
        {
            match read_overlay(&path) {
                Ok(overlay) => config.apply_overlay(overlay),
                Err(e) => eprintln!("cmdseq: {e}"),
            }
        }
        config
    }

    /// Defaults merged with the overlay at `path`. A leading `~` is expanded.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        config.merge_file(path)?;
        Ok(config)
    }

    /// Merge the overlay at `path` into this config.
    pub fn merge_file(&mut self, path: &str) -> Result<(), ConfigError> {
        let path = PathBuf::from(shellexpand::tilde(path).as_ref());
        let overlay = read_overlay(&path)?;
        self.apply_overlay(overlay);
        Ok(())
    }

    /// Render as TOML, in the same shape the overlay files use.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        if let Some(v) = overlay.settings.max_depth {
            self.settings.max_depth = v;
        }

        let c = overlay.commands;
        merge_list(
            &mut self.commands.phrases,
            c.phrases,
            &c.remove_phrases,
            c.replace,
        );
        merge_list(
            &mut self.commands.subcommand_tools,
            c.subcommand_tools,
            &c.remove_subcommand_tools,
            c.replace,
        );

        for (name, commands) in overlay.categories {
            if commands.is_empty() {
                self.categories.remove(&name);
            } else {
                self.categories.insert(name, commands);
            }
        }
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(list: &[String], item: &str) -> bool {
        list.iter().any(|s| s == item)
    }

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert!(!config.commands.phrases.is_empty());
        assert!(!config.commands.subcommand_tools.is_empty());
        assert_eq!(config.settings.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn default_config_has_expected_entries() {
        let config = Config::default_config();
        assert!(has(&config.commands.phrases, "defects4j test"));
        assert!(has(&config.commands.subcommand_tools, "git"));
        assert!(has(&config.commands.subcommand_tools, "apt-get"));
        assert!(!has(&config.commands.subcommand_tools, "ant"));
    }

    #[test]
    fn empty_config_uses_default_depth() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.settings.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.commands.phrases.is_empty());
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_extends_phrases() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [commands]
            phrases = ["ant compile.test"]
        "#,
        );
        // Defaults still present
        assert!(has(&config.commands.phrases, "defects4j test"));
        assert!(has(&config.commands.phrases, "ant compile.test"));
    }

    #[test]
    fn overlay_extend_is_deduped() {
        let mut config = Config::default_config();
        let before = config.commands.subcommand_tools.len();
        config.apply_overlay_str(
            r#"
            [commands]
            subcommand_tools = ["git"]
        "#,
        );
        assert_eq!(config.commands.subcommand_tools.len(), before);
    }

    #[test]
    fn overlay_removes_tools() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [commands]
            remove_subcommand_tools = ["git", "npm"]
        "#,
        );
        assert!(!has(&config.commands.subcommand_tools, "git"));
        assert!(!has(&config.commands.subcommand_tools, "npm"));
        assert!(has(&config.commands.subcommand_tools, "mvn"));
    }

    #[test]
    fn overlay_replace_commands() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [commands]
            replace = true
            phrases = ["make check"]
        "#,
        );
        assert_eq!(config.commands.phrases, vec!["make check"]);
        // replace applies to the whole section
        assert!(config.commands.subcommand_tools.is_empty());
    }

    #[test]
    fn overlay_overrides_max_depth() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            max_depth = 8
        "#,
        );
        assert_eq!(config.settings.max_depth, 8);
    }

    #[test]
    fn default_categories_populated() {
        let config = Config::default_config();
        assert!(has(&config.categories["defects4j_test"], "defects4j test"));
        assert!(has(&config.categories["file_list"], "ls"));
    }

    #[test]
    fn overlay_replaces_and_clears_categories() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [categories]
            file_list = ["exa"]
            text_view = []
            custom = ["my-tool"]
        "#,
        );
        assert_eq!(config.categories["file_list"], vec!["exa"]);
        assert!(!config.categories.contains_key("text_view"));
        assert!(config.categories.contains_key("custom"));
        // untouched categories stay
        assert!(config.categories.contains_key("build_clean"));
    }

    #[test]
    fn empty_overlay_is_noop() {
        let mut config = Config::default_config();
        let phrases = config.commands.phrases.clone();
        config.apply_overlay_str("");
        assert_eq!(config.commands.phrases, phrases);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = Config::from_file("/nonexistent/cmdseq/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn from_file_merges_overlay() {
        let path = std::env::temp_dir().join(format!("cmdseq-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[commands]\nphrases = [\"ant test\"]\n").unwrap();
        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(has(&config.commands.phrases, "ant test"));
        assert!(has(&config.commands.phrases, "defects4j test"));
    }

    #[test]
    fn from_file_bad_toml() {
        let path = std::env::temp_dir().join(format!("cmdseq-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[commands\nphrases = 3").unwrap();
        let err = Config::from_file(path.to_str().unwrap()).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn toml_dump_round_trips() {
        let config = Config::default_config();
        let dumped = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&dumped).unwrap();
        assert_eq!(parsed.commands.phrases, config.commands.phrases);
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::decorate::ApplyOptions;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "vdeck";

const KNOWN_KEYS: [&str; 4] = [
    "prevent_duplicates",
    "prefix_separator",
    "suffix_separator",
    "apply_to_structured_name",
];

/// Runtime configuration. All keys are optional in the file; a missing file
/// yields the defaults, so the tool works without any setup.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub prevent_duplicates: bool,
    pub prefix_separator: String,
    pub suffix_separator: String,
    pub apply_to_structured_name: bool,
}

impl Config {
    fn defaults_at(path: PathBuf) -> Self {
        let options = ApplyOptions::default();
        Config {
            config_path: path,
            prevent_duplicates: options.prevent_duplicates,
            prefix_separator: options.prefix_separator,
            suffix_separator: options.suffix_separator,
            apply_to_structured_name: options.apply_to_structured_name,
        }
    }

    /// Decoration options derived from this configuration.
    pub fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            prevent_duplicates: self.prevent_duplicates,
            prefix_separator: self.prefix_separator.clone(),
            suffix_separator: self.suffix_separator.clone(),
            apply_to_structured_name: self.apply_to_structured_name,
        }
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    prevent_duplicates: Option<bool>,
    prefix_separator: Option<String>,
    suffix_separator: Option<String>,
    apply_to_structured_name: Option<bool>,
}

/// Load the configuration from `override_path`, or from
/// `<config_dir>/vdeck/config.toml`. A missing file is not an error.
pub fn load(override_path: Option<&Path>) -> Result<Config> {
    let path = match override_path {
        Some(path) => expand_tilde(path),
        None => default_config_path()?,
    };

    if !path.exists() {
        return Ok(Config::defaults_at(path));
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let mut config = Config::defaults_at(path);
    if let Some(prevent) = file.prevent_duplicates {
        config.prevent_duplicates = prevent;
    }
    if let Some(sep) = file.prefix_separator {
        config.prefix_separator = sep;
    }
    if let Some(sep) = file.suffix_separator {
        config.suffix_separator = sep;
    }
    if let Some(apply) = file.apply_to_structured_name {
        config.apply_to_structured_name = apply;
    }
    Ok(config)
}

fn default_config_path() -> Result<PathBuf> {
    let base = BaseDirs::new().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(base.config_dir().join(APP_NAME).join(CONFIG_FILE_NAME))
}

fn warn_unknown_keys(value: &toml::Value) {
    if let Some(table) = value.as_table() {
        for key in table.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                eprintln!("warning: unknown configuration key `{key}`");
            }
        }
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::collab::DirSessionStore;
use crate::editor::DEFAULT_HISTORY_LIMIT;

pub const DEFAULT_SWITCH_DEBOUNCE_MS: u64 = 200;
pub const DEFAULT_STARTUP_NAME: &str = "startup.py";
pub const DEFAULT_LANGUAGE: &str = "python";
pub const DEFAULT_STARTUP_CONTENT: &str = "# Startup file\n\
     # This file is loaded when the runtime starts\n\
     # Add your custom code here\n";

/// Resolved settings for a [`crate::editor::TabManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    /// Undo snapshots kept per buffer.
    pub history_limit: usize,
    /// How long `is_tab_switching` stays set after a switch.
    pub switch_debounce: Duration,
    pub startup_name: String,
    pub startup_content: String,
    pub default_language: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            switch_debounce: Duration::from_millis(DEFAULT_SWITCH_DEBOUNCE_MS),
            startup_name: DEFAULT_STARTUP_NAME.to_string(),
            startup_content: DEFAULT_STARTUP_CONTENT.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub history_limit: Option<usize>,
    pub switch_debounce_ms: Option<u64>,
    pub startup_name: Option<String>,
    pub default_language: Option<String>,
    pub session_dir: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge two sources; values set in `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            history_limit: other.history_limit.or(self.history_limit),
            switch_debounce_ms: other.switch_debounce_ms.or(self.switch_debounce_ms),
            startup_name: other
                .startup_name
                .clone()
                .or_else(|| self.startup_name.clone()),
            default_language: other
                .default_language
                .clone()
                .or_else(|| self.default_language.clone()),
            session_dir: other
                .session_dir
                .clone()
                .or_else(|| self.session_dir.clone()),
        }
    }

    /// Session store rooted at `--session-dir`, if one was configured.
    pub fn session_store(&self) -> Option<DirSessionStore> {
        self.session_dir.clone().map(DirSessionStore::new)
    }

    pub fn settings(&self) -> EditorSettings {
        let defaults = EditorSettings::default();
        EditorSettings {
            history_limit: self.history_limit.unwrap_or(defaults.history_limit),
            switch_debounce: self
                .switch_debounce_ms
                .map_or(defaults.switch_debounce, Duration::from_millis),
            startup_name: self.startup_name.clone().unwrap_or(defaults.startup_name),
            startup_content: defaults.startup_content,
            default_language: self
                .default_language
                .clone()
                .unwrap_or(defaults.default_language),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("codedeck").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("codedeck")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("codedeck").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("codedeck")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".codedeckrc")
}

/// Global config overlaid with the local override file.
///
/// # Errors
/// Returns an error if either file exists but cannot be read.
pub fn load_effective_flags() -> Result<ConfigFlags> {
    let global = load_config_flags(&global_config_path())?;
    let local = load_config_flags(&local_override_path())?;
    Ok(global.union(&local))
}

/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# codedeck defaults".to_string()];
    if let Some(limit) = flags.history_limit {
        lines.push(format!("--history-limit {limit}"));
    }
    if let Some(ms) = flags.switch_debounce_ms {
        lines.push(format!("--switch-debounce-ms {ms}"));
    }
    if let Some(name) = &flags.startup_name {
        lines.push(format!("--startup-name {name}"));
    }
    if let Some(language) = &flags.default_language {
        lines.push(format!("--language {language}"));
    }
    if let Some(dir) = &flags.session_dir {
        lines.push(format!("--session-dir {}", dir.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags; unknown tokens and unparsable values are ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (key, inline) = match token.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (token, None),
        };
        let takes_value = matches!(
            key,
            "--history-limit"
                | "--switch-debounce-ms"
                | "--startup-name"
                | "--language"
                | "--session-dir"
        );
        if !takes_value {
            i += 1;
            continue;
        }
        let value = match inline {
            Some(value) => Some(value),
            None => {
                let next = tokens.get(i + 1).map(String::as_str);
                if next.is_some() {
                    i += 1;
                }
                next
            }
        };
        if let Some(value) = value {
            apply_flag(&mut flags, key, value);
        }
        i += 1;
    }
    flags
}

fn apply_flag(flags: &mut ConfigFlags, key: &str, value: &str) {
    match key {
        "--history-limit" => {
            if let Ok(limit) = value.parse() {
                flags.history_limit = Some(limit);
            }
        }
        "--switch-debounce-ms" => {
            if let Ok(ms) = value.parse() {
                flags.switch_debounce_ms = Some(ms);
            }
        }
        "--startup-name" => flags.startup_name = Some(value.to_string()),
        "--language" => flags.default_language = Some(value.to_string()),
        "--session-dir" => flags.session_dir = Some(PathBuf::from(value)),
        _ => {}
    }
}

//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::conformance::DEFAULT_DEVIATION_LIMIT_MM;
use crate::core::Project;

/// MCT configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Editor command for `mct ... edit`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,

    /// Symmetric axis deviation limit (mm) for new certificates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_limit: Option<f64>,
}

/// Keys accepted by `mct config set`
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("author", "Default author for new records"),
    ("editor", "Editor command for edit subcommands"),
    ("default_format", "Default output format (auto, yaml, json, tsv, csv, md, id)"),
    ("deviation_limit", "Axis deviation limit in mm for new certificates"),
];

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        Self::load_with_project(Project::discover().ok().as_ref())
    }

    /// Load configuration using an already opened project
    pub fn load_with_project(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/mct/config.yaml)
        if let Some(global) = Self::global_config_path().and_then(|p| Self::read_file(&p)) {
            config.merge(global);
        }

        // 2. Project config (.mct/config.yaml)
        if let Some(project) = project {
            if let Some(local) = Self::read_file(&Self::project_config_path(project)) {
                config.merge(local);
            }
        }

        // 3. Environment variables
        if let Ok(author) = std::env::var("MCT_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(editor) = std::env::var("MCT_EDITOR") {
            config.editor = Some(editor);
        }

        config
    }

    /// Read a single config file; unreadable or malformed files are skipped
    pub fn read_file(path: &Path) -> Option<Config> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mct")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Path to the project config file
    pub fn project_config_path(project: &Project) -> PathBuf {
        project.mct_dir().join("config.yaml")
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.deviation_limit.is_some() {
            self.deviation_limit = other.deviation_limit;
        }
    }

    /// Read a key as a display string
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "author" => self.author.clone(),
            "editor" => self.editor.clone(),
            "default_format" => self.default_format.clone(),
            "deviation_limit" => self.deviation_limit.map(|v| v.to_string()),
            _ => None,
        }
    }

    /// Set a key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "author" => self.author = Some(value.to_string()),
            "editor" => self.editor = Some(value.to_string()),
            "default_format" => self.default_format = Some(value.to_string()),
            "deviation_limit" => {
                let limit: f64 = value
                    .parse()
                    .map_err(|_| format!("deviation_limit must be a number, got '{}'", value))?;
                if !limit.is_finite() || limit <= 0.0 {
                    return Err("deviation_limit must be a positive number".to_string());
                }
                self.deviation_limit = Some(limit);
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Remove a key
    pub fn unset(&mut self, key: &str) -> Result<(), String> {
        match key {
            "author" => self.author = None,
            "editor" => self.editor = None,
            "default_format" => self.default_format = None,
            "deviation_limit" => self.deviation_limit = None,
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Axis deviation limit for new certificates
    pub fn deviation_limit(&self) -> f64 {
        self.deviation_limit
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_DEVIATION_LIMIT_MM)
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(&self, file_path: &Path) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let mut parts = editor.split_whitespace();

        let Some(cmd) = parts.next() else {
            return std::process::Command::new("vi").arg(file_path).status();
        };

        std::process::Command::new(cmd)
            .args(parts)
            .arg(file_path)
            .status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            author: Some("Base".into()),
            editor: Some("vi".into()),
            ..Default::default()
        };
        base.merge(Config {
            author: Some("Override".into()),
            deviation_limit: Some(0.003),
            ..Default::default()
        });

        assert_eq!(base.author.as_deref(), Some("Override"));
        assert_eq!(base.editor.as_deref(), Some("vi"));
        assert_eq!(base.deviation_limit, Some(0.003));
    }

    #[test]
    fn test_deviation_limit_default() {
        assert_eq!(Config::default().deviation_limit(), 0.0025);

        let bad = Config {
            deviation_limit: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(bad.deviation_limit(), 0.0025);
    }

    #[test]
    fn test_set_and_unset() {
        let mut config = Config::default();
        config.set("deviation_limit", "0.004").unwrap();
        config.set("author", "Inspector").unwrap();
        assert_eq!(config.get("deviation_limit").as_deref(), Some("0.004"));
        assert_eq!(config.get("author").as_deref(), Some("Inspector"));

        assert!(config.set("deviation_limit", "wide").is_err());
        assert!(config.set("deviation_limit", "0").is_err());
        assert!(config.set("colour", "blue").is_err());

        config.unset("author").unwrap();
        assert!(config.get("author").is_none());
    }

    #[test]
    fn test_read_file_skips_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.yaml");
        let bad = tmp.path().join("bad.yaml");
        std::fs::write(&good, "author: Lab\ndeviation_limit: 0.002\n").unwrap();
        std::fs::write(&bad, "author: [unclosed\n").unwrap();

        let config = Config::read_file(&good).unwrap();
        assert_eq!(config.author.as_deref(), Some("Lab"));
        assert_eq!(config.deviation_limit, Some(0.002));
        assert!(Config::read_file(&bad).is_none());
        assert!(Config::read_file(&tmp.path().join("missing.yaml")).is_none());
    }
}

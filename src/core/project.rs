//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// File suffix of every record
pub const RECORD_SUFFIX: &str = ".mct.yaml";

/// Represents an MCT project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .mct/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(".mct").is_dir() {
                tracing::debug!(root = %current.display(), "discovered project");
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open the project at an explicit root or discover it from the working directory
    pub fn open(root: Option<&Path>) -> Result<Self, ProjectError> {
        match root {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(".mct").exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::init_force(&root)
    }

    /// Initialize even if .mct/ exists; existing records are left untouched
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let mct_dir = root.join(".mct");

        std::fs::create_dir_all(&mct_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(mct_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        for prefix in EntityPrefix::all() {
            std::fs::create_dir_all(root.join(Self::entity_directory(*prefix)))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# MCT Project Configuration

# Default author for new records (can be overridden by global config)
# author: ""

# Editor to use for `mct ... edit` commands (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, json, tsv, csv, md, id)
# default_format: auto

# Symmetric axis deviation limit (mm) seeded into new certificates
# deviation_limit: 0.0025
"#
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The .mct configuration directory
    pub fn mct_dir(&self) -> PathBuf {
        self.root.join(".mct")
    }

    /// Path for a record file
    pub fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.root
            .join(Self::entity_directory(id.prefix()))
            .join(format!("{}{}", id, RECORD_SUFFIX))
    }

    /// Directory holding records of a given type
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Rpt => "reports",
            EntityPrefix::Cert => "certificates",
        }
    }

    /// Iterate all record files of a given type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.root.join(Self::entity_directory(prefix));
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(RECORD_SUFFIX))
            .map(|e| e.path().to_path_buf())
    }

    /// Find a record file by full ID or unambiguous ID prefix
    pub fn find_entity(&self, prefix: EntityPrefix, query: &str) -> Result<PathBuf, ProjectError> {
        let query_upper = query.to_uppercase();
        let matches: Vec<PathBuf> = self
            .iter_entity_files(prefix)
            .filter(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy().to_uppercase().starts_with(&query_upper))
                    .unwrap_or(false)
            })
            .collect();

        match matches.len() {
            0 => Err(ProjectError::EntityNotFound(query.to_string())),
            1 => Ok(matches.into_iter().next().unwrap_or_default()),
            n => Err(ProjectError::Ambiguous(query.to_string(), n)),
        }
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an MCT project (searched from {searched_from:?}). Run 'mct init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("MCT project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("no record found matching '{0}'")]
    EntityNotFound(String),

    #[error("'{0}' matches {1} records; use a longer ID")]
    Ambiguous(String, usize),

    #[error("IO error: {0}")]
    IoError(String),
}

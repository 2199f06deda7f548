//! Template registry for storing and retrieving prompt templates by ID

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::filler::template_placeholder_keys;

/// File extensions loaded as templates from a directory
const TEMPLATE_EXTENSIONS: &[&str] = &["md", "txt"];

/// File holding the template of a template sub-directory
const DIRECTORY_TEMPLATE_FILE: &str = "prompt.md";

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found in registry
    #[error("template not found: {id}")]
    NotFound { id: String },

    /// Duplicate template definition
    #[error("duplicate template definition: {id}")]
    Duplicate { id: String },

    /// Error reading a template file or directory
    #[error("error reading template file {path}: {message}")]
    FileReadError { path: PathBuf, message: String },
}

/// A stored prompt template
#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    /// Template ID
    pub id: String,
    /// Template text with `{{KEY}}` placeholders
    pub body: String,
    /// File the template was loaded from, if any
    pub source_path: Option<PathBuf>,
    /// Placeholder keys the body refers to
    pub placeholders: BTreeSet<String>,
}

impl TemplateDefinition {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            id: id.into(),
            placeholders: template_placeholder_keys(&body),
            body,
            source_path: None,
        }
    }

    /// Check if the template refers to a placeholder
    pub fn uses(&self, key: &str) -> bool {
        self.placeholders.contains(key)
    }
}

/// Registry for storing template definitions
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, TemplateDefinition>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every template found in a directory
    pub fn from_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut registry = Self::new();
        registry.load_dir(dir)?;
        Ok(registry)
    }

    /// Register a template from its text
    pub fn register(
        &mut self,
        id: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), TemplateError> {
        self.register_definition(TemplateDefinition::new(id, body))
    }

    /// Register a template definition directly
    pub fn register_definition(&mut self, def: TemplateDefinition) -> Result<(), TemplateError> {
        if self.templates.contains_key(&def.id) {
            return Err(TemplateError::Duplicate { id: def.id.clone() });
        }
        self.templates.insert(def.id.clone(), def);
        Ok(())
    }

    /// Get a template by ID
    pub fn get(&self, id: &str) -> Option<&TemplateDefinition> {
        self.templates.get(id)
    }

    /// Get a template by ID or fail with `NotFound`
    pub fn require(&self, id: &str) -> Result<&TemplateDefinition, TemplateError> {
        self.get(id).ok_or_else(|| TemplateError::NotFound { id: id.to_string() })
    }

    /// Check if a template exists
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// All template IDs, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Load every template in a directory
    ///
    /// `NAME.md` / `NAME.txt` register as `NAME`; a sub-directory `NAME`
    /// containing `prompt.md` registers as `NAME`. Other entries are ignored.
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), TemplateError> {
        let read_err = |path: &Path, e: std::io::Error| TemplateError::FileReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| read_err(dir, e))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(|e| read_err(dir, e))?;
        entries.sort();

        for path in entries {
            let Some((id, file)) = template_file(&path) else {
                continue;
            };
            let body = std::fs::read_to_string(&file).map_err(|e| read_err(&file, e))?;
            debug!(id = %id, path = %file.display(), "loaded template");

            let mut def = TemplateDefinition::new(id, body);
            def.source_path = Some(file);
            self.register_definition(def)?;
        }

        Ok(())
    }
}

/// Template ID and file for a directory entry, if it holds a template
fn template_file(path: &Path) -> Option<(String, PathBuf)> {
    if path.is_dir() {
        let file = path.join(DIRECTORY_TEMPLATE_FILE);
        let id = path.file_name()?.to_str()?.to_string();
        return file.is_file().then_some((id, file));
    }

    let ext = path.extension()?.to_str()?;
    if !TEMPLATE_EXTENSIONS.contains(&ext) {
        return None;
    }
    let id = path.file_stem()?.to_str()?.to_string();
    Some((id, path.to_path_buf()))
}

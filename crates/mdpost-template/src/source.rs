//! Where template text comes from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::TemplateError;

/// Provider of named template texts.
///
/// Lookup is the only place template handling does I/O.
pub trait TemplateSource: Send + Sync {
    /// All available templates, by name.
    fn load_all(&self) -> Result<BTreeMap<String, String>, TemplateError>;
}

/// Templates stored as `*.html` or `*.hbs` files in one directory.
///
/// The file stem is the template name. A missing directory means no
/// templates are available.
#[derive(Clone, Debug)]
pub struct DirTemplateSource {
    dir: PathBuf,
}

impl DirTemplateSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TemplateSource for DirTemplateSource {
    fn load_all(&self) -> Result<BTreeMap<String, String>, TemplateError> {
        let mut templates = BTreeMap::new();
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "template directory not found");
            return Ok(templates);
        }

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_template = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "html" || e == "hbs");
            if !is_template || !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = std::fs::read_to_string(&path)?;
            templates.insert(name.to_owned(), text);
        }

        tracing::debug!(dir = %self.dir.display(), count = templates.len(), "templates loaded");
        Ok(templates)
    }
}

/// Templates held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryTemplateSource {
    templates: BTreeMap<String, String>,
}

impl MemoryTemplateSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(name.into(), text.into());
        self
    }
}

impl TemplateSource for MemoryTemplateSource {
    fn load_all(&self) -> Result<BTreeMap<String, String>, TemplateError> {
        Ok(self.templates.clone())
    }
}

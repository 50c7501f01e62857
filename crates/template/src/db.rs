use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::TemplateError;
use crate::template::Template;
use crate::xml::parse_templates;

/// In-memory template database.
#[derive(Debug, Clone, Default)]
pub struct TemplateDb {
    templates: Vec<Template>,
}

impl TemplateDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, TemplateError> {
        let mut db = Self::new();
        db.extend_from_xml_str(xml)?;
        Ok(db)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let mut db = Self::new();
        db.load_file(path)?;
        Ok(db)
    }

    /// Adds every template from a file; returns how many were read.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, TemplateError> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let added = self.extend_from_xml_str(&xml)?;
        debug!(path = %path.display(), templates = added, "loaded template file");
        Ok(added)
    }

    /// Adds templates from an XML document. A template whose name is already
    /// known replaces the earlier definition.
    pub fn extend_from_xml_str(&mut self, xml: &str) -> Result<usize, TemplateError> {
        let parsed = parse_templates(xml, &self.templates)?;
        let added = parsed.len();
        for template in parsed {
            self.insert(template);
        }
        Ok(added)
    }

    pub fn insert(&mut self, template: Template) {
        let name = template.name();
        match self
            .templates
            .iter_mut()
            .find(|existing| existing.name().eq_ignore_ascii_case(&name))
        {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Case-insensitive lookup by `"brand part"`.
    pub fn lookup(&self, name: &str) -> Option<&Template> {
        let name = name.trim();
        self.templates
            .iter()
            .find(|template| template.name().eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Result<&Template, TemplateError> {
        self.lookup(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }
}

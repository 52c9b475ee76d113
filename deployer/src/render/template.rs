//! Placeholder substitution over opaque template bodies
//!
//! Substitution is lenient: a placeholder that does not occur in the document
//! is skipped. Only the structural placeholders of a compose template are
//! mandatory.

use tracing::debug;

use crate::config::spec::ComponentKind;
use crate::errors::RenderError;
use crate::filesys::file::File;
use crate::utils::sha256_hash;

/// Placeholder replaced by the absolute install root
pub const INSTALL_PATH_PLACEHOLDER: &str = "NMS_INSTALL_PATH";

/// Ordered `(placeholder, value)` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    pairs: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, placeholder: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((placeholder.into(), value.into()));
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(p, _)| p == placeholder)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A template body read from the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    body: String,
}

impl Template {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// Load a template from disk, naming it after the file
    pub async fn load(file: &File) -> Result<Self, crate::errors::IoError> {
        let body = file.read_string().await?;
        let name = file
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, body))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Apply substitutions in order, skipping placeholders that do not occur
    pub fn render(&self, substitutions: &Substitutions) -> RenderedDocument {
        let mut text = self.body.clone();
        for (placeholder, value) in substitutions.iter() {
            if placeholder.is_empty() || !text.contains(placeholder) {
                continue;
            }
            text = text.replace(placeholder, value);
        }
        RenderedDocument { text }
    }

    /// Render a component compose template
    ///
    /// The name, port and install path placeholders must all be present, and
    /// `substitutions` must carry values for them.
    pub fn render_structural(
        &self,
        kind: ComponentKind,
        substitutions: &Substitutions,
    ) -> Result<RenderedDocument, RenderError> {
        for placeholder in [
            kind.name_placeholder(),
            kind.port_placeholder(),
            INSTALL_PATH_PLACEHOLDER.to_string(),
        ] {
            if !self.body.contains(&placeholder) || substitutions.get(&placeholder).is_none() {
                return Err(RenderError::MissingPlaceholder {
                    template: self.name.clone(),
                    placeholder,
                });
            }
        }
        Ok(self.render(substitutions))
    }
}

/// The output of a render, not yet written anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    text: String,
}

impl RenderedDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn digest(&self) -> String {
        sha256_hash(self.text.as_bytes())
    }

    /// Write the document, creating parent directories as needed
    pub async fn write_to(&self, file: &File) -> Result<(), RenderError> {
        file.write_string(&self.text)
            .await
            .map_err(RenderError::WriteFailure)?;
        debug!("Wrote {} ({})", file.path().display(), self.digest());
        Ok(())
    }
}

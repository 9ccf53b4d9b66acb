use crate::grammar::DocTree;
use crate::interchange::{self, ImportError};
use crate::render::{self, MarkupOptions};
use crate::sanitize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document: {0}")]
    Import(#[from] ImportError),
    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How a document file is stored, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Interchange JSON, validated strictly on read
    Json,
    /// Markup, sanitized on read like pasted content
    Markup,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Markup,
        }
    }
}

/// Read a document file
pub fn read_document(path: &Path, options: &MarkupOptions) -> Result<DocTree, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let tree = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => interchange::from_json(&content)?,
        DocumentFormat::Markup => sanitize::sanitize_markup_with(&content, options),
    };
    log::info!("read {} ({} nodes)", path.display(), tree.len());
    Ok(tree)
}

/// Write a document file, creating parent directories as needed
pub fn write_document(path: &Path, tree: &DocTree, options: &MarkupOptions) -> Result<(), IoError> {
    let content = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => interchange::to_json(tree)?,
        DocumentFormat::Markup => render::to_markup_with(tree, options),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, content)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

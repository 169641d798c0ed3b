//! Where a pipeline document comes from

use crate::codec::document::PipelineDocument;
use crate::core::error::{PipelineError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
enum Inline {
    Value(Value),
    Json(String),
    Document(PipelineDocument),
}

/// Candidate sources for a pipeline document
///
/// When more than one is set, inline content wins over a file, and a file
/// wins over a URL.
#[derive(Debug, Clone, Default)]
pub struct PipelineSource {
    inline: Option<Inline>,
    file: Option<PathBuf>,
    url: Option<String>,
}

impl PipelineSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// An already parsed document value
    pub fn inline(mut self, value: Value) -> Self {
        self.inline = Some(Inline::Value(value));
        self
    }

    /// Document text in JSON
    pub fn inline_json(mut self, json: impl Into<String>) -> Self {
        self.inline = Some(Inline::Json(json.into()));
        self
    }

    pub fn document(mut self, document: PipelineDocument) -> Self {
        self.inline = Some(Inline::Document(document));
        self
    }

    /// A JSON file, or YAML when the extension is `.yaml`/`.yml`
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inline.is_none() && self.file.is_none() && self.url.is_none()
    }

    /// Human-readable name of the source that would be used
    pub fn describe(&self) -> String {
        match (&self.inline, &self.file, &self.url) {
            (Some(_), _, _) => "inline document".to_string(),
            (None, Some(path), _) => path.display().to_string(),
            (None, None, Some(url)) => url.clone(),
            (None, None, None) => "no source".to_string(),
        }
    }

    /// Read the document from the highest-priority source present
    pub async fn fetch_document(&self) -> Result<PipelineDocument> {
        if let Some(inline) = &self.inline {
            debug!("Reading pipeline from inline document");
            return match inline {
                Inline::Value(value) => PipelineDocument::from_value(value.clone()),
                Inline::Json(json) => PipelineDocument::from_json(json),
                Inline::Document(document) => Ok(document.clone()),
            };
        }
        if let Some(path) = &self.file {
            return read_file(path).await;
        }
        if let Some(url) = &self.url {
            return fetch_url(url).await;
        }
        Err(PipelineError::SourceUnavailable(
            "no inline document, file, or URL given".to_string(),
        ))
    }
}

async fn read_file(path: &Path) -> Result<PipelineDocument> {
    debug!("Reading pipeline from file {}", path.display());
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => PipelineDocument::from_yaml(&content),
        _ => PipelineDocument::from_json(&content),
    }
}

async fn fetch_url(url: &str) -> Result<PipelineDocument> {
    debug!("Fetching pipeline from {}", url);
    let unavailable = |e: reqwest::Error| PipelineError::SourceUnavailable(format!("{}: {}", url, e));

    let body = reqwest::get(url)
        .await
        .map_err(unavailable)?
        .error_for_status()
        .map_err(unavailable)?
        .text()
        .await
        .map_err(unavailable)?;

    PipelineDocument::from_json(&body)
}

//! Pipeline codec - converts between pipeline contexts and declarative documents

pub mod document;
pub mod source;

pub use document::{ActionRecord, PipelineDocument, ACTION_NAME_KEY};
pub use source::PipelineSource;

use crate::core::{
    action::ActionInstance,
    config::BootstrapConfig,
    context::PipelineContext,
    error::{PipelineError, Result},
    registry::HandlerRegistry,
    schema::{self, SchemaViolation},
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Encode a pipeline as one record per action, in list order
pub fn encode(context: &PipelineContext) -> PipelineDocument {
    let actions = context
        .actions()
        .iter()
        .map(|action| ActionRecord::new(action.action_name(), action.parameters().clone()))
        .collect();
    PipelineDocument::new(actions)
}

/// Build a pipeline from a document without executing anything
///
/// Every record after the first joins the first record's context. An empty
/// document yields `None`.
pub fn decode(
    registry: &HandlerRegistry,
    document: &PipelineDocument,
    config: Arc<BootstrapConfig>,
) -> Result<Option<PipelineContext>> {
    let mut context: Option<PipelineContext> = None;

    for record in &document.actions {
        let parameters = record.parameters.clone();
        match &context {
            Some(context) => {
                ActionInstance::create_in(registry, &record.action_name, parameters, context)?;
            }
            None => {
                let root =
                    ActionInstance::create_root(registry, &record.action_name, parameters, Arc::clone(&config))?;
                context = Some(root.context().clone());
            }
        }
    }

    if let Some(context) = &context {
        debug!("Decoded pipeline {} with {} actions", context.id(), context.len());
    }
    Ok(context)
}

/// Fetch a document from `source` and decode it
pub async fn load(
    registry: &HandlerRegistry,
    source: &PipelineSource,
    config: Arc<BootstrapConfig>,
) -> Result<Option<PipelineContext>> {
    let document = source.fetch_document().await?;
    info!(
        "Loaded pipeline document from {} ({} actions)",
        source.describe(),
        document.len()
    );
    decode(registry, &document, config)
}

/// Schema check result for one record of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub index: usize,
    pub action_name: String,
    #[serde(serialize_with = "violations_as_strings")]
    pub violations: Vec<SchemaViolation>,
}

impl RecordReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

fn violations_as_strings<S: serde::Serializer>(
    violations: &[SchemaViolation],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(violations.iter().map(ToString::to_string))
}

/// Check every record against the merged schema of its handler type
///
/// Fails with [`PipelineError::UnresolvedActionType`] on the first record
/// whose name does not resolve.
pub fn validate_document(registry: &HandlerRegistry, document: &PipelineDocument) -> Result<Vec<RecordReport>> {
    let mut memo = std::collections::HashMap::new();
    document
        .actions
        .iter()
        .enumerate()
        .map(|(index, record)| -> Result<RecordReport> {
            let handler_type = registry.resolve(&record.action_name)?;
            let fields = schema::merged_fields(registry, handler_type.type_name(), &mut memo);
            Ok(RecordReport {
                index,
                action_name: record.action_name.clone(),
                violations: schema::validate(&fields, &record.parameters),
            })
        })
        .collect()
}

/// Write the encoded pipeline to `path` as pretty JSON
pub async fn save(context: &PipelineContext, path: &Path) -> Result<()> {
    let json = encode(context).to_json_pretty()?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| PipelineError::DocumentWrite {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Saved pipeline {} to {}", context.id(), path.display());
    Ok(())
}

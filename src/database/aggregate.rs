// Aggregation pipeline visibility stages
//
// The pipeline is prepared in place before it reaches the store. Callers pick
// a Visibility explicitly; the `showAllDocuments: "true"` marker in the first
// `$match` stage is still honored for pipelines built elsewhere.

use serde_json::{Map, Value};

use crate::filter::predicate::match_stage_condition;
use crate::schema::SoftDeleteDescriptor;
use crate::types::{Document, Visibility};

/// Transient first-stage marker requesting every document
pub const SHOW_ALL_DOCUMENTS: &str = "showAllDocuments";

const MATCH: &str = "$match";

/// What `prepare_pipeline` did to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineDecision {
    /// No stages; nothing to do
    Skipped,
    /// First stage already restricts to `deleted != false`
    AlreadyFiltered,
    /// Marker removed; `stage_kept` is false when the stage became empty
    MarkerStripped { stage_kept: bool },
    /// Exclusion stage prepended
    ExclusionPrepended,
}

/// Build a `{ $match: ... }` stage for a visibility mode
pub fn visibility_stage(descriptor: &SoftDeleteDescriptor, visibility: Visibility) -> Option<Document> {
    let condition = match_stage_condition(descriptor, visibility)?;
    Some(Map::from_iter([(MATCH.to_string(), condition)]))
}

/// Prepare a pipeline for default (exclude deleted) execution
pub fn prepare_pipeline(descriptor: &SoftDeleteDescriptor, pipeline: &mut Vec<Document>) -> PipelineDecision {
    let Some(first) = pipeline.first_mut() else {
        return PipelineDecision::Skipped;
    };

    if let Some(Value::Object(filter)) = first.get_mut(MATCH) {
        let already_filtered = filter
            .get(descriptor.deleted_field())
            .and_then(|cond| cond.get("$ne"))
            .is_some_and(|ne| ne == &Value::Bool(false));
        if already_filtered {
            return PipelineDecision::AlreadyFiltered;
        }

        if filter.get(SHOW_ALL_DOCUMENTS).and_then(Value::as_str) == Some("true") {
            filter.remove(SHOW_ALL_DOCUMENTS);
            let stage_kept = !filter.is_empty();
            if !stage_kept {
                pipeline.remove(0);
            }
            return PipelineDecision::MarkerStripped { stage_kept };
        }
    }

    if let Some(stage) = visibility_stage(descriptor, Visibility::ExcludeDeleted) {
        pipeline.insert(0, stage);
    }
    PipelineDecision::ExclusionPrepended
}

/// Apply a visibility mode to a pipeline before execution
pub fn apply_visibility(
    descriptor: &SoftDeleteDescriptor,
    pipeline: &mut Vec<Document>,
    visibility: Visibility,
) -> Option<PipelineDecision> {
    match visibility {
        Visibility::ExcludeDeleted => Some(prepare_pipeline(descriptor, pipeline)),
        Visibility::OnlyDeleted => {
            if let Some(stage) = visibility_stage(descriptor, Visibility::OnlyDeleted) {
                pipeline.insert(0, stage);
            }
            None
        }
        Visibility::IncludeAll => None,
    }
}

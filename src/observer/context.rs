use std::sync::Arc;
use std::time::Instant;

use crate::database::store::SaveOptions;
use crate::observer::traits::Hook;
use crate::schema::SoftDeleteDescriptor;
use crate::types::{Document, Visibility};

/// Data an observer may rewrite before it reaches the store
#[derive(Debug, Clone, PartialEq)]
pub enum HookPayload {
    Save {
        document: Document,
        options: SaveOptions,
    },
    Aggregate {
        pipeline: Vec<Document>,
        visibility: Visibility,
    },
}

/// State flowing through one hook run
#[derive(Debug)]
pub struct ObserverContext {
    pub hook: Hook,
    pub descriptor: Arc<SoftDeleteDescriptor>,
    pub payload: HookPayload,
    start_time: Instant,
}

impl ObserverContext {
    pub fn new_save(descriptor: Arc<SoftDeleteDescriptor>, document: Document, options: SaveOptions) -> Self {
        Self {
            hook: Hook::PreSave,
            descriptor,
            payload: HookPayload::Save { document, options },
            start_time: Instant::now(),
        }
    }

    pub fn new_aggregate(
        descriptor: Arc<SoftDeleteDescriptor>,
        pipeline: Vec<Document>,
        visibility: Visibility,
    ) -> Self {
        Self {
            hook: Hook::PreAggregate,
            descriptor,
            payload: HookPayload::Aggregate { pipeline, visibility },
            start_time: Instant::now(),
        }
    }

    /// Document being saved, if this is a save hook
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        match &mut self.payload {
            HookPayload::Save { document, .. } => Some(document),
            _ => None,
        }
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match &self.payload {
            HookPayload::Aggregate { visibility, .. } => Some(*visibility),
            _ => None,
        }
    }

    /// Time since the hook run started
    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn into_save(self) -> Option<(Document, SaveOptions)> {
        match self.payload {
            HookPayload::Save { document, options } => Some((document, options)),
            _ => None,
        }
    }

    pub fn into_pipeline(self) -> Option<Vec<Document>> {
        match self.payload {
            HookPayload::Aggregate { pipeline, .. } => Some(pipeline),
            _ => None,
        }
    }
}

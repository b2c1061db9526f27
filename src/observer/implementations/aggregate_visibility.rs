// PreAggregate: restrict the pipeline to the requested visibility
use async_trait::async_trait;

use crate::database::aggregate::apply_visibility;
use crate::observer::context::{HookPayload, ObserverContext};
use crate::observer::error::ObserverError;
use crate::observer::traits::{Hook, HookObserver, Observer};
use crate::types::Method;

#[derive(Default)]
pub struct AggregateVisibilityObserver;

impl Observer for AggregateVisibilityObserver {
    fn name(&self) -> &'static str {
        "AggregateVisibilityObserver"
    }

    fn hook(&self) -> Hook {
        Hook::PreAggregate
    }

    /// Only augmented aggregation is rewritten
    fn applies_to(&self, ctx: &ObserverContext) -> bool {
        ctx.descriptor.is_augmented(Method::Aggregate)
    }
}

#[async_trait]
impl HookObserver for AggregateVisibilityObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let HookPayload::Aggregate { pipeline, visibility } = &mut ctx.payload else {
            return Err(ObserverError::PipelineError(
                "AggregateVisibilityObserver requires an aggregate payload".to_string(),
            ));
        };

        let decision = apply_visibility(&ctx.descriptor, pipeline, *visibility);
        tracing::debug!(
            "Aggregate pipeline prepared: visibility={:?}, decision={:?}, stages={}",
            visibility,
            decision,
            pipeline.len()
        );
        Ok(())
    }
}

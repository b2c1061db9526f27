use async_trait::async_trait;
use std::time::Duration;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;

/// Points in an operation where observers run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Before an entity is handed to the store's save
    PreSave,
    /// Before a pipeline is handed to the store's aggregate
    PreAggregate,
}

/// Observer metadata and applicability checks
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which hook this observer belongs to
    fn hook(&self) -> Hook;

    /// Check if observer applies to this invocation
    fn applies_to(&self, _ctx: &ObserverContext) -> bool {
        true
    }

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Priority within hook (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }
}

/// Observer that may rewrite the payload in the context
#[async_trait]
pub trait HookObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

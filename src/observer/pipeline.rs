// Observer pipeline: runs registered observers for a hook in priority order

use std::collections::HashMap;
use std::time::Instant;
use tokio::time::timeout;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::implementations::{AggregateVisibilityObserver, DefaultDeletedFlagObserver};
use crate::observer::traits::{Hook, HookObserver};

/// Observer registry keyed by hook
pub struct ObserverPipeline {
    observers: HashMap<Hook, Vec<Box<dyn HookObserver>>>,
}

impl ObserverPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
        }
    }

    /// Pipeline with the soft delete observers registered
    pub fn with_defaults() -> Self {
        let mut pipeline = Self::new();
        pipeline.register_observer(Box::new(DefaultDeletedFlagObserver));
        pipeline.register_observer(Box::new(AggregateVisibilityObserver));
        pipeline
    }

    /// Register an observer; observers within a hook stay sorted by priority
    pub fn register_observer(&mut self, observer: Box<dyn HookObserver>) {
        let hook = observer.hook();
        let name = observer.name();
        let observers = self.observers.entry(hook).or_default();
        observers.push(observer);
        observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for hook {:?}", name, hook);
    }

    pub fn observer_count(&self, hook: Hook) -> usize {
        self.observers.get(&hook).map_or(0, Vec::len)
    }

    /// Run every applicable observer for `ctx.hook`; the first failure aborts
    pub async fn run(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let Some(observers) = self.observers.get(&ctx.hook) else {
            tracing::trace!("No observers registered for hook {:?}", ctx.hook);
            return Ok(());
        };

        for observer in observers {
            if !observer.applies_to(ctx) {
                tracing::trace!("Observer {} skipped for hook {:?}", observer.name(), ctx.hook);
                continue;
            }

            let observer_start = Instant::now();
            match timeout(observer.timeout(), observer.execute(ctx)).await {
                Ok(Ok(())) => {
                    tracing::debug!(
                        "Observer: {} completed successfully in {:?}",
                        observer.name(),
                        observer_start.elapsed()
                    );
                }
                Ok(Err(error)) => {
                    tracing::warn!(
                        "Observer: {} failed in {:?}: {}",
                        observer.name(),
                        observer_start.elapsed(),
                        error
                    );
                    return Err(error);
                }
                Err(_elapsed) => {
                    tracing::error!("Observer: {} timed out after {:?}", observer.name(), observer.timeout());
                    return Err(ObserverError::TimeoutError(format!(
                        "Observer {} timed out after {:?}",
                        observer.name(),
                        observer.timeout()
                    )));
                }
            }
        }

        tracing::debug!("Hook {:?} finished in {:?}", ctx.hook, ctx.execution_time());
        Ok(())
    }
}

impl Default for ObserverPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}

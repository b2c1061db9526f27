// PreSave: the deleted flag is always persisted as a boolean
use async_trait::async_trait;
use serde_json::Value;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Hook, HookObserver, Observer};

#[derive(Default)]
pub struct DefaultDeletedFlagObserver;

impl Observer for DefaultDeletedFlagObserver {
    fn name(&self) -> &'static str {
        "DefaultDeletedFlagObserver"
    }

    fn hook(&self) -> Hook {
        Hook::PreSave
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl HookObserver for DefaultDeletedFlagObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let field = ctx.descriptor.deleted_field().to_string();
        let Some(document) = ctx.document_mut() else {
            return Err(ObserverError::PipelineError(
                "DefaultDeletedFlagObserver requires a save payload".to_string(),
            ));
        };

        match document.get(&field) {
            Some(Value::Bool(_)) => {}
            Some(value) if !is_falsy(value) => {
                return Err(ObserverError::ValidationError(format!(
                    "'{}' must be a boolean, got {}",
                    field, value
                )));
            }
            _ => {
                tracing::trace!("Defaulting '{}' to false before save", field);
                document.insert(field, Value::Bool(false));
            }
        }
        Ok(())
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

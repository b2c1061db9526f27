// Argument normalization for overloaded call shapes
//
// Update-style operations accept any prefix of (conditions, document, options)
// followed by an optional completion handler, and the handler may appear in
// place of any omitted argument. Resolution is by pattern matching on the
// positional slots, first match wins.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

use crate::database::store::{StoreError, UpdateCommand, ID_FIELD};
use crate::error::SoftDeleteError;
use crate::filter::QueryOptions;
use crate::types::Document;

/// Completion handler: receives the serialized outcome or the store error
pub type Completion = Box<dyn FnOnce(Result<&Value, &StoreError>) + Send>;

/// One positional argument as supplied by the caller
pub enum Arg {
    Value(Value),
    Callback(Completion),
}

impl Arg {
    pub fn callback<F>(handler: F) -> Self
    where
        F: FnOnce(Result<&Value, &StoreError>) + Send + 'static,
    {
        Arg::Callback(Box::new(handler))
    }

    fn is_absent(slot: &Option<Arg>) -> bool {
        matches!(slot, None | Some(Arg::Value(Value::Null)))
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => write!(f, "Value({})", value),
            Arg::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<Document> for Arg {
    fn from(document: Document) -> Self {
        Arg::Value(Value::Object(document))
    }
}

impl From<QueryOptions> for Arg {
    fn from(options: QueryOptions) -> Self {
        Arg::Value(serde_json::to_value(options).unwrap_or(Value::Null))
    }
}

/// Positional call arguments, in the order the caller supplied them
#[derive(Debug, Default)]
pub struct CallArgs {
    args: Vec<Arg>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next positional argument
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a completion handler as the next positional argument
    pub fn callback<F>(self, handler: F) -> Self
    where
        F: FnOnce(Result<&Value, &StoreError>) + Send + 'static,
    {
        self.arg(Arg::callback(handler))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Split into exactly N optional slots; more than N arguments is misuse
    fn into_slots<const N: usize>(self, operation: &str) -> Result<[Option<Arg>; N], SoftDeleteError> {
        if self.args.len() > N {
            return Err(SoftDeleteError::invocation(format!(
                "{} accepts at most {} arguments, got {}",
                operation,
                N,
                self.args.len()
            )));
        }
        let mut iter = self.args.into_iter();
        Ok(std::array::from_fn(|_| iter.next()))
    }
}

impl From<Vec<Arg>> for CallArgs {
    fn from(args: Vec<Arg>) -> Self {
        Self { args }
    }
}

/// Canonical update arguments: each slot independently optional
#[derive(Default)]
pub struct UpdateArgs {
    pub conditions: Option<Document>,
    pub update: Option<Document>,
    pub options: Option<QueryOptions>,
    pub handler: Option<Completion>,
}

impl fmt::Debug for UpdateArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateArgs")
            .field("conditions", &self.conditions)
            .field("update", &self.update)
            .field("options", &self.options)
            .field("handler", &self.handler.as_ref().map(|_| "Callback(..)"))
            .finish()
    }
}

impl UpdateArgs {
    pub fn new(conditions: Document, update: Document) -> Self {
        Self {
            conditions: Some(conditions),
            update: Some(update),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(Result<&Value, &StoreError>) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Resolve an overloaded positional call into canonical slots
    pub fn normalize(args: CallArgs) -> Result<Self, SoftDeleteError> {
        let [conditions, document, options, handler] = args.into_slots::<4>("update")?;

        let (conditions, document, options, handler) = match (conditions, document, options, handler) {
            // .update(conditions, doc, callback)
            (c, d, Some(Arg::Callback(cb)), _) => (c, d, None, Some(cb)),
            // .update(doc, callback)
            (c, Some(Arg::Callback(cb)), _, _) => {
                (Some(Arg::Value(Value::Object(Document::new()))), c, None, Some(cb))
            }
            // .update(callback)
            (Some(Arg::Callback(cb)), _, _, _) => (None, None, None, Some(cb)),
            // .update(doc)
            (Some(Arg::Value(Value::Object(doc))), d, o, h)
                if Arg::is_absent(&d) && Arg::is_absent(&o) && Arg::is_absent(&h) =>
            {
                (None, Some(Arg::Value(Value::Object(doc))), None, None)
            }
            (c, d, o, Some(Arg::Callback(cb))) => (c, d, o, Some(cb)),
            (c, d, o, None | Some(Arg::Value(Value::Null))) => (c, d, o, None),
            (_, _, _, Some(Arg::Value(other))) => {
                return Err(SoftDeleteError::invocation(format!(
                    "completion handler position holds a non-callable value: {}",
                    other
                )))
            }
        };

        Ok(Self {
            conditions: document_slot(conditions, "conditions")?,
            update: document_slot(document, "document")?,
            options: options_slot(options)?,
            handler,
        })
    }

    /// Split into the store request and the completion handler
    pub fn into_command(self) -> (UpdateCommand, Option<Completion>) {
        let command = UpdateCommand {
            conditions: self.conditions,
            update: self.update,
            options: self.options.unwrap_or_default(),
        };
        (command, self.handler)
    }
}

/// Either a positional call to normalize or already-canonical arguments
pub enum UpdateCall {
    Positional(CallArgs),
    Canonical(UpdateArgs),
}

impl UpdateCall {
    pub fn resolve(self) -> Result<UpdateArgs, SoftDeleteError> {
        match self {
            UpdateCall::Positional(args) => UpdateArgs::normalize(args),
            UpdateCall::Canonical(args) => Ok(args),
        }
    }
}

impl From<CallArgs> for UpdateCall {
    fn from(args: CallArgs) -> Self {
        UpdateCall::Positional(args)
    }
}

impl From<UpdateArgs> for UpdateCall {
    fn from(args: UpdateArgs) -> Self {
        UpdateCall::Canonical(args)
    }
}

/// Canonical arguments for bulk delete
#[derive(Default)]
pub struct DeleteArgs {
    pub conditions: Document,
    pub deleted_by: Option<Value>,
    pub handler: Option<Completion>,
}

impl fmt::Debug for DeleteArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteArgs")
            .field("conditions", &self.conditions)
            .field("deleted_by", &self.deleted_by)
            .field("handler", &self.handler.as_ref().map(|_| "Callback(..)"))
            .finish()
    }
}

impl DeleteArgs {
    /// `(conditions, deletedBy, callback)`, `(conditions, callback)` or `(callback)`
    pub fn normalize(args: CallArgs) -> Result<Self, SoftDeleteError> {
        let [conditions, deleted_by, handler] = args.into_slots::<3>("delete")?;

        let (conditions, deleted_by, handler) = match (conditions, deleted_by, handler) {
            (c, Some(Arg::Callback(cb)), _) => (c, None, Some(cb)),
            (Some(Arg::Callback(cb)), _, _) => (None, None, Some(cb)),
            (c, by, Some(Arg::Callback(cb))) => (c, by, Some(cb)),
            (c, by, None | Some(Arg::Value(Value::Null))) => (c, by, None),
            (_, _, Some(Arg::Value(_))) => {
                return Err(SoftDeleteError::invocation(
                    "completion handler position holds a non-callable value",
                ))
            }
        };

        Ok(Self {
            conditions: document_slot(conditions, "conditions")?.unwrap_or_default(),
            deleted_by: value_slot(deleted_by),
            handler,
        })
    }

    /// `(id, deletedBy, callback)`; the id is mandatory and must not be a callback
    pub fn normalize_by_id(args: CallArgs) -> Result<Self, SoftDeleteError> {
        let [id, deleted_by, handler] = args.into_slots::<3>("deleteById")?;

        let id = match id {
            Some(Arg::Value(id)) => id,
            None | Some(Arg::Callback(_)) => {
                return Err(SoftDeleteError::invocation(
                    "First argument is mandatory and must not be a function.",
                ))
            }
        };

        let mut rest = CallArgs::from(vec![Arg::Value(json!({ ID_FIELD: id }))]);
        rest.args.extend(deleted_by);
        rest.args.extend(handler);
        Self::normalize(rest)
    }
}

/// Canonical arguments for bulk restore
#[derive(Default)]
pub struct RestoreArgs {
    pub conditions: Document,
    pub handler: Option<Completion>,
}

impl fmt::Debug for RestoreArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestoreArgs")
            .field("conditions", &self.conditions)
            .field("handler", &self.handler.as_ref().map(|_| "Callback(..)"))
            .finish()
    }
}

impl RestoreArgs {
    /// `(conditions, callback)` or `(callback)`
    pub fn normalize(args: CallArgs) -> Result<Self, SoftDeleteError> {
        let [conditions, handler] = args.into_slots::<2>("restore")?;

        let (conditions, handler) = match (conditions, handler) {
            (Some(Arg::Callback(cb)), _) => (None, Some(cb)),
            (c, Some(Arg::Callback(cb))) => (c, Some(cb)),
            (c, None | Some(Arg::Value(Value::Null))) => (c, None),
            (_, Some(Arg::Value(_))) => {
                return Err(SoftDeleteError::invocation(
                    "completion handler position holds a non-callable value",
                ))
            }
        };

        Ok(Self {
            conditions: document_slot(conditions, "conditions")?.unwrap_or_default(),
            handler,
        })
    }
}

/// Hand the outcome to the handler, if any, after the store call completes
pub fn complete<T: Serialize>(handler: Option<Completion>, result: &Result<T, StoreError>) {
    if let Some(handler) = handler {
        match result {
            Ok(output) => {
                let value = serde_json::to_value(output).unwrap_or(Value::Null);
                handler(Ok(&value));
            }
            Err(error) => handler(Err(error)),
        }
    }
}

fn document_slot(slot: Option<Arg>, name: &str) -> Result<Option<Document>, SoftDeleteError> {
    match slot {
        None | Some(Arg::Value(Value::Null)) => Ok(None),
        Some(Arg::Value(Value::Object(document))) => Ok(Some(document)),
        Some(Arg::Value(other)) => Err(SoftDeleteError::invocation(format!(
            "{} must be a document, got {}",
            name, other
        ))),
        Some(Arg::Callback(_)) => Err(SoftDeleteError::invocation(format!(
            "{} must be a document, got a callback",
            name
        ))),
    }
}

fn options_slot(slot: Option<Arg>) -> Result<Option<QueryOptions>, SoftDeleteError> {
    match document_slot(slot, "options")? {
        None => Ok(None),
        Some(document) => Ok(Some(QueryOptions::from_document(document)?)),
    }
}

fn value_slot(slot: Option<Arg>) -> Option<Value> {
    match slot {
        Some(Arg::Value(Value::Null)) | None | Some(Arg::Callback(_)) => None,
        Some(Arg::Value(value)) => Some(value),
    }
}

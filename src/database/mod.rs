pub mod store;
pub mod record;
pub mod arguments;
pub mod aggregate;
pub mod model;
pub mod lifecycle;
pub mod memory;

pub use store::{document_id, DocumentStore, SaveCommand, SaveOptions, StoreError, UpdateCommand, UpdateResult, ID_FIELD};
pub use record::Entity;
pub use arguments::{Arg, CallArgs, Completion, DeleteArgs, RestoreArgs, UpdateArgs, UpdateCall};
pub use aggregate::{PipelineDecision, SHOW_ALL_DOCUMENTS};
pub use model::SoftDeleteModel;
pub use memory::{MemoryStore, StoreCall};

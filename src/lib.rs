pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod observer;
pub mod schema;
pub mod types;

pub use config::SoftDeleteConfig;
pub use database::{CallArgs, DocumentStore, Entity, MemoryStore, SoftDeleteModel, StoreError, UpdateArgs};
pub use error::SoftDeleteError;
pub use filter::{Query, QueryOptions};
pub use schema::SoftDeleteDescriptor;
pub use types::{Document, Method, Variant, Visibility};

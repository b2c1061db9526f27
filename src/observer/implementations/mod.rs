pub mod default_deleted_flag;
pub mod aggregate_visibility;

pub use default_deleted_flag::DefaultDeletedFlagObserver;
pub use aggregate_visibility::AggregateVisibilityObserver;

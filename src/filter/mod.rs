pub mod types;
pub mod query;
pub mod predicate;
pub mod filter_where;
pub mod filter_order;
pub mod error;

pub use types::*;
pub use query::Query;
pub use filter_where::FilterWhere;
pub use error::FilterError;

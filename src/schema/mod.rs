pub mod fields;
pub mod index;
pub mod declaration;
pub mod descriptor;

pub use fields::FieldNames;
pub use index::IndexFlags;
pub use declaration::{FieldDeclaration, FieldKind};
pub use descriptor::SoftDeleteDescriptor;

pub mod object_type;

pub use object_type::{ObjectType, PathTable};

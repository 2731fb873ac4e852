//! Type-tree decoding: the flat field list, the Registrar that turns it
//! into an indexable arena, and the generic deserializer that walks it.

pub mod builder;
pub mod deserializer;
pub mod parser;
pub mod strings;
pub mod types;

pub use builder::register_type_tree;
pub use deserializer::deserialize;
pub use parser::parse_type_tree;
pub use types::{ClassView, TypeField, TypeTree};

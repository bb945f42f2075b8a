pub mod error;
pub mod resolver;

pub use error::NamespaceError;
pub use resolver::{NamespaceGraph, ValidationReport};

pub mod model;
pub mod name;
pub mod validate;

pub use model::{ComponentInstance, PageDocument, PageRecord};
pub use validate::{validate, validate_document, ValidationReport};

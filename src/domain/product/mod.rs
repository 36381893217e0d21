// ============================================================================
// Product Domain - Catalog entries and their stock balance
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod entity;
pub mod catalog;

pub use value_objects::{ProductCategory, ProductId};
pub use errors::ProductError;
pub use entity::{NewProduct, Product, ProductQuery, ProductUpdate};
pub use catalog::ProductCatalog;

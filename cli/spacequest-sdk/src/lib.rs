pub mod models;
pub mod utils;

pub use spacequest_catalog as catalog;

pub mod error;
pub mod export;
pub mod human;
pub mod metadata;
pub mod model;
pub mod query;
pub mod scanner;

pub use error::TreeError;
pub use metadata::{extension_of, RawEntry};
pub use model::*;
pub use query::Files;
pub use scanner::*;

pub mod json;
pub mod query;

pub use json::Json;
pub use query::Query;

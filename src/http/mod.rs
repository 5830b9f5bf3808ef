// HTTP boundary: routing, query clamping, image path safety

pub mod image;
pub mod query;
pub mod response;
pub mod routes;

pub use routes::{router, AppState};

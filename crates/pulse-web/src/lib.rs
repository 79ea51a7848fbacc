pub mod api;

pub use api::{build_router, ApiServer};

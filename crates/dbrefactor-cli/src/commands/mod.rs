pub mod config;
pub mod plan;
pub mod schema;
pub mod session;
pub mod suggest;
pub mod sync;

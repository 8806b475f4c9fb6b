//! Shared server state.

pub mod params;
pub mod store;

pub use params::ParamRegistry;
pub use store::AppState;

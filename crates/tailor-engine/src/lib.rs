pub mod active;
pub mod config;
pub mod controller;
pub mod counter;
pub mod enablement;
pub mod host;
pub mod session;
pub mod store;
pub mod tab_map;
pub mod tracker;

pub use tailor_common::error;
pub use tailor_common::model;
pub use tailor_common::protocol;

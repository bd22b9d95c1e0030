pub mod error;
pub mod model;
pub mod protocol;

pub use model::TabId;

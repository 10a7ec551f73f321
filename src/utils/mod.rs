// Utility functions
pub mod error;
pub mod ids;
pub mod pagination;

pub use error::*;
pub use ids::*;
pub use pagination::*;

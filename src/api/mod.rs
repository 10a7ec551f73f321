pub mod auth;
pub mod health;
pub mod sheets;
pub mod stats;
pub mod swagger;

pub mod auth_service;
pub mod problem_service;
pub mod rating_service;
pub mod sheet_service;
pub mod stats_service;

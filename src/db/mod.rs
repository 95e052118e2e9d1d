pub mod booking_repo;
pub mod ground_repo;
pub mod models;
pub mod report_repo;
pub mod user_repo;

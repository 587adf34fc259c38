pub mod branches;
pub mod connection_logs;
pub mod dashboard;
pub mod products;
pub mod users;

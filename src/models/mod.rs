pub mod admin_log;
pub mod booking;
pub mod driver;
pub mod event;
pub mod review;
pub mod tracking;
pub mod user;
pub mod vehicle;

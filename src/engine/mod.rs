pub mod analytics;
pub mod assignment;
pub mod lifecycle;
pub mod pricing;
pub mod queue;
pub mod reviews;
pub mod tracking;

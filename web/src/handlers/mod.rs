//! HTTP request handlers, organized by resource.

pub mod health;
pub mod rides;
pub mod users;
pub mod vehicles;

pub use health::health_check;

// Presentation layer - HTTP surface of the dashboard
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod html;

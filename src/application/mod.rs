// Application layer - The refresh pipeline and the use cases around it
pub mod dashboard_service;
pub mod data_source;
pub mod normalize;
pub mod refresh;
pub mod render;

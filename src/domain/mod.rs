// Domain layer - Pipeline data model, free of I/O
pub mod artifact;
pub mod error;
pub mod panel;
pub mod source;
pub mod table;

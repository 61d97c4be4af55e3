pub mod api;
pub mod config;
pub mod gemini;
pub mod handler;
pub mod report;

pub mod config;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod review;
pub mod store;
pub mod validators;

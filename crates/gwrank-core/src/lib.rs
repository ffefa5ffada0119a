pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod probe;
pub mod rank;
pub mod report;
pub mod scoring;
pub mod table;

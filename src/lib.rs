pub mod agents;
pub mod ai;
pub mod config;
pub mod export;
pub mod http;
pub mod orchestrator;
pub mod pool;
pub mod tools;

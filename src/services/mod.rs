pub mod generator;
pub mod images;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod scenes;
pub mod storage;
pub mod store;

pub mod model_client;
pub mod orchestrator;
pub mod prompt;
pub mod request;

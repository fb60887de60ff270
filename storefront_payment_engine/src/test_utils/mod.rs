//! Test doubles for the engine's storage and gateway seams.

mod memory_store;
mod scripted_gateway;

pub use memory_store::MemoryStore;
pub use scripted_gateway::ScriptedGateway;

/// Loads `.env` and initializes logging for a test run. Safe to call more than once.
pub fn prepare_env() {
    let _ = dotenvy::dotenv();
    let _ = env_logger::try_init();
}

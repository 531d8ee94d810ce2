/// Shared types, traits, and errors for EduBot.
///
/// This crate is the foundation that the other EduBot crates depend on.
/// It contains:
/// - **Catalog types** (`catalog`) for courses, FAQs and catalog snapshots
/// - **Message types** (`messages`) for channel traffic and LLM completions
/// - **Trait contracts** (`traits`) for catalog sources, LLM providers and channels
/// - **Error types** (`errors`) for unified error handling
/// - **Config types** (`config`) and the loader (`config_loader`)
pub mod catalog;
pub mod config;
pub mod config_loader;
pub mod errors;
pub mod messages;
pub mod traits;

// Re-export commonly used types at the crate root for convenience.
pub use catalog::*;
pub use errors::BotError;
pub use messages::*;
pub use traits::*;

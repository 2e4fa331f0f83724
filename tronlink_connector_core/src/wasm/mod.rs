// WASM-specific implementations
pub mod utils;
pub mod provider;
pub mod host;
pub mod actions;
pub mod signer;

// Re-exports
pub use provider::JsProvider;
pub use host::WindowHost;
pub use actions::JsActions;
pub use signer::JsTronWeb;
pub use utils::*;

pub mod handler;
pub mod models;
pub mod parser;
pub mod settings;
pub mod utils;

// Re-export the main editor types for easier access
pub use handler::{HandlerError, IniHandler, IniValues};

// Re-export document types
pub use models::{IniDocument, SectionMap};
pub use settings::HandlerOptions;

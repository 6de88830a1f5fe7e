//! Settings for the INI handler

pub mod handler_options;

pub use handler_options::HandlerOptions;

pub mod file;

// Re-export common utilities
pub use file::{display_path, file_exists, read_file, write_file};

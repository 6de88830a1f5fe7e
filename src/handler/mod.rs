pub mod ini_handler;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::DocumentError;
use crate::parser::ParseError;

pub use ini_handler::{IniHandler, IniValues};

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{} not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("SectionError, No such a section named {0}")]
    SectionError(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Values error: {0}")]
    Values(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

//! Data models for INI documents
//!
//! The document types are kept separate from the file handling that
//! operates on them.
//!
//! ```rust
//! use ini_handler::models::IniDocument;
//!
//! let mut doc: IniDocument = "[server]\nport = 80\n".parse().unwrap();
//! doc.set("server", "port", Some("8080")).unwrap();
//! assert_eq!(doc.to_string(), "[server]\nport = 8080\n");
//! ```

pub mod ini_document;

pub use ini_document::{DocumentError, Entry, IniDocument, Line, Section, SectionMap};

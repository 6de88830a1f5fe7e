//! INI file editor
//!
//! Checks that a file and section exist (optionally creating the section)
//! and writes option values back without disturbing the rest of the file.

use configparser::ini::Ini;
use log::{debug, error, info};
use std::collections::HashMap;
use std::path::Path;

use super::HandlerError;
use crate::models::{DocumentError, IniDocument};
use crate::settings::HandlerOptions;
use crate::utils::file::{display_path, file_exists, read_file, write_file};

/// Plain section -> option -> value map as read by `configparser`
pub type IniValues = HashMap<String, HashMap<String, Option<String>>>;

/// Editor for INI files on disk
///
/// The parsed document of the last file touched is cached on the handler and
/// reloaded from disk by every validation.
#[derive(Debug, Clone, Default)]
pub struct IniHandler {
    options: HandlerOptions,
    document: Option<IniDocument>,
}

impl IniHandler {
    pub fn new(options: HandlerOptions) -> Self {
        IniHandler {
            options,
            document: None,
        }
    }

    /// Create a handler with options read from a TOML file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, HandlerError> {
        let options = HandlerOptions::from_file(path)
            .map_err(|e| HandlerError::Settings(e.to_string()))?;
        Ok(Self::new(options))
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// The document loaded by the last call, if any
    pub fn document(&self) -> Option<&IniDocument> {
        self.document.as_ref()
    }

    /// Check that `path` exists and has `section`
    ///
    /// A missing section is added to the cached document when `creatable` is
    /// set; nothing is written to disk here.
    pub fn validate<P: AsRef<Path>>(
        &mut self,
        path: P,
        section: &str,
        creatable: bool,
    ) -> Result<(), HandlerError> {
        self.open_section(path.as_ref(), section, creatable)?;
        Ok(())
    }

    /// Set one option and write the file
    pub fn set_single_value<P: AsRef<Path>>(
        &mut self,
        path: P,
        section: &str,
        option: &str,
        value: &str,
        creatable: bool,
    ) -> Result<(), HandlerError> {
        self.set_option(path, section, option, Some(value), creatable)
    }

    /// Set one option, `None` writes a bare option name
    pub fn set_option<P: AsRef<Path>>(
        &mut self,
        path: P,
        section: &str,
        option: &str,
        value: Option<&str>,
        creatable: bool,
    ) -> Result<(), HandlerError> {
        let path = path.as_ref();
        let result = self.write_with(path, section, creatable, |document| {
            document.set(section, option, value)?;
            Ok(true)
        });
        report(path, result).map(|_| ())
    }

    /// Set several options and write the file once
    ///
    /// The first rejected pair abandons the whole write.
    pub fn set_multiple_values<P, I, K, V>(
        &mut self,
        path: P,
        section: &str,
        options_values: I,
        creatable: bool,
    ) -> Result<(), HandlerError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let path = path.as_ref();
        let result = self.write_with(path, section, creatable, |document| {
            for (option, value) in options_values {
                document.set(section, option.as_ref(), Some(value.as_ref()))?;
            }
            Ok(true)
        });
        report(path, result).map(|_| ())
    }

    /// Remove an option, returns whether it existed
    pub fn remove_option<P: AsRef<Path>>(
        &mut self,
        path: P,
        section: &str,
        option: &str,
    ) -> Result<bool, HandlerError> {
        let path = path.as_ref();
        let result = self.write_with(path, section, false, |document| {
            document.remove_option(section, option)
        });
        report(path, result)
    }

    /// Remove a section with all its options, returns whether it existed
    pub fn remove_section<P: AsRef<Path>>(
        &mut self,
        path: P,
        section: &str,
    ) -> Result<bool, HandlerError> {
        let path = path.as_ref();
        let result = self.load(path).and_then(|document| {
            let removed = document.remove_section(section);
            if removed {
                write_file(path, &document.to_string())?;
            }
            Ok(removed)
        });
        if result.is_err() {
            self.document = None;
        }
        report(path, result)
    }

    /// Load and return the document at `path`
    pub fn read_document<P: AsRef<Path>>(&mut self, path: P) -> Result<IniDocument, HandlerError> {
        Ok(self.load(path.as_ref())?.clone())
    }

    /// Read plain values through `configparser`, formatting is not kept
    pub fn read_values<P: AsRef<Path>>(&self, path: P) -> Result<IniValues, HandlerError> {
        let path = path.as_ref();
        if !file_exists(path) {
            return Err(HandlerError::FileNotFound(path.to_path_buf()));
        }

        let mut config = Ini::new_cs();
        config.load(path).map_err(HandlerError::Values)
    }

    fn load(&mut self, path: &Path) -> Result<&mut IniDocument, HandlerError> {
        if !file_exists(path) {
            return Err(HandlerError::FileNotFound(path.to_path_buf()));
        }

        let content = read_file(path)?;
        let document =
            IniDocument::parse(&content, &self.options).map_err(|source| HandlerError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Loaded {}", display_path(path));
        Ok(self.document.insert(document))
    }

    fn open_section(
        &mut self,
        path: &Path,
        section: &str,
        creatable: bool,
    ) -> Result<&mut IniDocument, HandlerError> {
        let document = self.load(path)?;
        if !document.has_section(section) {
            if !creatable {
                return Err(HandlerError::SectionError(section.to_string()));
            }
            document.add_section(section)?;
            debug!("Created section [{}] in {}", section, display_path(path));
        }
        Ok(document)
    }

    /// Apply `edit` to the validated document and write it when it reports a change
    fn write_with<F>(
        &mut self,
        path: &Path,
        section: &str,
        creatable: bool,
        edit: F,
    ) -> Result<bool, HandlerError>
    where
        F: FnOnce(&mut IniDocument) -> Result<bool, DocumentError>,
    {
        let document = self.open_section(path, section, creatable)?;
        let outcome = edit(&mut *document).map_err(HandlerError::from).and_then(|changed| {
            if changed {
                write_file(path, &document.to_string())?;
            }
            Ok(changed)
        });

        if outcome.is_err() {
            // never leave a half-applied edit in the cache
            self.document = None;
        }
        outcome
    }
}

/// Log the outcome of a write operation and hand it back to the caller
fn report(path: &Path, result: Result<bool, HandlerError>) -> Result<bool, HandlerError> {
    match &result {
        Ok(true) => info!("modify {} successfully", display_path(path)),
        Ok(false) => debug!("Nothing to modify in {}", display_path(path)),
        Err(e) => error!("Failed to modify {}: {}", display_path(path), e),
    }
    result
}

use serde::Deserialize;
use std::path::Path;

/// Options controlling how INI documents are parsed and written
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandlerOptions {
    /// Allow options without a value (a bare `key` line)
    pub allow_no_value: bool,
    /// Reject duplicate sections and duplicate options within a section
    pub strict: bool,
    /// Keep option names as written; when off they are compared in lower case
    pub case_sensitive: bool,
    /// Write `key = value` instead of `key=value` for new lines
    pub space_around_delimiters: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            allow_no_value: true,
            strict: false,
            case_sensitive: true,
            space_around_delimiters: true,
        }
    }
}

impl HandlerOptions {
    pub fn new(allow_no_value: bool, strict: bool) -> Self {
        HandlerOptions {
            allow_no_value,
            strict,
            ..Default::default()
        }
    }

    /// Load options from TOML content, missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load options from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }

    /// Normalize an option name the way lookups and new lines expect it
    pub fn option_key(&self, option: &str) -> String {
        if self.case_sensitive {
            option.to_string()
        } else {
            option.to_lowercase()
        }
    }
}

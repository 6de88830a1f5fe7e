//! Format-preserving INI document
//!
//! The document keeps every line of the source text. Lines that are never
//! touched are written back byte-for-byte; an option whose value changes is
//! re-rendered from its original key spelling and delimiter spacing.

use linked_hash_map::LinkedHashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::parser::{parse_ini, ParseError};
use crate::settings::HandlerOptions;

/// Ordered section -> option -> value view of a document
pub type SectionMap = LinkedHashMap<String, LinkedHashMap<String, Option<String>>>;

/// Errors raised when editing a document in memory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("No such a section named {0}")]
    NoSuchSection(String),

    #[error("Section {0} already exists")]
    DuplicateSection(String),

    #[error("Invalid section name: {0:?}")]
    InvalidSection(String),

    #[error("Invalid option name: {0:?}")]
    InvalidOption(String),

    #[error("Invalid value for option {option}: {value:?}")]
    InvalidValue { option: String, value: String },

    #[error("Option {0} needs a value")]
    NoValueNotAllowed(String),
}

/// A single `key = value` (or bare `key`) entry with its continuation lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub(crate) key: String,
    pub(crate) value: Option<String>,
    /// Source text up to the end of the key, indentation included
    pub(crate) head: String,
    /// Source text between the key and the value, `None` for a bare key
    pub(crate) tail: Option<String>,
    /// Line terminator of the entry's last line
    pub(crate) eol: String,
    /// Original lines, dropped once the value is modified
    pub(crate) raw: Option<Vec<String>>,
}

impl Entry {
    pub(crate) fn new(
        key: String,
        value: Option<String>,
        options: &HandlerOptions,
        eol: &str,
    ) -> Self {
        let tail = value.as_ref().map(|_| delimiter(options).to_string());
        Entry {
            head: key.clone(),
            key,
            value,
            tail,
            eol: eol.to_string(),
            raw: None,
        }
    }

    /// Option name as written in the file
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub(crate) fn set_value(&mut self, value: Option<String>, options: &HandlerOptions) {
        if let Some(new_value) = value.as_deref() {
            let had_value = self.value.as_deref().is_some_and(|v| !v.is_empty());
            match self.tail.as_mut() {
                // "key =" with an empty value gets the space it was missing
                Some(tail)
                    if !had_value
                        && !new_value.is_empty()
                        && tail.starts_with(char::is_whitespace)
                        && !tail.ends_with(char::is_whitespace) =>
                {
                    tail.push(' ')
                }
                Some(_) => {}
                None => self.tail = Some(delimiter(options).to_string()),
            }
        }
        self.value = value;
        self.raw = None;
    }

    fn render(&self, out: &mut Vec<String>) {
        match &self.raw {
            Some(raw) => out.extend(raw.iter().cloned()),
            None => match (&self.value, &self.tail) {
                (Some(value), Some(tail)) => {
                    out.push(format!("{}{}{}{}", self.head, tail, value, self.eol))
                }
                _ => out.push(format!("{}{}", self.head, self.eol)),
            },
        }
    }
}

/// One line of a section body or of the preamble
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank(String),
    Comment(String),
    Entry(Entry),
}

impl Line {
    fn is_blank(&self) -> bool {
        matches!(self, Line::Blank(_))
    }

    fn render(&self, out: &mut Vec<String>) {
        match self {
            Line::Blank(text) | Line::Comment(text) => out.push(text.clone()),
            Line::Entry(entry) => entry.render(out),
        }
    }
}

/// A `[name]` header followed by its lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub(crate) name: String,
    pub(crate) header: String,
    pub(crate) lines: Vec<Line>,
}

impl Section {
    pub(crate) fn new(name: &str, eol: &str) -> Self {
        Section {
            name: name.to_string(),
            header: format!("[{}]{}", name, eol),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    fn position(&self, key: &str, options: &HandlerOptions) -> Option<usize> {
        self.lines.iter().position(|line| match line {
            Line::Entry(entry) => options.option_key(&entry.key) == key,
            _ => false,
        })
    }

    fn find(&self, key: &str, options: &HandlerOptions) -> Option<&Entry> {
        self.position(key, options)
            .and_then(|index| match &self.lines[index] {
                Line::Entry(entry) => Some(entry),
                _ => None,
            })
    }

    fn render(&self, out: &mut Vec<String>) {
        out.push(self.header.clone());
        for line in &self.lines {
            line.render(out);
        }
    }
}

/// Parsed INI document that can be modified and written back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    pub(crate) options: HandlerOptions,
    pub(crate) preamble: Vec<Line>,
    pub(crate) sections: Vec<Section>,
    /// Terminator for lines added to the document
    pub(crate) newline: &'static str,
}

impl Default for IniDocument {
    fn default() -> Self {
        Self::new(HandlerOptions::default())
    }
}

impl IniDocument {
    /// Create an empty document
    pub fn new(options: HandlerOptions) -> Self {
        IniDocument {
            options,
            preamble: Vec::new(),
            sections: Vec::new(),
            newline: "\n",
        }
    }

    /// Parse INI text with the given options
    pub fn parse(content: &str, options: &HandlerOptions) -> Result<Self, ParseError> {
        parse_ini(content, options)
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Section names in file order, each name once
    pub fn sections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for section in &self.sections {
            if !names.contains(&section.name.as_str()) {
                names.push(&section.name);
            }
        }
        names
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.section_index(section).is_some()
    }

    pub fn section(&self, section: &str) -> Option<&Section> {
        self.section_index(section).map(|index| &self.sections[index])
    }

    /// Append an empty section at the end of the document
    pub fn add_section(&mut self, section: &str) -> Result<(), DocumentError> {
        validate_section_name(section)?;
        if self.has_section(section) {
            return Err(DocumentError::DuplicateSection(section.to_string()));
        }

        let ends_with_content = match self.sections.last() {
            Some(last) => last.lines.last().map_or(true, |line| !line.is_blank()),
            None => self.preamble.last().is_some_and(|line| !line.is_blank()),
        };
        if ends_with_content {
            let blank = Line::Blank(self.newline.to_string());
            match self.sections.last_mut() {
                Some(last) => last.lines.push(blank),
                None => self.preamble.push(blank),
            }
        }

        self.sections.push(Section::new(section, self.newline));
        Ok(())
    }

    /// Remove every block with this section name, returns whether one existed
    pub fn remove_section(&mut self, section: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != section);
        before != self.sections.len()
    }

    /// Option names of a section as written in the file
    pub fn options_of(&self, section: &str) -> Vec<&str> {
        self.section(section)
            .map(|s| s.entries().map(|entry| entry.key()).collect())
            .unwrap_or_default()
    }

    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.get(section, option).is_some()
    }

    /// Look up an option entry
    pub fn get(&self, section: &str, option: &str) -> Option<&Entry> {
        let key = self.options.option_key(option);
        self.section(section)
            .and_then(|s| s.find(&key, &self.options))
    }

    /// Value of an option, `None` when missing or when the option has no value
    pub fn get_value(&self, section: &str, option: &str) -> Option<&str> {
        self.get(section, option).and_then(|entry| entry.value())
    }

    /// Set an option in an existing section, adding the option if needed
    pub fn set(
        &mut self,
        section: &str,
        option: &str,
        value: Option<&str>,
    ) -> Result<(), DocumentError> {
        validate_option_name(option)?;
        match value {
            Some(value) => validate_value(option, value)?,
            None if !self.options.allow_no_value => {
                return Err(DocumentError::NoValueNotAllowed(option.to_string()))
            }
            None => {}
        }

        let index = self
            .section_index(section)
            .ok_or_else(|| DocumentError::NoSuchSection(section.to_string()))?;
        let options = &self.options;
        let target = &mut self.sections[index];
        let key = options.option_key(option);
        let value = value.map(str::to_string);

        match target.position(&key, options) {
            Some(position) => {
                if let Line::Entry(entry) = &mut target.lines[position] {
                    entry.set_value(value, options);
                }
            }
            None => {
                let insert_at = target
                    .lines
                    .iter()
                    .rposition(|line| !line.is_blank())
                    .map_or(0, |last| last + 1);
                let entry = Entry::new(key, value, options, self.newline);
                target.lines.insert(insert_at, Line::Entry(entry));
            }
        }
        Ok(())
    }

    /// Remove an option, returns whether it existed
    pub fn remove_option(&mut self, section: &str, option: &str) -> Result<bool, DocumentError> {
        let index = self
            .section_index(section)
            .ok_or_else(|| DocumentError::NoSuchSection(section.to_string()))?;
        let key = self.options.option_key(option);
        let options = &self.options;
        let target = &mut self.sections[index];
        match target.position(&key, options) {
            Some(position) => {
                target.lines.remove(position);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Ordered map of every section and option, first occurrence wins
    pub fn to_map(&self) -> SectionMap {
        let mut map = SectionMap::new();
        for section in &self.sections {
            if map.contains_key(&section.name) {
                continue;
            }
            let mut items = LinkedHashMap::new();
            for entry in section.entries() {
                let key = self.options.option_key(&entry.key);
                if !items.contains_key(&key) {
                    items.insert(key, entry.value.clone());
                }
            }
            map.insert(section.name.clone(), items);
        }
        map
    }

    fn section_index(&self, section: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == section)
    }
}

impl FromStr for IniDocument {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ini(s, &HandlerOptions::default())
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        for line in &self.preamble {
            line.render(&mut lines);
        }
        for section in &self.sections {
            section.render(&mut lines);
        }
        let last = lines.len().saturating_sub(1);
        for (index, line) in lines.iter().enumerate() {
            f.write_str(line)?;
            // a formerly last line without terminator gets one once lines follow it
            if index < last && !line.ends_with('\n') {
                f.write_str(self.newline)?;
            }
        }
        Ok(())
    }
}

fn delimiter(options: &HandlerOptions) -> &'static str {
    if options.space_around_delimiters {
        " = "
    } else {
        "="
    }
}

fn has_line_break(text: &str) -> bool {
    text.contains('\n') || text.contains('\r')
}

pub(crate) fn validate_section_name(section: &str) -> Result<(), DocumentError> {
    if section.trim().is_empty() || section.contains(']') || has_line_break(section) {
        return Err(DocumentError::InvalidSection(section.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_option_name(option: &str) -> Result<(), DocumentError> {
    let trimmed = option.trim();
    if trimmed.is_empty()
        || trimmed != option
        || option.starts_with(['[', '#', ';'])
        || option.contains(['=', ':'])
        || has_line_break(option)
    {
        return Err(DocumentError::InvalidOption(option.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_value(option: &str, value: &str) -> Result<(), DocumentError> {
    // values are trimmed when read back
    if has_line_break(value) || value.trim() != value {
        return Err(DocumentError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

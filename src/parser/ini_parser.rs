//! INI text parser
//!
//! Turns INI text into an [`IniDocument`] while remembering the exact source
//! text of every line.

use log::debug;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::models::ini_document::{Entry, IniDocument, Line, Section};
use crate::settings::HandlerOptions;

/// What went wrong on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    MissingSectionHeader,
    MalformedHeader,
    DuplicateSection(String),
    DuplicateOption(String),
    EmptyOptionName,
    MissingValue(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::MissingSectionHeader => write!(f, "File contains no section headers"),
            ParseErrorKind::MalformedHeader => write!(f, "Malformed section header"),
            ParseErrorKind::DuplicateSection(name) => write!(f, "Section {} already exists", name),
            ParseErrorKind::DuplicateOption(name) => write!(f, "Option {} already exists", name),
            ParseErrorKind::EmptyOptionName => write!(f, "Option name is empty"),
            ParseErrorKind::MissingValue(name) => write!(f, "Option {} has no value", name),
        }
    }
}

/// Parse failure with the 1-based line number it happened on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn new(line: usize, kind: ParseErrorKind) -> Self {
        ParseError { line, kind }
    }
}

/// Parse INI content into a document
pub fn parse_ini(content: &str, options: &HandlerOptions) -> Result<IniDocument, ParseError> {
    let mut document = IniDocument::new(options.clone());
    if let Some(first) = content.find('\n') {
        if content[..first].ends_with('\r') {
            document.newline = "\r\n";
        }
    }

    let mut seen_sections: HashSet<String> = HashSet::new();
    let mut seen_options: HashSet<String> = HashSet::new();

    for (index, piece) in content.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        let raw = piece.strip_suffix('\n').unwrap_or(piece);
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let eol = &piece[raw.len()..];
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            push_line(&mut document, Line::Blank(piece.to_string()));
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            push_line(&mut document, Line::Comment(piece.to_string()));
            continue;
        }

        if raw.starts_with(char::is_whitespace) && continue_entry(&mut document, piece, raw, eol) {
            continue;
        }

        if trimmed.starts_with('[') {
            // name runs to the last closing bracket, anything after it stays in the raw header
            let close = trimmed
                .rfind(']')
                .ok_or_else(|| ParseError::new(line_no, ParseErrorKind::MalformedHeader))?;
            let name = &trimmed[1..close];
            if name.trim().is_empty() {
                return Err(ParseError::new(line_no, ParseErrorKind::MalformedHeader));
            }
            if !seen_sections.insert(name.to_string()) && options.strict {
                return Err(ParseError::new(
                    line_no,
                    ParseErrorKind::DuplicateSection(name.to_string()),
                ));
            }
            seen_options.clear();
            document.sections.push(Section {
                name: name.to_string(),
                header: piece.to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        if document.sections.is_empty() {
            return Err(ParseError::new(line_no, ParseErrorKind::MissingSectionHeader));
        }

        let entry = parse_entry(piece, raw, eol, line_no, options)?;
        if !seen_options.insert(options.option_key(&entry.key)) && options.strict {
            return Err(ParseError::new(
                line_no,
                ParseErrorKind::DuplicateOption(entry.key),
            ));
        }
        push_line(&mut document, Line::Entry(entry));
    }

    debug!(
        "Parsed INI document with {} section block(s)",
        document.sections.len()
    );
    Ok(document)
}

fn push_line(document: &mut IniDocument, line: Line) {
    match document.sections.last_mut() {
        Some(section) => section.lines.push(line),
        None => document.preamble.push(line),
    }
}

/// Append an indented line to the last entry of the current section
///
/// Blank and comment lines between the entry and the indented line do not end
/// the value; they move into the entry, blank ones adding an empty value line.
fn continue_entry(document: &mut IniDocument, piece: &str, raw: &str, eol: &str) -> bool {
    let Some(section) = document.sections.last_mut() else {
        return false;
    };
    let Some(index) = section
        .lines
        .iter()
        .rposition(|line| matches!(line, Line::Entry(_)))
    else {
        return false;
    };
    match &section.lines[index] {
        Line::Entry(entry)
            if entry.value.is_some() && indentation(raw) > indentation(&entry.head) => {}
        _ => return false,
    }

    let between: Vec<Line> = section.lines.drain(index + 1..).collect();
    let Line::Entry(entry) = &mut section.lines[index] else {
        return false;
    };
    let lines = entry.raw.get_or_insert_with(Vec::new);
    let value = entry.value.get_or_insert_with(String::new);
    for line in between {
        match line {
            Line::Blank(text) => {
                lines.push(text);
                value.push('\n');
            }
            Line::Comment(text) => lines.push(text),
            Line::Entry(_) => {}
        }
    }
    lines.push(piece.to_string());
    value.push('\n');
    value.push_str(raw.trim());
    entry.eol = eol.to_string();
    true
}

fn indentation(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn parse_entry(
    piece: &str,
    raw: &str,
    eol: &str,
    line_no: usize,
    options: &HandlerOptions,
) -> Result<Entry, ParseError> {
    let trimmed = raw.trim();
    let Some(delimiter) = raw.find(['=', ':']) else {
        if !options.allow_no_value {
            return Err(ParseError::new(
                line_no,
                ParseErrorKind::MissingValue(trimmed.to_string()),
            ));
        }
        return Ok(Entry {
            key: trimmed.to_string(),
            value: None,
            head: raw.trim_end().to_string(),
            tail: None,
            eol: eol.to_string(),
            raw: Some(vec![piece.to_string()]),
        });
    };

    let key_end = raw[..delimiter].trim_end().len();
    let key = raw[..key_end].trim_start();
    if key.is_empty() {
        return Err(ParseError::new(line_no, ParseErrorKind::EmptyOptionName));
    }

    let rest = &raw[delimiter + 1..];
    let value_start = delimiter + 1 + (rest.len() - rest.trim_start().len());
    Ok(Entry {
        key: key.to_string(),
        value: Some(raw[value_start..].trim_end().to_string()),
        head: raw[..key_end].to_string(),
        tail: Some(raw[key_end..value_start].to_string()),
        eol: eol.to_string(),
        raw: Some(vec![piece.to_string()]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<IniDocument, ParseError> {
        parse_ini(content, &HandlerOptions::default())
    }

    #[test]
    fn test_parse_basic() {
        let doc = parse("[server]\nhost = localhost\nport: 8080\n").unwrap();
        assert_eq!(doc.sections(), vec!["server"]);
        assert_eq!(doc.get_value("server", "host"), Some("localhost"));
        assert_eq!(doc.get_value("server", "port"), Some("8080"));
    }

    #[test]
    fn test_first_delimiter_wins() {
        let doc = parse("[a]\nurl = http://example.com\ntime: 10=ten\n").unwrap();
        assert_eq!(doc.get_value("a", "url"), Some("http://example.com"));
        assert_eq!(doc.get_value("a", "time"), Some("10=ten"));
    }

    #[test]
    fn test_inline_comment_is_value() {
        let doc = parse("[a]\nk = v ; not a comment\n").unwrap();
        assert_eq!(doc.get_value("a", "k"), Some("v ; not a comment"));
    }

    #[test]
    fn test_indented_header_keeps_name_spacing() {
        let doc = parse("  [ spaced ]  \nk = v\n").unwrap();
        assert!(doc.has_section(" spaced "));
        assert!(!doc.has_section("spaced"));
        assert_eq!(doc.to_string(), "  [ spaced ]  \nk = v\n");
    }

    #[test]
    fn test_header_with_trailing_text() {
        let doc = parse("[a] ; note\nk = v\n[b]x]\n").unwrap();
        assert_eq!(doc.sections(), vec!["a", "b]x"]);
        assert_eq!(doc.get_value("a", "k"), Some("v"));
        assert_eq!(doc.to_string(), "[a] ; note\nk = v\n[b]x]\n");
    }

    #[test]
    fn test_mixed_line_endings_kept() {
        let text = "[a]\r\nx = 1\n[b]\ny = 2\r\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.newline, "\r\n");
        assert_eq!(doc.get_value("a", "x"), Some("1"));
        assert_eq!(doc.to_string(), text);
    }

    #[test]
    fn test_missing_section_header() {
        let err = parse("# fine\nkey = value\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::MissingSectionHeader);
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(parse("[open\n").unwrap_err().kind, ParseErrorKind::MalformedHeader);
        assert_eq!(parse("[]\n").unwrap_err().kind, ParseErrorKind::MalformedHeader);
    }

    #[test]
    fn test_empty_option_name() {
        let err = parse("[a]\n= value\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyOptionName);
        assert_eq!(err.to_string(), "line 2: Option name is empty");
    }

    #[test]
    fn test_bare_key_depends_on_allow_no_value() {
        assert!(parse("[a]\nflag\n").is_ok());
        let options = HandlerOptions::new(false, false);
        let err = parse_ini("[a]\nflag\n", &options).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingValue("flag".to_string()));
    }

    #[test]
    fn test_duplicates_strict() {
        let strict = HandlerOptions::new(true, true);
        let err = parse_ini("[a]\n[a]\n", &strict).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateSection("a".to_string()));
        let err = parse_ini("[a]\nk = 1\nk = 2\n", &strict).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateOption("k".to_string()));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_duplicates_lenient_use_first() {
        let doc = parse("[a]\nk = 1\nk = 2\n[b]\n[a]\nk = 3\n").unwrap();
        assert_eq!(doc.get_value("a", "k"), Some("1"));
        assert_eq!(doc.sections(), vec!["a", "b"]);
        assert_eq!(doc.to_string(), "[a]\nk = 1\nk = 2\n[b]\n[a]\nk = 3\n");
    }

    #[test]
    fn test_continuation_lines() {
        let doc = parse("[a]\nlist = one\n  two\n  three\n  [not header]\nnext = 1\n").unwrap();
        assert_eq!(
            doc.get_value("a", "list"),
            Some("one\ntwo\nthree\n[not header]")
        );
        assert_eq!(doc.get_value("a", "next"), Some("1"));
    }

    #[test]
    fn test_continuation_across_blank_and_comment() {
        let text = "[a]\nlist = one\n\n# inside\n  two\n\nnext = 1\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.get_value("a", "list"), Some("one\n\ntwo"));
        assert_eq!(doc.options_of("a"), vec!["list", "next"]);
        assert_eq!(doc.to_string(), text);
    }

    #[test]
    fn test_indented_line_after_bare_key_is_option() {
        let doc = parse("[a]\nflag\n  other = 1\n").unwrap();
        assert_eq!(doc.options_of("a"), vec!["flag", "other"]);
    }

    #[test]
    fn test_indented_option_after_comment() {
        let doc = parse("[a]\n# note\n  indented = yes\n").unwrap();
        assert_eq!(doc.get_value("a", "indented"), Some("yes"));
    }

    #[test]
    fn test_empty_and_newline_only() {
        assert_eq!(parse("").unwrap().to_string(), "");
        assert_eq!(parse("\n").unwrap().to_string(), "\n");
    }

    #[test]
    fn test_no_trailing_newline() {
        let doc = parse("[a]\nk = v").unwrap();
        assert_eq!(doc.to_string(), "[a]\nk = v");
    }
}

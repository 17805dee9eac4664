// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment failures into miette diagnostics that point into
//! `mnemos.toml`.
//!
//! Unknown keys and unknown enum values (`[provider].kind`,
//! `[context].recall_selection`) get a Jaro-Winkler "did you mean" hint.
//! Spans are resolved against the table the key actually lives in, so a
//! typo in `[server]` is never pinned to a same-named key in `[agent]`.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score for a suggestion (`naem` -> `name`).
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no `[section]` of `MnemosConfig` declares.
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(mnemos::config::unknown_key),
        help("{}", choices_help(suggestion.as_deref(), "valid keys", valid_keys))
    )]
    UnknownKey {
        /// Table the key appeared in, e.g. `[memory]`.
        section: String,
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys the table accepts.
        valid_keys: String,
        #[label("not recognized here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type, e.g. a string for `max_queue_size`.
    #[error("`{key}` has the wrong type: found {found}, expected {expected}")]
    #[diagnostic(code(mnemos::config::invalid_type), help("set `{key}` to {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `mailbox.max_queue_size`.
        key: String,
        found: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A string that names no variant of a config enum.
    #[error("`{value}` is not a valid value for `{key}`")]
    #[diagnostic(
        code(mnemos::config::unknown_variant),
        help("{}", choices_help(suggestion.as_deref(), "expected one of", allowed))
    )]
    UnknownVariant {
        key: String,
        value: String,
        suggestion: Option<String>,
        allowed: String,
        #[label("unsupported value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A semantic check on an otherwise well-formed config failed.
    #[error("validation error: {message}")]
    #[diagnostic(code(mnemos::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(mnemos::config::other))]
    Other(String),
}

fn choices_help(suggestion: Option<&str>, label: &str, choices: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {label}: {choices}"),
        None => format!("{label}: {choices}"),
    }
}

/// Converts every error carried by `err` into a `ConfigError`.
///
/// `sources` pairs a display path with the TOML text loaded from it; they
/// are used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &path, field, sources);
                    ConfigError::UnknownKey {
                        section: section_label(&path),
                        key: field.clone(),
                        suggestion: closest(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(value, allowed) => {
                    let (section, key) = split_key(&path);
                    let (span, src) = locate(&error, section, key, sources);
                    ConfigError::UnknownVariant {
                        key: path.join("."),
                        value: value.clone(),
                        suggestion: closest(value, allowed),
                        allowed: allowed.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => {
                    let (section, key) = split_key(&path);
                    let (span, src) = locate(&error, section, key, sources);
                    ConfigError::InvalidType {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn section_label(path: &[String]) -> String {
    if path.is_empty() {
        "the top-level table".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

/// Splits `["mailbox", "max_queue_size"]` into table path and key.
fn split_key(path: &[String]) -> (&[String], &str) {
    match path.split_last() {
        Some((key, section)) => (section, key.as_str()),
        None => (&[], ""),
    }
}

/// Finds the file an error came from and the span of `key` inside it.
///
/// Falls back to the only source when figment recorded no file, which is
/// the case for inline strings.
fn locate(
    error: &figment::Error,
    section: &[String],
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = match origin {
        Some(origin) => sources.iter().find(|(path, _)| *path == origin),
        None if sources.len() == 1 => sources.first(),
        None => None,
    };

    let Some((path, content)) = source else {
        return (None, None);
    };
    match key_offset(content, section, key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key = ...` inside the `[section]` table of `content`.
///
/// Only lines under a header equal to `section` are considered; an empty
/// `section` means the lines before the first header.
pub fn key_offset(content: &str, section: &[String], key: &str) -> Option<usize> {
    if key.is_empty() {
        return None;
    }
    let wanted = section.join(".");
    let mut table = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.split(']').next()) {
            table = header.trim().to_string();
        } else if table == wanted {
            let indent = line.len() - line.trim_start().len();
            if let Some(rest) = line[indent..].strip_prefix(key)
                && rest.trim_start().starts_with('=')
            {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }

    None
}

/// The candidate most similar to `input`, if any scores above the threshold.
pub fn closest(input: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(input, c), *c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Renders `errors` to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        out.clear();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

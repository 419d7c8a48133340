// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source documents and their identities.

use crate::errors::DocumentReadError;
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, ops::RangeInclusive};

/// The identity of a document: the path it was loaded from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(Utf8PathBuf);

impl DocumentId {
    /// Creates a new document identity.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the path of this document.
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The source language of a document, as far as declaration scanning is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceLanguage {
    /// Java (`.java`, and anything unrecognized).
    Java,
    /// Kotlin (`.kt`, `.kts`).
    Kotlin,
}

impl SourceLanguage {
    /// Guesses the language from a path's extension.
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("kt" | "kts") => Self::Kotlin,
            _ => Self::Java,
        }
    }
}

/// The text of a document together with a line index.
///
/// Lines are 1-based throughout.
#[derive(Clone, Debug)]
pub struct SourceDocument {
    id: DocumentId,
    language: SourceLanguage,
    text: String,
    // Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl SourceDocument {
    /// Creates a document from its identity and text.
    pub fn new(id: DocumentId, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        let language = SourceLanguage::from_path(id.as_path());
        Self {
            id,
            language,
            text,
            line_starts,
        }
    }

    /// Reads a document from disk.
    pub fn read(path: &Utf8Path) -> Result<Self, DocumentReadError> {
        let text =
            std::fs::read_to_string(path).map_err(|error| DocumentReadError::new(path, error))?;
        Ok(Self::new(DocumentId::new(path), text))
    }

    /// Returns the identity of this document.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Returns the language of this document.
    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Returns the full text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of lines.
    ///
    /// A trailing newline does not start a new line.
    pub fn line_count(&self) -> usize {
        if self.text.ends_with('\n') {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    /// Returns the text of a single line, without its line terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map_or(self.text.len(), |next| next - 1);
        let text = &self.text[start..end];
        Some(text.strip_suffix('\r').unwrap_or(text))
    }

    /// Returns the lines in `range`, clipped to the document.
    pub fn lines(&self, range: RangeInclusive<usize>) -> impl Iterator<Item = &str> + '_ {
        let start = (*range.start()).max(1);
        let end = (*range.end()).min(self.line_count());
        (start..=end).filter_map(|line| self.line(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn document(text: &str) -> SourceDocument {
        SourceDocument::new(DocumentId::new("src/test/java/FooTest.java"), text)
    }

    #[test]
    fn line_access() {
        let doc = document(indoc! {"
            class FooTest {
              void bar() {}
            }
        "});

        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line(1), Some("class FooTest {"));
        assert_eq!(doc.line(3), Some("}"));
        assert_eq!(doc.line(0), None);
        assert_eq!(doc.line(4), None);
        assert_eq!(
            doc.lines(2..=10).collect::<Vec<_>>(),
            vec!["  void bar() {}", "}"],
        );
    }

    #[test]
    fn crlf_and_missing_trailing_newline() {
        let doc = document("a\r\nb");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line(1), Some("a"));
        assert_eq!(doc.line(2), Some("b"));
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(
            SourceLanguage::from_path(Utf8Path::new("FooTest.kt")),
            SourceLanguage::Kotlin
        );
        assert_eq!(
            SourceLanguage::from_path(Utf8Path::new("FooTest.java")),
            SourceLanguage::Java
        );
    }
}

// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering indicators on the terminal.

use crate::output::MarkStyles;
use owo_colors::OwoColorize;
use std::{collections::BTreeMap, io};
use testmark_runner::{
    document::{DocumentId, SourceDocument},
    reporter::{Notification, PresentationSink},
    results::OutcomeStatus,
    user_config::elements::DisplayConfig,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct MarkedLine {
    status: Option<OutcomeStatus>,
    annotation: Option<String>,
}

/// A [`PresentationSink`] that collects markers and prints the marked lines of a document.
///
/// Notifications are not printed here: they are already logged through `tracing`.
pub(crate) struct TerminalSink {
    display: DisplayConfig,
    styles: MarkStyles,
    documents: BTreeMap<DocumentId, BTreeMap<usize, MarkedLine>>,
}

impl TerminalSink {
    pub(crate) fn new(display: DisplayConfig, styles: MarkStyles) -> Self {
        Self {
            display,
            styles,
            documents: BTreeMap::new(),
        }
    }

    /// Writes one line per marked source line:
    ///
    /// ```text
    /// src/test/java/com/foo/BarTest.java:18: ✗ void quux() {  failed
    /// ```
    pub(crate) fn render(
        &self,
        document: &SourceDocument,
        writer: &mut dyn io::Write,
    ) -> io::Result<()> {
        let Some(lines) = self.documents.get(document.id()) else {
            return Ok(());
        };

        for (&line, marked) in lines {
            let source = document.line(line).unwrap_or_default().trim();
            write!(
                writer,
                "{}:{line}:",
                document.id().style(self.styles.path)
            )?;
            if let Some(status) = marked.status {
                let style = match status {
                    OutcomeStatus::Passed => self.styles.pass,
                    OutcomeStatus::Failed => self.styles.fail,
                };
                write!(writer, " {}", self.display.marker(status).style(style))?;
            }
            write!(writer, " {source}")?;
            if let Some(annotation) = &marked.annotation {
                write!(writer, "  {}", annotation.style(self.styles.annotation))?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    fn line_mut(&mut self, document: &DocumentId, line: usize) -> &mut MarkedLine {
        self.documents
            .entry(document.clone())
            .or_default()
            .entry(line)
            .or_default()
    }
}

impl PresentationSink for TerminalSink {
    fn place_marker(&mut self, document: &DocumentId, line: usize, status: OutcomeStatus) {
        self.line_mut(document, line).status = Some(status);
    }

    fn annotate(&mut self, document: &DocumentId, line: usize, text: &str) {
        self.line_mut(document, line).annotation = Some(text.to_owned());
    }

    fn clear_markers(&mut self, document: &DocumentId) {
        self.documents.remove(document);
    }

    fn notify(&mut self, _notification: Notification) {}
}

// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding the source line a test outcome refers to.
//!
//! The console output names tests either by their declared method name or by a human-readable
//! label. [`SourceLocator::locate`] resolves either form to the line a declaration starts on.

mod outline;

pub use outline::{Declaration, DeclarationKind, SourceOutline};

use crate::{document::SourceDocument, helpers::unescape_string_literal};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// How many lines after a declaration's start are searched for a label annotation.
///
/// The search also stops at the end of the declaration.
pub const LABEL_SEARCH_WINDOW: usize = 5;

static DISPLAY_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(?:[\w.]+\.)?DisplayName\s*\(\s*(?:value\s*=\s*)?"((?:[^"\\]|\\.)*)"\s*\)"#)
        .expect("display name regex is valid")
});

/// Produces a structural outline of a document, and resolves test names against it.
pub trait SourceLocator {
    /// Returns the package and the declarations of `document`.
    fn outline(&self, document: &SourceDocument) -> SourceOutline;

    /// Returns the start line of the declaration a test refers to.
    ///
    /// An exact method name match anywhere in the document is preferred over a display name
    /// match.
    fn locate(
        &self,
        document: &SourceDocument,
        method_name: Option<&str>,
        display_name: Option<&str>,
    ) -> Option<usize> {
        locate_in(document, &self.outline(document), method_name, display_name)
    }

    /// Returns the innermost method and class declarations containing `line`.
    fn enclosing(&self, document: &SourceDocument, line: usize) -> EnclosingDeclarations {
        EnclosingDeclarations::new(self.outline(document), line)
    }
}

/// The shipped locator for Java and Kotlin test sources.
#[derive(Clone, Copy, Debug, Default)]
pub struct JvmSourceLocator;

impl SourceLocator for JvmSourceLocator {
    fn outline(&self, document: &SourceDocument) -> SourceOutline {
        outline::outline(document)
    }
}

/// Resolves a test name against an already computed outline.
///
/// This is [`SourceLocator::locate`] without re-parsing, for callers resolving many outcomes in
/// the same document.
///
/// A display name ending in `()` that matches no label is retried as a method name, since Gradle
/// prints method names containing spaces that way.
pub fn locate_in(
    document: &SourceDocument,
    outline: &SourceOutline,
    method_name: Option<&str>,
    display_name: Option<&str>,
) -> Option<usize> {
    if let Some(method_name) = method_name
        && let Some(decl) = outline.methods().find(|decl| decl.name == method_name)
    {
        return Some(decl.start_line);
    }

    let display_name = display_name?;
    if let Some(decl) = outline
        .methods()
        .find(|decl| has_display_name(document, decl, display_name))
    {
        trace!(
            "resolved display name {display_name:?} to {} at line {}",
            decl.name, decl.start_line
        );
        return Some(decl.start_line);
    }

    // Kotlin backtick names are printed as `handles null input()`.
    let method_name = display_name.strip_suffix("()")?;
    outline
        .methods()
        .find(|decl| decl.name == method_name)
        .map(|decl| decl.start_line)
}

fn has_display_name(document: &SourceDocument, decl: &Declaration, display_name: &str) -> bool {
    let last_line = decl.end_line.min(decl.start_line + LABEL_SEARCH_WINDOW);
    document
        .lines(decl.start_line..=last_line)
        .flat_map(|line| DISPLAY_NAME_RE.captures_iter(line))
        .any(|captures| unescape_string_literal(&captures[1]) == display_name)
}

/// The declarations enclosing a line, as returned by [`SourceLocator::enclosing`].
#[derive(Clone, Debug)]
pub struct EnclosingDeclarations {
    outline: SourceOutline,
    method: Option<usize>,
    class: Option<usize>,
}

impl EnclosingDeclarations {
    fn new(outline: SourceOutline, line: usize) -> Self {
        let position = |kind| {
            outline
                .declarations
                .iter()
                .rposition(|decl: &Declaration| decl.kind == kind && decl.contains_line(line))
        };
        let method = position(DeclarationKind::Method);
        // A method's owning class takes precedence, since a class declared later in the file can
        // only contain the line if it is nested inside the method.
        let class = method
            .and_then(|idx| outline.declarations[idx].parent)
            .or_else(|| position(DeclarationKind::Class));
        Self {
            outline,
            method,
            class,
        }
    }

    /// Returns the innermost method containing the line.
    pub fn method(&self) -> Option<&Declaration> {
        self.method.map(|idx| &self.outline.declarations[idx])
    }

    /// Returns the innermost class containing the line, or the class owning the method.
    pub fn class(&self) -> Option<&Declaration> {
        self.class.map(|idx| &self.outline.declarations[idx])
    }

    /// Returns the binary name of [`Self::class`], as used by Gradle's `--tests` filter.
    pub fn qualified_class_name(&self) -> Option<String> {
        self.class()
            .map(|class| self.outline.qualified_class_name(class))
    }

    /// Returns the outline the declarations came from.
    pub fn outline(&self) -> &SourceOutline {
        &self.outline
    }
}

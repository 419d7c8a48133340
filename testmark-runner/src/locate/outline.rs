// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural outline of a Java or Kotlin source: the package and every class-like and method-like
//! declaration, with line spans.

use crate::document::{SourceDocument, SourceLanguage};
use tracing::{debug, warn};
use tree_sitter::{Language, Node, Parser};

/// What kind of declaration this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
    /// A class, interface, enum, record or Kotlin object.
    Class,
    /// A method, constructor or Kotlin function.
    Method,
}

/// A declaration found in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// The kind of declaration.
    pub kind: DeclarationKind,
    /// The declared name.
    pub name: String,
    /// The line the declaration starts on, including any annotations and modifiers.
    pub start_line: usize,
    /// The line the declaration ends on.
    pub end_line: usize,
    /// Index (into [`SourceOutline::declarations`]) of the class this is declared in, if any.
    pub parent: Option<usize>,
}

impl Declaration {
    /// Returns true if `line` is within this declaration.
    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// The outline of a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceOutline {
    /// The declared package, if any.
    pub package: Option<String>,
    /// Declarations in document order. A declaration nested in another comes after it.
    pub declarations: Vec<Declaration>,
}

impl SourceOutline {
    /// Returns method-like declarations in document order.
    pub fn methods(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|decl| decl.kind == DeclarationKind::Method)
    }

    /// Returns the innermost declaration of `kind` containing `line`.
    pub fn innermost(&self, kind: DeclarationKind, line: usize) -> Option<&Declaration> {
        // Later declarations that contain the line are nested inside earlier ones.
        self.declarations
            .iter()
            .rev()
            .find(|decl| decl.kind == kind && decl.contains_line(line))
    }

    /// Returns the first top-level class.
    pub fn primary_class(&self) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|decl| decl.kind == DeclarationKind::Class && decl.parent.is_none())
    }

    /// Returns the binary name of a class declaration: the package, then each enclosing class
    /// separated by `$`.
    pub fn qualified_class_name(&self, decl: &Declaration) -> String {
        let mut segments = vec![decl.name.as_str()];
        let mut parent = decl.parent;
        while let Some(idx) = parent {
            let enclosing = &self.declarations[idx];
            segments.push(enclosing.name.as_str());
            parent = enclosing.parent;
        }
        segments.reverse();
        let class_path = segments.join("$");
        match &self.package {
            Some(package) => format!("{package}.{class_path}"),
            None => class_path,
        }
    }

    /// Returns the class a declaration belongs to: itself for classes, the parent for methods.
    pub fn owning_class<'a>(&'a self, decl: &'a Declaration) -> Option<&'a Declaration> {
        match decl.kind {
            DeclarationKind::Class => Some(decl),
            DeclarationKind::Method => decl.parent.map(|idx| &self.declarations[idx]),
        }
    }
}

// Declarations whose bodies hold members.
const CLASS_KINDS: &[&str] = &[
    // Java
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
    // Kotlin (`class_declaration` also covers interfaces and enum classes)
    "object_declaration",
    "companion_object",
];

const METHOD_KINDS: &[&str] = &[
    // Java
    "method_declaration",
    "constructor_declaration",
    "compact_constructor_declaration",
    // Kotlin
    "function_declaration",
];

const PACKAGE_KINDS: &[&str] = &["package_declaration", "package_header"];

// Node kinds a declaration's name can have across the Java and Kotlin grammars.
const NAME_KINDS: &[&str] = &["identifier", "simple_identifier", "type_identifier"];

#[derive(Clone, Copy, Debug)]
enum Owner {
    Class(usize),
    // Members of anonymous classes and local functions are not recorded.
    Method,
}

/// Builds the outline of a document.
///
/// Parse errors are recovered from: declarations the grammar still recognizes are reported.
pub fn outline(document: &SourceDocument) -> SourceOutline {
    let language: Language = match document.language() {
        SourceLanguage::Java => tree_sitter_java::LANGUAGE.into(),
        SourceLanguage::Kotlin => tree_sitter_kotlin_ng::LANGUAGE.into(),
    };
    let mut parser = Parser::new();
    if let Err(error) = parser.set_language(&language) {
        warn!("failed to load the {:?} grammar: {error}", document.language());
        return SourceOutline::default();
    }
    let Some(tree) = parser.parse(document.text(), None) else {
        warn!("failed to parse {}", document.id());
        return SourceOutline::default();
    };

    let root = tree.root_node();
    if root.has_error() {
        debug!("{} has syntax errors, outline may be partial", document.id());
    }
    let mut builder = OutlineBuilder {
        source: document.text().as_bytes(),
        outline: SourceOutline::default(),
    };
    builder.walk(root, None);
    builder.outline
}

struct OutlineBuilder<'a> {
    source: &'a [u8],
    outline: SourceOutline,
}

impl OutlineBuilder<'_> {
    fn walk(&mut self, node: Node<'_>, owner: Option<Owner>) {
        let kind = node.kind();
        if PACKAGE_KINDS.contains(&kind) {
            if self.outline.package.is_none() {
                self.outline.package = self.package_name(node);
            }
            return;
        }

        let parent = match owner {
            Some(Owner::Class(idx)) => Some(idx),
            Some(Owner::Method) | None => None,
        };
        let owner = if CLASS_KINDS.contains(&kind) {
            let name = self
                .declared_name(node)
                .or_else(|| (kind == "companion_object").then(|| "Companion".to_owned()));
            match name {
                Some(name) => Some(Owner::Class(self.push(
                    DeclarationKind::Class,
                    name,
                    node,
                    parent,
                ))),
                None => owner,
            }
        } else if METHOD_KINDS.contains(&kind) {
            // Kotlin allows top-level functions, so only methods nested in other methods are
            // skipped.
            if !matches!(owner, Some(Owner::Method))
                && let Some(name) = self.declared_name(node)
            {
                self.push(DeclarationKind::Method, name, node, parent);
            }
            Some(Owner::Method)
        } else {
            owner
        };
        self.walk_children(node, owner);
    }

    fn walk_children(&mut self, node: Node<'_>, owner: Option<Owner>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.walk(child, owner);
        }
    }

    fn push(
        &mut self,
        kind: DeclarationKind,
        name: String,
        node: Node<'_>,
        parent: Option<usize>,
    ) -> usize {
        // The node's range includes leading annotations and modifiers.
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;
        self.outline.declarations.push(Declaration {
            kind,
            name,
            start_line,
            end_line: end_line.max(start_line),
            parent,
        });
        self.outline.declarations.len() - 1
    }

    fn declared_name(&self, node: Node<'_>) -> Option<String> {
        let name = node.child_by_field_name("name").or_else(|| {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .find(|child| NAME_KINDS.contains(&child.kind()))
        })?;
        // Kotlin backtick names: `reads backtick names`
        let name = self.text(name).trim_matches('`');
        (!name.is_empty()).then(|| name.to_owned())
    }

    fn package_name(&self, node: Node<'_>) -> Option<String> {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|child| !child.is_extra() && !child.kind().contains("annotation"))?;
        let package: String = self
            .text(name)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        (!package.is_empty()).then_some(package)
    }

    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source).unwrap_or_default()
    }
}

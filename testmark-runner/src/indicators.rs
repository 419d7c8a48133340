// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-document indicators, and reconciling parsed results into them.

use crate::{
    document::{DocumentId, SourceDocument},
    locate::{SourceLocator, locate_in},
    plural,
    reporter::{Notification, PresentationSink},
    results::{OutcomeStatus, ResultSet},
    user_config::elements::DisplayConfig,
};
use std::collections::{BTreeMap, HashMap};
use swrite::{SWrite, swrite};
use testmark_metadata::{IndicatorSummary, RunSummary};
use tracing::debug;

/// A marker attached to a source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Indicator {
    /// The 1-based line.
    pub line: usize,
    /// The outcome shown.
    pub status: OutcomeStatus,
    /// The full name of the test this indicator came from.
    pub name: String,
}

impl Indicator {
    /// Converts this indicator to its serialized form.
    pub fn to_summary(&self) -> IndicatorSummary {
        IndicatorSummary {
            line: self.line,
            status: self.status.to_summary(),
            name: self.name.clone(),
        }
    }
}

/// Indicators for every document that has been annotated.
///
/// A document's entry is created by its first run, fully replaced by each later run, and removed
/// by [`IndicatorStore::remove`].
#[derive(Clone, Debug, Default)]
pub struct IndicatorStore {
    documents: HashMap<DocumentId, BTreeMap<usize, Indicator>>,
}

impl IndicatorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the indicators for a document, keyed by line.
    pub fn get(&self, document: &DocumentId) -> Option<&BTreeMap<usize, Indicator>> {
        self.documents.get(document)
    }

    /// Returns the indicators for a document in line order.
    pub fn indicators(&self, document: &DocumentId) -> impl Iterator<Item = &Indicator> {
        self.documents
            .get(document)
            .into_iter()
            .flat_map(|indicators| indicators.values())
    }

    /// Returns true if the document has at least one indicator.
    pub fn has_indicators(&self, document: &DocumentId) -> bool {
        self.documents
            .get(document)
            .is_some_and(|indicators| !indicators.is_empty())
    }

    /// Returns true if no document has an entry.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Replaces a document's indicators.
    pub fn replace(&mut self, document: DocumentId, indicators: BTreeMap<usize, Indicator>) {
        self.documents.insert(document, indicators);
    }

    /// Removes a document's entry, returning it if it existed.
    pub fn remove(&mut self, document: &DocumentId) -> Option<BTreeMap<usize, Indicator>> {
        self.documents.remove(document)
    }
}

/// What [`Reconciler::update`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateReport {
    /// The number of indicators stored for the document.
    pub placed: usize,
    /// Full names of outcomes whose declaration could not be found.
    pub unresolved: Vec<String>,
    /// The notification shown for the run.
    pub notification: Notification,
}

/// Merges parsed results into an [`IndicatorStore`] and paints them through a
/// [`PresentationSink`].
pub struct Reconciler<'a, L, S> {
    store: &'a mut IndicatorStore,
    locator: &'a L,
    sink: &'a mut S,
    display: &'a DisplayConfig,
}

impl<'a, L: SourceLocator, S: PresentationSink> Reconciler<'a, L, S> {
    /// Creates a new reconciler.
    pub fn new(
        store: &'a mut IndicatorStore,
        locator: &'a L,
        sink: &'a mut S,
        display: &'a DisplayConfig,
    ) -> Self {
        Self {
            store,
            locator,
            sink,
            display,
        }
    }

    /// Replaces the indicators for `document` with the outcomes in `results`.
    ///
    /// Passed outcomes are placed first and failed ones second, so a failure wins when two
    /// outcomes resolve to the same line. Outcomes whose declaration can't be found are dropped.
    pub fn update(&mut self, document: &SourceDocument, results: &ResultSet) -> UpdateReport {
        let id = document.id();
        let outline = self.locator.outline(document);

        let mut indicators = BTreeMap::new();
        let mut unresolved = Vec::new();
        for outcome in results.outcomes() {
            let full_name = outcome.full_name();
            match locate_in(
                document,
                &outline,
                outcome.method_name(),
                outcome.display_name(),
            ) {
                Some(line) => {
                    indicators.insert(
                        line,
                        Indicator {
                            line,
                            status: outcome.status,
                            name: full_name,
                        },
                    );
                }
                None => {
                    debug!("no declaration found in {id} for {full_name}, dropping");
                    unresolved.push(full_name);
                }
            }
        }

        let placed = indicators.len();
        self.store.replace(id.clone(), indicators);
        self.repaint(id);

        let notification = summary_notification(results);
        self.notify(notification.clone());

        UpdateReport {
            placed,
            unresolved,
            notification,
        }
    }

    /// Removes all indicators and markers for a document. Clearing a document without
    /// indicators is a no-op apart from clearing markers.
    pub fn clear(&mut self, document: &DocumentId) {
        if let Some(removed) = self.store.remove(document) {
            debug!(
                "cleared {} {} from {document}",
                removed.len(),
                plural::indicators_str(removed.len())
            );
        }
        self.sink.clear_markers(document);
    }

    /// Hides the indicators for a document if there are any. Otherwise, tells the user there is
    /// nothing to show.
    ///
    /// Returns true if indicators were hidden.
    pub fn toggle(&mut self, document: &DocumentId) -> bool {
        if self.store.has_indicators(document) {
            self.clear(document);
            true
        } else {
            self.notify(Notification::warn("no test results to show"));
            false
        }
    }

    fn repaint(&mut self, document: &DocumentId) {
        self.sink.clear_markers(document);
        for indicator in self.store.indicators(document) {
            self.sink
                .place_marker(document, indicator.line, indicator.status);
            self.sink.annotate(
                document,
                indicator.line,
                self.display.annotation(indicator.status),
            );
        }
    }

    fn notify(&mut self, notification: Notification) {
        notification.log();
        self.sink.notify(notification);
    }
}

/// Builds the notification shown after a run.
pub fn summary_notification(results: &ResultSet) -> Notification {
    let total = results.total();
    if total == 0 {
        return Notification::warn("no results found");
    }

    let mut message = format!(
        "{}/{total} {} passed",
        results.total_passed,
        plural::tests_str(total)
    );
    if results.total_skipped > 0 {
        swrite!(message, " ({} skipped)", results.total_skipped);
    }

    if results.total_failed == 0 {
        Notification::info(message)
    } else {
        Notification::error(message)
    }
}

/// Builds the machine-readable summary of a document's indicators.
pub fn run_summary(
    store: &IndicatorStore,
    document: &DocumentId,
    results: &ResultSet,
    unresolved: &[String],
) -> RunSummary {
    RunSummary::new(
        document.as_path(),
        results.totals(),
        store
            .indicators(document)
            .map(Indicator::to_summary)
            .collect(),
        unresolved.to_vec(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        locate::JvmSourceLocator,
        reporter::{NotificationLevel, RecordingSink, SinkEvent},
        results::parse,
        user_config::UserConfig,
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = indoc! {r#"
        package com.foo;

        class BarTest {
            @Test
            void baz() {
            }

            @Test
            @DisplayName("should handle null input")
            void handlesNull() {
            }

            @Test
            void quux() {
            }
        }
    "#};

    fn document() -> SourceDocument {
        SourceDocument::new(DocumentId::new("src/test/java/com/foo/BarTest.java"), SOURCE)
    }

    #[test]
    fn update_places_indicators_and_notifies() {
        let document = document();
        let results = parse(indoc! {"
            com.foo.BarTest

              Test baz() PASSED
              Test should handle null input PASSED
              Test quux() FAILED
              Test gone() PASSED

            FAILURE: Executed 4 tests in 1s (1 failed)
        "});

        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let report =
            Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display)
                .update(&document, &results);

        assert_eq!(report.placed, 3);
        assert_eq!(report.unresolved, vec!["com.foo.BarTest.gone".to_owned()]);
        assert_eq!(
            report.notification,
            Notification::error("3/4 tests passed")
        );

        let placed: Vec<_> = store
            .indicators(document.id())
            .map(|i| (i.line, i.status))
            .collect();
        assert_eq!(
            placed,
            vec![
                (4, OutcomeStatus::Passed),
                (8, OutcomeStatus::Passed),
                (13, OutcomeStatus::Failed),
            ]
        );
        assert_eq!(sink.markers(document.id()), placed);
        assert!(sink.events().contains(&SinkEvent::Annotation {
            document: document.id().clone(),
            line: 13,
            text: "failed".to_owned(),
        }));
    }

    #[test]
    fn second_update_replaces_the_first() {
        let document = document();
        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let mut reconciler = Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display);

        reconciler.update(
            &document,
            &parse(indoc! {"
                com.foo.BarTest
                  Test baz() PASSED
                  Test quux() PASSED
                Executed 2 tests in 1s
            "}),
        );
        reconciler.update(
            &document,
            &parse(indoc! {"
                com.foo.BarTest
                  Test quux() FAILED
                Executed 1 tests in 1s (1 failed)
            "}),
        );

        let placed: Vec<_> = store
            .indicators(document.id())
            .map(|i| (i.line, i.status))
            .collect();
        assert_eq!(placed, vec![(13, OutcomeStatus::Failed)]);
        assert_eq!(sink.markers(document.id()), placed);
    }

    #[test]
    fn failure_wins_line_collisions() {
        // The same method reported twice, e.g. from two runs of a parameterized class.
        let document = document();
        let results = parse(indoc! {"
            com.foo.BarTest
              Test baz() FAILED
              Test baz() PASSED
            Executed 2 tests in 1s (1 failed)
        "});

        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let report = Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display)
            .update(&document, &results);

        assert_eq!(report.placed, 1);
        let indicator = &store.get(document.id()).expect("entry exists")[&4];
        assert_eq!(indicator.status, OutcomeStatus::Failed);
    }

    #[test]
    fn kotlin_backtick_methods_get_indicators() {
        let document = SourceDocument::new(
            DocumentId::new("src/test/kotlin/com/foo/BarTest.kt"),
            indoc! {"
                package com.foo

                class BarTest {
                    @Test
                    fun `handles null input`() {
                    }
                }
            "},
        );
        let results = parse(indoc! {"
            com.foo.BarTest
              Test handles null input() PASSED
            SUCCESS: Executed 1 tests in 1s
        "});

        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let report = Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display)
            .update(&document, &results);

        assert_eq!(report.unresolved, Vec::<String>::new());
        assert_eq!(sink.markers(document.id()), vec![(4, OutcomeStatus::Passed)]);
    }

    #[test]
    fn no_results_found() {
        let document = document();
        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let report = Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display)
            .update(&document, &parse("BUILD FAILED in 1s\n"));

        assert_eq!(report.notification, Notification::warn("no results found"));
        assert!(!store.has_indicators(document.id()));
        // The entry still exists, but is empty.
        assert!(store.get(document.id()).is_some());
    }

    #[test]
    fn clear_then_toggle_on_empty_store() {
        let id = DocumentId::new("FooTest.java");
        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let mut reconciler = Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display);

        reconciler.clear(&id);
        reconciler.clear(&id);
        assert!(!reconciler.toggle(&id));

        assert!(store.is_empty());
        assert!(sink.markers(&id).is_empty());
        let notifications: Vec<_> = sink.notifications().cloned().collect();
        assert_eq!(
            notifications,
            vec![Notification::warn("no test results to show")]
        );
    }

    #[test]
    fn toggle_hides_existing_indicators() {
        let document = document();
        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let mut reconciler = Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display);

        reconciler.update(
            &document,
            &parse("com.foo.BarTest\n  Test baz() PASSED\nExecuted 1 tests in 1s\n"),
        );
        assert!(reconciler.toggle(document.id()));
        assert!(!reconciler.toggle(document.id()));

        assert!(store.get(document.id()).is_none());
        assert!(sink.markers(document.id()).is_empty());
    }

    #[test]
    fn summary_notifications() {
        let skipped = parse("SUCCESS: Executed 4 tests in 1s (1 skipped)\n");
        assert_eq!(
            summary_notification(&skipped),
            Notification::info("4/4 tests passed (1 skipped)")
        );
        let single = parse("SUCCESS: Executed 1 test in 1s\n");
        assert_eq!(
            summary_notification(&single),
            Notification::info("1/1 test passed")
        );
        let failed = parse("FAILURE: Executed 2 tests in 1s (2 failed)\n");
        assert_eq!(summary_notification(&failed).level, NotificationLevel::Error);
    }

    #[test]
    fn summary_serializes_store_contents() {
        let document = document();
        let results =
            parse("com.foo.BarTest\n  Test quux() FAILED\nExecuted 1 tests in 1s (1 failed)\n");
        let display = UserConfig::defaults().display;
        let mut store = IndicatorStore::new();
        let mut sink = RecordingSink::new();
        let report = Reconciler::new(&mut store, &JvmSourceLocator, &mut sink, &display)
            .update(&document, &results);

        let summary = run_summary(&store, document.id(), &results, &report.unresolved);
        assert_eq!(summary.indicators.len(), 1);
        assert_eq!(summary.indicators[0].line, 13);
        assert_eq!(summary.totals.failed, 1);
        assert!(summary.unresolved.is_empty());
    }
}

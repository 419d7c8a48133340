// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A test session: runs test commands and keeps the resulting indicators.

use crate::{
    command::{BuildInvocation, TestCommand, TestScope},
    document::{DocumentId, SourceDocument},
    errors::{NearestTestError, SessionError},
    helpers::DisplayErrorChain,
    indicators::{IndicatorStore, Reconciler, UpdateReport, run_summary},
    last_command::{LastCommandSnapshot, LastCommandStore},
    locate::SourceLocator,
    process::{OutputHandler, ProcessRunner},
    reporter::{Notification, PresentationSink},
    results::{ResultSet, parse},
    user_config::UserConfig,
};
use camino::Utf8Path;
use testmark_metadata::RunSummary;
use tracing::{debug, info, warn};

/// The result of one run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The command that was run.
    pub command: TestCommand,
    /// The process that was spawned for it.
    pub invocation: BuildInvocation,
    /// The build tool's exit code, if it exited normally.
    pub exit_code: Option<i32>,
    /// The parsed results.
    pub results: ResultSet,
    /// What happened to the document's indicators.
    pub update: UpdateReport,
}

/// Runs tests and tracks their results across runs.
///
/// Runs are processed one at a time; each completed run replaces the indicators of its document.
pub struct TestSession<R, L, S> {
    runner: R,
    locator: L,
    sink: S,
    config: UserConfig,
    store: IndicatorStore,
    last_command: Option<TestCommand>,
    last_command_store: Option<LastCommandStore>,
}

impl<R: ProcessRunner, L: SourceLocator, S: PresentationSink> TestSession<R, L, S> {
    /// Creates a new session.
    pub fn new(runner: R, locator: L, sink: S, config: UserConfig) -> Self {
        Self {
            runner,
            locator,
            sink,
            config,
            store: IndicatorStore::new(),
            last_command: None,
            last_command_store: None,
        }
    }

    /// Persists every command run through this session, and falls back to the persisted command
    /// for [`Self::run_last`].
    pub fn with_last_command_store(mut self, store: LastCommandStore) -> Self {
        self.last_command_store = Some(store);
        self
    }

    /// Returns the indicator store.
    pub fn store(&self) -> &IndicatorStore {
        &self.store
    }

    /// Returns the presentation sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the presentation sink mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Returns the user configuration.
    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    /// Returns the last command run in this session.
    pub fn last_command(&self) -> Option<&TestCommand> {
        self.last_command.as_ref()
    }

    /// Runs `command`, then replaces the indicators of its document with the results.
    pub async fn run(
        &mut self,
        command: TestCommand,
        handler: &mut dyn OutputHandler,
    ) -> Result<RunReport, SessionError> {
        self.remember(&command);

        let invocation = command.to_invocation(&self.config.build);
        info!("running {} in {}", command.scope, command.working_dir);
        let output = self
            .runner
            .run(&invocation, handler)
            .await
            .map_err(|error| self.notify_failure(error))?;

        let document =
            SourceDocument::read(&command.document).map_err(|error| self.notify_failure(error))?;
        let results = parse(&output.combined());
        if !results.has_summary() && !output.success() {
            debug!(
                "`{invocation}` exited with {:?} and printed no test summary",
                output.exit_code
            );
        }
        let update = self.reconciler().update(&document, &results);

        Ok(RunReport {
            command,
            invocation,
            exit_code: output.exit_code,
            results,
            update,
        })
    }

    /// Runs the test method at `line`, or the test class if `line` is outside any method.
    pub async fn run_nearest(
        &mut self,
        working_dir: &Utf8Path,
        document: &Utf8Path,
        line: usize,
        handler: &mut dyn OutputHandler,
    ) -> Result<RunReport, SessionError> {
        let source = SourceDocument::read(document).map_err(|error| self.notify_failure(error))?;
        let enclosing = self.locator.enclosing(&source, line);
        let class_name = enclosing
            .qualified_class_name()
            .ok_or_else(|| {
                self.notify_failure(NearestTestError::NoEnclosingClass {
                    document: document.to_owned(),
                    line,
                })
            })?;
        let scope = match enclosing.method() {
            Some(method) => TestScope::Method {
                class_name,
                method_name: method.name.clone(),
            },
            None => TestScope::Class { class_name },
        };

        self.run(TestCommand::new(working_dir, document, scope), handler)
            .await
    }

    /// Runs the test class containing `line`, or the document's first top-level class if no line
    /// is given.
    pub async fn run_class(
        &mut self,
        working_dir: &Utf8Path,
        document: &Utf8Path,
        line: Option<usize>,
        handler: &mut dyn OutputHandler,
    ) -> Result<RunReport, SessionError> {
        let source = SourceDocument::read(document).map_err(|error| self.notify_failure(error))?;
        let class_name = match line {
            Some(line) => self.locator.enclosing(&source, line).qualified_class_name().ok_or(
                NearestTestError::NoEnclosingClass {
                    document: document.to_owned(),
                    line,
                },
            ),
            None => {
                let outline = self.locator.outline(&source);
                outline
                    .primary_class()
                    .map(|class| outline.qualified_class_name(class))
                    .ok_or(NearestTestError::NoClassInDocument {
                        document: document.to_owned(),
                    })
            }
        }
        .map_err(|error| self.notify_failure(error))?;

        self.run(
            TestCommand::new(working_dir, document, TestScope::Class { class_name }),
            handler,
        )
        .await
    }

    /// Runs every test in the project, annotating `document`.
    pub async fn run_all(
        &mut self,
        working_dir: &Utf8Path,
        document: &Utf8Path,
        handler: &mut dyn OutputHandler,
    ) -> Result<RunReport, SessionError> {
        self.run(
            TestCommand::new(working_dir, document, TestScope::All),
            handler,
        )
        .await
    }

    /// Runs the last command again.
    ///
    /// If there is no last command, a warning is shown and `Ok(None)` is returned.
    pub async fn run_last(
        &mut self,
        handler: &mut dyn OutputHandler,
    ) -> Result<Option<RunReport>, SessionError> {
        let loaded = match (&self.last_command, &self.last_command_store) {
            (Some(command), _) => Ok(Some(command.clone())),
            (None, Some(store)) => store
                .load()
                .map(|snapshot| snapshot.map(|snapshot| snapshot.command)),
            (None, None) => Ok(None),
        };
        let command = loaded.map_err(|error| self.notify_failure(error))?;
        let Some(command) = command else {
            self.notify(Notification::warn("no previous test command to run"));
            return Ok(None);
        };

        self.run(command, handler).await.map(Some)
    }

    /// Parses console output that was captured elsewhere, and replaces the indicators of
    /// `document` with the results.
    pub fn annotate(
        &mut self,
        document: &Utf8Path,
        raw_output: &str,
    ) -> Result<(ResultSet, UpdateReport), SessionError> {
        let source = SourceDocument::read(document).map_err(|error| self.notify_failure(error))?;
        let results = parse(raw_output);
        let update = self.reconciler().update(&source, &results);
        Ok((results, update))
    }

    /// Removes all indicators for a document.
    pub fn clear(&mut self, document: &DocumentId) {
        self.reconciler().clear(document);
    }

    /// Hides the indicators for a document, or notifies that there is nothing to show.
    pub fn toggle(&mut self, document: &DocumentId) -> bool {
        self.reconciler().toggle(document)
    }

    /// Returns the machine-readable summary of a document's current indicators.
    pub fn summary(
        &self,
        document: &DocumentId,
        results: &ResultSet,
        update: &UpdateReport,
    ) -> RunSummary {
        run_summary(&self.store, document, results, &update.unresolved)
    }

    fn reconciler(&mut self) -> Reconciler<'_, L, S> {
        Reconciler::new(
            &mut self.store,
            &self.locator,
            &mut self.sink,
            &self.config.display,
        )
    }

    fn remember(&mut self, command: &TestCommand) {
        self.last_command = Some(command.clone());
        if let Some(store) = &self.last_command_store
            && let Err(error) = store.save(&LastCommandSnapshot::new(command.clone()))
        {
            warn!("{}", DisplayErrorChain::new(error));
        }
    }

    fn notify(&mut self, notification: Notification) {
        notification.log();
        self.sink.notify(notification);
    }

    /// Shows a failure through the sink and returns it. It is not logged: the caller receives the
    /// error and reports it.
    fn notify_failure(&mut self, error: impl Into<SessionError>) -> SessionError {
        let error = error.into();
        self.sink
            .notify(Notification::error(DisplayErrorChain::new(&error).to_string()));
        error
    }
}

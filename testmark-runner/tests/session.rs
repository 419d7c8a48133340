// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for a test session, with a fake build tool.

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::{Utf8TempDir, tempdir};
use color_eyre::eyre::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use testmark_runner::{
    command::{BuildInvocation, TestCommand, TestScope},
    document::DocumentId,
    errors::{NearestTestError, ProcessRunError, SessionError},
    last_command::LastCommandStore,
    locate::JvmSourceLocator,
    process::{OutputHandler, ProcessOutput, ProcessRunner},
    reporter::{Notification, NotificationLevel, RecordingSink},
    results::OutcomeStatus,
    session::TestSession,
    user_config::UserConfig,
};

const BAR_TEST: &str = indoc! {r#"
    package com.foo;

    import org.junit.jupiter.api.DisplayName;
    import org.junit.jupiter.api.Test;

    class BarTest {
        @Test
        void baz() {
            assertEquals(1, 1);
        }

        @Test
        @DisplayName("should handle null input")
        void handlesNull() {
            assertNull(null);
        }

        @Test
        void quux() {
            assertEquals(1, 2);
        }
    }
"#};

const FAILING_RUN: &str = indoc! {"
    > Task :test

    com.foo.BarTest

      Test baz() PASSED
      Test should handle null input PASSED
      Test quux() FAILED

        org.opentest4j.AssertionFailedError: expected: <1> but was: <2>

    FAILURE: Executed 3 tests in 1.2s (1 failed)

    BUILD FAILED in 4s
"};

const PASSING_RUN: &str = indoc! {"
    com.foo.BarTest

      Test quux() PASSED

    SUCCESS: Executed 1 tests in 300ms
"};

/// Replays canned output instead of running Gradle, and records the invocations it was given.
#[derive(Default)]
struct FakeRunner {
    outputs: RefCell<Vec<&'static str>>,
    invocations: RefCell<Vec<BuildInvocation>>,
}

impl FakeRunner {
    fn new(outputs: &[&'static str]) -> Self {
        Self {
            outputs: RefCell::new(outputs.iter().rev().copied().collect()),
            invocations: RefCell::default(),
        }
    }
}

impl ProcessRunner for &FakeRunner {
    async fn run(
        &self,
        invocation: &BuildInvocation,
        handler: &mut dyn OutputHandler,
    ) -> Result<ProcessOutput, ProcessRunError> {
        self.invocations.borrow_mut().push(invocation.clone());
        let text = self
            .outputs
            .borrow_mut()
            .pop()
            .expect("fake runner has output left");

        let mut output = ProcessOutput::default();
        for line in text.lines() {
            handler.on_stdout(line);
            output.stdout.push(line.to_owned());
        }
        output.exit_code = Some(if text.contains("FAILURE") { 1 } else { 0 });
        handler.on_exit(output.exit_code);
        Ok(output)
    }
}

/// Fails to start, like a missing build tool.
struct MissingBuildTool;

impl ProcessRunner for MissingBuildTool {
    async fn run(
        &self,
        invocation: &BuildInvocation,
        _handler: &mut dyn OutputHandler,
    ) -> Result<ProcessOutput, ProcessRunError> {
        Err(ProcessRunError::Spawn {
            command: invocation.to_string(),
            error: std::io::ErrorKind::NotFound.into(),
        })
    }
}

struct Workspace {
    dir: Utf8TempDir,
}

impl Workspace {
    fn new() -> Result<Self> {
        let dir = tempdir()?;
        let test_dir = dir.path().join("src/test/java/com/foo");
        std::fs::create_dir_all(&test_dir)?;
        std::fs::write(test_dir.join("BarTest.java"), BAR_TEST)?;
        Ok(Self { dir })
    }

    fn root(&self) -> &Utf8Path {
        self.dir.path()
    }

    fn document(&self) -> Utf8PathBuf {
        self.dir.path().join("src/test/java/com/foo/BarTest.java")
    }
}

fn session(runner: &FakeRunner) -> TestSession<&FakeRunner, JvmSourceLocator, RecordingSink> {
    TestSession::new(
        runner,
        JvmSourceLocator,
        RecordingSink::new(),
        UserConfig::defaults(),
    )
}

#[tokio::test(flavor = "current_thread")]
async fn run_nearest_places_indicators() -> Result<()> {
    let workspace = Workspace::new()?;
    let runner = FakeRunner::new(&[FAILING_RUN]);
    let mut session = session(&runner);

    // Line 19 is inside `quux`.
    let report = session
        .run_nearest(workspace.root(), &workspace.document(), 19, &mut ())
        .await?;

    assert_eq!(
        report.command.scope,
        TestScope::Method {
            class_name: "com.foo.BarTest".to_owned(),
            method_name: "quux".to_owned(),
        }
    );
    assert_eq!(
        runner.invocations.borrow()[0].args,
        vec!["cleanTest", "test", "--tests", "com.foo.BarTest.quux"]
    );
    assert_eq!(report.exit_code, Some(1));
    assert_eq!(report.update.placed, 3);

    let id = DocumentId::new(workspace.document());
    let indicators: Vec<_> = session
        .store()
        .indicators(&id)
        .map(|i| (i.line, i.status, i.name.as_str()))
        .collect();
    assert_eq!(
        indicators,
        vec![
            (7, OutcomeStatus::Passed, "com.foo.BarTest.baz"),
            (
                12,
                OutcomeStatus::Passed,
                "com.foo.BarTest.should handle null input"
            ),
            (18, OutcomeStatus::Failed, "com.foo.BarTest.quux"),
        ]
    );
    assert_eq!(
        session.sink().markers(&id),
        vec![
            (7, OutcomeStatus::Passed),
            (12, OutcomeStatus::Passed),
            (18, OutcomeStatus::Failed),
        ]
    );
    assert_eq!(
        session.sink().notifications().last(),
        Some(&Notification::error("2/3 tests passed"))
    );

    let summary = session.summary(&id, &report.results, &report.update);
    assert_eq!(summary.indicators.len(), 3);
    assert_eq!(summary.totals.failed, 1);

    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn run_last_replays_and_replaces() -> Result<()> {
    let workspace = Workspace::new()?;
    let runner = FakeRunner::new(&[FAILING_RUN, PASSING_RUN]);
    let mut session = session(&runner);

    session
        .run_class(workspace.root(), &workspace.document(), None, &mut ())
        .await?;
    let report = session
        .run_last(&mut ())
        .await?
        .expect("a command was run before");

    assert_eq!(
        report.command.scope,
        TestScope::Class {
            class_name: "com.foo.BarTest".to_owned()
        }
    );
    {
        let invocations = runner.invocations.borrow();
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0], invocations[1]);
    }

    // The second run fully replaces the first.
    let id = DocumentId::new(workspace.document());
    let indicators: Vec<_> = session
        .store()
        .indicators(&id)
        .map(|i| (i.line, i.status))
        .collect();
    assert_eq!(indicators, vec![(18, OutcomeStatus::Passed)]);
    assert_eq!(
        session.sink().markers(&id),
        vec![(18, OutcomeStatus::Passed)]
    );

    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn run_last_without_history_warns() -> Result<()> {
    let runner = FakeRunner::new(&[]);
    let mut session = session(&runner);

    assert!(session.run_last(&mut ()).await?.is_none());
    let notification = session
        .sink()
        .notifications()
        .next()
        .expect("a warning was shown");
    assert_eq!(notification.level, NotificationLevel::Warn);
    assert!(runner.invocations.borrow().is_empty());

    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn last_command_persists_across_sessions() -> Result<()> {
    let workspace = Workspace::new()?;
    let state_dir = tempdir()?;
    let runner = FakeRunner::new(&[PASSING_RUN, PASSING_RUN]);

    let command = TestCommand::new(workspace.root(), workspace.document(), TestScope::All);
    session(&runner)
        .with_last_command_store(LastCommandStore::new(state_dir.path()))
        .run(command.clone(), &mut ())
        .await?;

    let mut second = session(&runner).with_last_command_store(LastCommandStore::new(state_dir.path()));
    let report = second.run_last(&mut ()).await?.expect("command was persisted");
    assert_eq!(report.command, command);

    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn nearest_outside_any_class() -> Result<()> {
    let workspace = Workspace::new()?;
    let runner = FakeRunner::new(&[]);
    let mut session = session(&runner);

    let error = session
        .run_nearest(workspace.root(), &workspace.document(), 1, &mut ())
        .await
        .expect_err("line 1 is the package declaration");
    assert!(
        matches!(
            error,
            SessionError::Nearest(NearestTestError::NoEnclosingClass { line: 1, .. })
        ),
        "unexpected error: {error:?}"
    );
    assert!(runner.invocations.borrow().is_empty());

    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn failures_are_shown_through_the_sink() -> Result<()> {
    let workspace = Workspace::new()?;
    let mut session = TestSession::new(
        MissingBuildTool,
        JvmSourceLocator,
        RecordingSink::new(),
        UserConfig::defaults(),
    );

    let error = session
        .run_class(workspace.root(), &workspace.document(), None, &mut ())
        .await
        .expect_err("build tool is missing");
    assert!(
        matches!(error, SessionError::Process(ProcessRunError::Spawn { .. })),
        "unexpected error: {error:?}"
    );

    let notification = session
        .sink()
        .notifications()
        .last()
        .expect("the failure was shown");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert!(
        notification.message.starts_with("failed to execute `"),
        "unexpected message: {}",
        notification.message
    );
    assert!(
        session
            .store()
            .indicators(&DocumentId::new(workspace.document()))
            .next()
            .is_none()
    );

    let error = session
        .run_nearest(workspace.root(), &workspace.document(), 1, &mut ())
        .await
        .expect_err("line 1 is the package declaration");
    assert_eq!(
        session.sink().notifications().last(),
        Some(&Notification::error(error.to_string()))
    );

    Ok(())
}

#[test]
fn annotate_captured_output_then_toggle() -> Result<()> {
    let workspace = Workspace::new()?;
    let runner = FakeRunner::new(&[]);
    let mut session = session(&runner);

    let (results, update) = session.annotate(&workspace.document(), FAILING_RUN)?;
    assert_eq!(results.total(), 3);
    assert_eq!(update.placed, 3);

    let id = DocumentId::new(workspace.document());
    assert!(session.toggle(&id));
    assert!(!session.store().has_indicators(&id));
    assert!(session.sink().markers(&id).is_empty());

    assert!(!session.toggle(&id));
    assert_eq!(
        session.sink().notifications().last(),
        Some(&Notification::warn("no test results to show"))
    );

    Ok(())
}

// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line parsing and command execution.

use crate::{
    ExpectedError, Result,
    helpers::{absolute_path, project_root},
    output::{OutputContext, OutputOpts, OutputWriter, StderrStyles},
    sink::TerminalSink,
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::io::{Read, Write};
use testmark_metadata::TestmarkExitCode;
use testmark_runner::{
    document::{DocumentId, SourceDocument},
    indicators::UpdateReport,
    last_command::{LastCommandStore, state_dir},
    locate::JvmSourceLocator,
    process::{OutputHandler, TokioProcessRunner},
    results::ResultSet,
    session::TestSession,
    user_config::{UserConfig, UserConfigLocation, user_config_path},
};
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Run Gradle tests and mark JVM test sources with the results.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct TestmarkApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    /// Output format for results
    #[arg(
        long,
        value_enum,
        default_value_t,
        global = true,
        value_name = "FMT",
        env = "TESTMARK_MESSAGE_FORMAT"
    )]
    message_format: MessageFormat,

    #[clap(subcommand)]
    command: Command,
}

impl TestmarkApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Run(run_opts) => {
                let mut app = SessionApp::new(&self.config_opts, output, self.message_format)?;
                app.exec_run(run_opts, output_writer)
            }
            Command::Rerun => {
                let mut app = SessionApp::new(&self.config_opts, output, self.message_format)?;
                app.exec_rerun(output_writer)
            }
            Command::Annotate { output: build_output, document } => {
                let mut app = SessionApp::new(&self.config_opts, output, self.message_format)?;
                app.exec_annotate(&build_output, &document, output_writer)
            }
            Command::ShowConfig => {
                self.config_opts.exec_show_config(output_writer)?;
                Ok(TestmarkExitCode::OK)
            }
        }
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// User config file [default: $XDG_CONFIG_HOME/testmark/config.toml], or `none` to use
    /// built-in defaults
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "TESTMARK_USER_CONFIG_FILE"
    )]
    user_config_file: Option<String>,
}

impl ConfigOpts {
    fn location(&self) -> UserConfigLocation<'_> {
        UserConfigLocation::from_cli_or_env(self.user_config_file.as_deref())
    }

    fn make_user_config(&self) -> Result<UserConfig> {
        Ok(UserConfig::from_location(self.location())?)
    }

    fn exec_show_config(&self, output_writer: &mut OutputWriter) -> Result<()> {
        let source = match self.location() {
            UserConfigLocation::Default => match user_config_path()? {
                Some(path) if path.is_file() => path.to_string(),
                Some(path) => format!("{path} (not found, using defaults)"),
                None => "(no config directory, using defaults)".to_owned(),
            },
            UserConfigLocation::Isolated => "(none, using defaults)".to_owned(),
            UserConfigLocation::Explicit(path) => path.to_string(),
        };
        let config = self.make_user_config()?;

        let mut writer = output_writer.stdout_writer();
        write_config(&mut writer, &source, &config)
            .and_then(|()| writer.flush())
            .map_err(|error| ExpectedError::WriteOutputError { error })
    }
}

fn write_config(writer: &mut dyn Write, source: &str, config: &UserConfig) -> std::io::Result<()> {
    let program = match &config.build.program {
        Some(words) => shell_words::join(words),
        None => "(auto-detect gradlew or gradle)".to_owned(),
    };
    let extra_args = if config.build.extra_args.is_empty() {
        "(none)".to_owned()
    } else {
        shell_words::join(&config.build.extra_args)
    };
    let display = &config.display;

    writeln!(writer, "user config: {source}")?;
    writeln!(writer)?;
    writeln!(writer, "[build]")?;
    writeln!(writer, "program:         {program}")?;
    writeln!(writer, "extra args:      {extra_args}")?;
    writeln!(writer)?;
    writeln!(writer, "[display]")?;
    writeln!(writer, "pass marker:     {}", display.pass_marker)?;
    writeln!(writer, "fail marker:     {}", display.fail_marker)?;
    writeln!(writer, "pass annotation: {}", display.pass_annotation)?;
    writeln!(writer, "fail annotation: {}", display.fail_annotation)
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run tests for a test document and mark its lines with the results
    ///
    /// With --line, runs the test method containing that line, or its class if the line is
    /// outside any method. Without --line, runs the document's test class.
    Run(RunOpts),

    /// Run the last test command again
    ///
    /// The last command is remembered across invocations in the testmark state directory
    /// ($XDG_STATE_HOME/testmark, overridable with TESTMARK_STATE_DIR).
    Rerun,

    /// Mark a test document using build output captured elsewhere
    Annotate {
        /// File containing Gradle console output, or `-` for standard input
        #[arg(long, short, value_name = "FILE")]
        output: String,

        /// The test document to mark
        document: Utf8PathBuf,
    },

    /// Show the resolved user configuration
    ShowConfig,
}

#[derive(Debug, Args)]
struct RunOpts {
    /// The test document to mark
    document: Utf8PathBuf,

    /// Which tests to run [default: nearest with --line, class otherwise]
    #[arg(long, value_enum)]
    scope: Option<RunScope>,

    /// The 1-based line used to pick the test method or class
    #[arg(long, short)]
    line: Option<usize>,

    /// Directory to run the build tool in [default: the Gradle project containing DOCUMENT]
    #[arg(long, value_name = "DIR")]
    workdir: Option<Utf8PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RunScope {
    /// The test method at --line, or its class if the line is outside any method
    Nearest,
    /// The test class at --line, or the document's top-level class
    Class,
    /// Every test in the project
    All,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// Marked source lines
    #[default]
    Human,
    /// A JSON run summary
    Json,
}

type TerminalSession = TestSession<TokioProcessRunner, JvmSourceLocator, TerminalSink>;

/// Everything needed to run tests and report on them.
struct SessionApp {
    session: TerminalSession,
    output: OutputContext,
    message_format: MessageFormat,
}

impl SessionApp {
    fn new(
        config_opts: &ConfigOpts,
        output: OutputContext,
        message_format: MessageFormat,
    ) -> Result<Self> {
        let config = config_opts.make_user_config()?;
        let sink = TerminalSink::new(config.display.clone(), output.stdout_styles());
        let store = LastCommandStore::new(&state_dir()?);
        debug!("last command store: {}", store.path());

        let session = TestSession::new(TokioProcessRunner, JvmSourceLocator, sink, config)
            .with_last_command_store(store);
        Ok(Self {
            session,
            output,
            message_format,
        })
    }

    fn exec_run(&mut self, opts: RunOpts, output_writer: &mut OutputWriter) -> Result<i32> {
        let document = absolute_path(&opts.document)?;
        let working_dir = match &opts.workdir {
            Some(workdir) => absolute_path(workdir)?,
            None => project_root(&document),
        };
        let scope = opts.scope.unwrap_or(match opts.line {
            Some(_) => RunScope::Nearest,
            None => RunScope::Class,
        });

        let runtime = make_runtime()?;
        let mut echo = EchoOutput::new(self.output);
        let session = &mut self.session;
        let report = runtime.block_on(async {
            match (scope, opts.line) {
                (RunScope::Nearest, Some(line)) => {
                    session
                        .run_nearest(&working_dir, &document, line, &mut echo)
                        .await
                }
                (RunScope::Nearest | RunScope::Class, line) => {
                    session
                        .run_class(&working_dir, &document, line, &mut echo)
                        .await
                }
                (RunScope::All, _) => session.run_all(&working_dir, &document, &mut echo).await,
            }
        })?;

        self.finish(
            &report.command.document,
            &report.results,
            &report.update,
            report.exit_code,
            output_writer,
        )
    }

    fn exec_rerun(&mut self, output_writer: &mut OutputWriter) -> Result<i32> {
        let runtime = make_runtime()?;
        let mut echo = EchoOutput::new(self.output);
        let session = &mut self.session;
        let report = runtime.block_on(async { session.run_last(&mut echo).await })?;

        match report {
            Some(report) => self.finish(
                &report.command.document,
                &report.results,
                &report.update,
                report.exit_code,
                output_writer,
            ),
            // The session has already warned about this.
            None => Ok(TestmarkExitCode::NO_PREVIOUS_COMMAND),
        }
    }

    fn exec_annotate(
        &mut self,
        build_output: &str,
        document: &Utf8Path,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let raw_output = read_build_output(build_output)?;
        let document = absolute_path(document)?;
        let (results, update) = self.session.annotate(&document, &raw_output)?;
        self.finish(&document, &results, &update, None, output_writer)
    }

    fn finish(
        &self,
        document: &Utf8Path,
        results: &ResultSet,
        update: &UpdateReport,
        exit_code: Option<i32>,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let mut writer = output_writer.stdout_writer();
        match self.message_format {
            MessageFormat::Human => {
                let source = SourceDocument::read(document)
                    .map_err(|error| ExpectedError::DocumentReadError { error })?;
                self.session
                    .sink()
                    .render(&source, &mut writer)
                    .map_err(|error| ExpectedError::WriteOutputError { error })?;
            }
            MessageFormat::Json => {
                let summary =
                    self.session
                        .summary(&DocumentId::new(document), results, update);
                serde_json::to_writer_pretty(&mut writer, &summary)
                    .map_err(|error| ExpectedError::SummarySerializeError { error })?;
                writeln!(writer).map_err(|error| ExpectedError::WriteOutputError { error })?;
            }
        }
        writer
            .flush()
            .map_err(|error| ExpectedError::WriteOutputError { error })?;

        if !update.unresolved.is_empty() {
            info!(
                "{} {} not found in {document}: {}",
                update.unresolved.len(),
                testmark_runner::plural::tests_str(update.unresolved.len()),
                update.unresolved.iter().join(", ")
            );
        }

        if results.total_failed > 0 {
            Err(ExpectedError::TestRunFailed {
                failed: results.total_failed,
            })
        } else if !results.has_summary() {
            Err(ExpectedError::NoResults { exit_code })
        } else {
            Ok(TestmarkExitCode::OK)
        }
    }
}

fn make_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ExpectedError::TokioRuntimeCreate { error })
}

fn read_build_output(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw_output = String::new();
        std::io::stdin()
            .read_to_string(&mut raw_output)
            .map_err(|error| ExpectedError::BuildOutputRead { path: None, error })?;
        Ok(raw_output)
    } else {
        let path = Utf8PathBuf::from(source);
        std::fs::read_to_string(&path).map_err(|error| ExpectedError::BuildOutputRead {
            path: Some(path),
            error,
        })
    }
}

/// Echoes the build tool's output to stderr in verbose mode.
struct EchoOutput {
    verbose: bool,
    styles: StderrStyles,
}

impl EchoOutput {
    fn new(output: OutputContext) -> Self {
        Self {
            verbose: output.verbose,
            styles: output.stderr_styles(),
        }
    }
}

impl OutputHandler for EchoOutput {
    fn on_stdout(&mut self, line: &str) {
        if self.verbose {
            eprintln!("{}", line.style(self.styles.build_output));
        }
    }

    fn on_stderr(&mut self, line: &str) {
        if self.verbose {
            eprintln!("{}", line.style(self.styles.build_output));
        }
    }

    fn on_exit(&mut self, exit_code: Option<i32>) {
        match exit_code {
            Some(code) => debug!("build tool exited with code {code}"),
            None => debug!("build tool was terminated by a signal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use testmark_metadata::RunSummary;

    fn parse(args: &[&str]) -> TestmarkApp {
        TestmarkApp::try_parse_from(std::iter::once("testmark").chain(args.iter().copied()))
            .unwrap_or_else(|error| panic!("{args:?} failed to parse: {error}"))
    }

    #[test]
    fn verify_app() {
        use clap::CommandFactory;
        TestmarkApp::command().debug_assert();
    }

    #[test]
    fn parse_run() {
        let app = parse(&["run", "BarTest.java", "--line", "12", "--color", "never"]);
        let Command::Run(opts) = app.command else {
            panic!("expected run");
        };
        assert_eq!(opts.document, "BarTest.java");
        assert_eq!(opts.line, Some(12));
        assert_eq!(opts.scope, None);
        assert_eq!(app.output.color, crate::output::Color::Never);

        let app = parse(&["--message-format", "json", "run", "--scope", "all", "BarTest.java"]);
        assert_eq!(app.message_format, MessageFormat::Json);
        assert!(matches!(
            app.command,
            Command::Run(RunOpts {
                scope: Some(RunScope::All),
                ..
            })
        ));
    }

    #[test]
    fn parse_errors() {
        for args in [
            &["run"][..],
            &["annotate", "BarTest.java"],
            &["run", "BarTest.java", "--scope", "file"],
            &["rerun", "BarTest.java"],
        ] {
            assert!(
                TestmarkApp::try_parse_from(std::iter::once("testmark").chain(args.iter().copied()))
                    .is_err(),
                "{args:?} should fail to parse"
            );
        }
    }

    #[test]
    fn annotate_prints_json_summary() {
        let dir = tempdir().unwrap();
        let document = dir.path().join("BarTest.java");
        std::fs::write(
            &document,
            indoc! {"
                package com.foo;

                class BarTest {
                    @Test
                    void baz() {}

                    @Test
                    void quux() {}
                }
            "},
        )
        .unwrap();
        let build_output = dir.path().join("build.log");
        std::fs::write(
            &build_output,
            indoc! {"
                com.foo.BarTest

                  Test baz() PASSED
                  Test quux() FAILED

                FAILURE: Executed 2 tests in 1s (1 failed)
            "},
        )
        .unwrap();

        let app = parse(&[
            "--color",
            "never",
            "--user-config-file",
            "none",
            "--message-format",
            "json",
            "annotate",
            "--output",
            build_output.as_str(),
            document.as_str(),
        ]);
        let output = app.init_output();
        let mut output_writer = OutputWriter::Test { stdout: Vec::new() };

        let Command::Annotate {
            output: build_output,
            document,
        } = app.command
        else {
            panic!("expected annotate");
        };
        // Built by hand so that the test doesn't touch the real state directory.
        let config = app.config_opts.make_user_config().unwrap();
        let sink = TerminalSink::new(config.display.clone(), output.stdout_styles());
        let mut session_app = SessionApp {
            session: TestSession::new(TokioProcessRunner, JvmSourceLocator, sink, config),
            output,
            message_format: app.message_format,
        };

        let error = session_app
            .exec_annotate(&build_output, &document, &mut output_writer)
            .expect_err("one test failed");
        assert_eq!(error.process_exit_code(), TestmarkExitCode::TEST_RUN_FAILED);

        let OutputWriter::Test { stdout } = output_writer else {
            unreachable!("test writer")
        };
        let summary = RunSummary::parse_json(String::from_utf8(stdout).unwrap()).unwrap();
        assert_eq!(summary.document, document);
        assert_eq!(summary.totals.passed, 1);
        assert_eq!(summary.totals.failed, 1);
        let lines: Vec<_> = summary.indicators.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![4, 7]);
    }
}

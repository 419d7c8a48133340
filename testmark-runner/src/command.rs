// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test command descriptors, and turning them into build tool invocations.

use crate::user_config::elements::BuildConfig;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tests a [`TestCommand`] selects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TestScope {
    /// Every test in the project.
    All,

    /// Every test in a class.
    #[serde(rename_all = "kebab-case")]
    Class {
        /// The binary name of the class, e.g. `com.foo.BarTest` or `com.foo.Outer$Inner`.
        class_name: String,
    },

    /// A single test method.
    #[serde(rename_all = "kebab-case")]
    Method {
        /// The binary name of the class declaring the method.
        class_name: String,
        /// The method name.
        method_name: String,
    },
}

impl TestScope {
    /// Returns the value passed to Gradle's `--tests` option, if any.
    pub fn test_filter(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Class { class_name } => Some(class_name.clone()),
            Self::Method {
                class_name,
                method_name,
            } => Some(format!("{class_name}.{method_name}")),
        }
    }
}

impl fmt::Display for TestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all tests"),
            Self::Class { class_name } => write!(f, "class {class_name}"),
            Self::Method {
                class_name,
                method_name,
            } => write!(f, "test {class_name}.{method_name}"),
        }
    }
}

/// A structured, serializable description of a test run.
///
/// This is what "run last" replays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCommand {
    /// The directory the build tool runs in.
    pub working_dir: Utf8PathBuf,
    /// The document whose lines are annotated with the results.
    pub document: Utf8PathBuf,
    /// Which tests to run.
    pub scope: TestScope,
}

impl TestCommand {
    /// Creates a new command.
    pub fn new(
        working_dir: impl Into<Utf8PathBuf>,
        document: impl Into<Utf8PathBuf>,
        scope: TestScope,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            document: document.into(),
            scope,
        }
    }

    /// Builds the process invocation for this command.
    pub fn to_invocation(&self, build: &BuildConfig) -> BuildInvocation {
        let (program, mut args) = match build.program.as_deref() {
            Some([program, rest @ ..]) => (program.clone(), rest.to_vec()),
            _ => (default_program(&self.working_dir), Vec::new()),
        };
        // `cleanTest` forces the test task to execute even if Gradle considers it up to date.
        args.extend(["cleanTest".to_owned(), "test".to_owned()]);
        if let Some(filter) = self.scope.test_filter() {
            args.push("--tests".to_owned());
            args.push(filter);
        }
        args.extend(build.extra_args.iter().cloned());

        BuildInvocation {
            program,
            args,
            working_dir: self.working_dir.clone(),
        }
    }
}

fn default_program(working_dir: &Utf8Path) -> String {
    let wrapper = if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    };
    let wrapper_path = working_dir.join(wrapper);
    if wrapper_path.is_file() {
        wrapper_path.into_string()
    } else {
        "gradle".to_owned()
    }
}

/// A concrete process to spawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildInvocation {
    /// The program to run.
    pub program: String,
    /// Arguments to pass to the program.
    pub args: Vec<String>,
    /// The working directory.
    pub working_dir: Utf8PathBuf,
}

impl fmt::Display for BuildInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_words::join(
            std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str)),
        ))
    }
}

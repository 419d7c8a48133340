// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::ExpectedError;
use camino::{Utf8Path, Utf8PathBuf};

const PROJECT_ROOT_MARKERS: &[&str] = &[
    "settings.gradle",
    "settings.gradle.kts",
    "gradlew",
    "gradlew.bat",
];
const BUILD_FILE_MARKERS: &[&str] = &["build.gradle", "build.gradle.kts"];

/// Makes `path` absolute relative to the current directory.
pub(crate) fn absolute_path(path: &Utf8Path) -> Result<Utf8PathBuf, ExpectedError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let current_dir =
        std::env::current_dir().map_err(|error| ExpectedError::CurrentDirFailed { error })?;
    let current_dir = Utf8PathBuf::from_path_buf(current_dir)
        .map_err(|path| ExpectedError::CurrentDirInvalidUtf8 { path })?;
    Ok(current_dir.join(path))
}

/// Returns the Gradle project directory for a test document.
///
/// This is the nearest ancestor with a settings file or a Gradle wrapper. Failing that, it's the
/// nearest ancestor with a build file, and failing that, the document's own directory.
pub(crate) fn project_root(document: &Utf8Path) -> Utf8PathBuf {
    let has_any = |dir: &Utf8Path, markers: &[&str]| {
        markers.iter().any(|marker| dir.join(marker).is_file())
    };

    let find = |markers: &[&str]| {
        document
            .ancestors()
            .skip(1)
            .find(|dir| has_any(dir, markers))
    };
    find(PROJECT_ROOT_MARKERS)
        .or_else(|| find(BUILD_FILE_MARKERS))
        .or_else(|| document.parent())
        .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_owned)
}

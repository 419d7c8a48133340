// Copyright (c) The testmark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User config implementation.

use super::{
    discovery::user_config_path,
    elements::{
        BuildConfig, DefaultBuildConfig, DefaultDisplayConfig, DeserializedBuildConfig,
        DeserializedDisplayConfig, DisplayConfig,
    },
};
use crate::errors::UserConfigError;
use camino::Utf8Path;
use serde::Deserialize;
use std::{collections::BTreeSet, io};
use tracing::{debug, warn};

/// Special value for `--user-config-file` and `TESTMARK_USER_CONFIG_FILE` that skips user config
/// loading entirely.
pub const USER_CONFIG_NONE: &str = "none";

/// Specifies where to load user configuration from.
#[derive(Clone, Copy, Debug)]
pub enum UserConfigLocation<'a> {
    /// Discover user config from the default location.
    Default,

    /// Skip user config loading entirely, using only built-in defaults.
    Isolated,

    /// Load user config from an explicit path.
    ///
    /// Returns an error if the file does not exist.
    Explicit(&'a Utf8Path),
}

impl<'a> UserConfigLocation<'a> {
    /// Creates a user config location from a CLI or environment variable value.
    ///
    /// Returns `Default` if `None`, `Isolated` if `"none"`, otherwise `Explicit` with the path.
    pub fn from_cli_or_env(s: Option<&'a str>) -> Self {
        match s {
            None => Self::Default,
            Some(s) if s == USER_CONFIG_NONE => Self::Isolated,
            Some(s) => Self::Explicit(Utf8Path::new(s)),
        }
    }
}

/// User configuration with defaults applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserConfig {
    /// Resolved build tool configuration.
    pub build: BuildConfig,
    /// Resolved display configuration.
    pub display: DisplayConfig,
}

impl UserConfig {
    /// Loads and resolves user configuration.
    pub fn from_location(location: UserConfigLocation<'_>) -> Result<Self, UserConfigError> {
        Self::from_location_with_warnings(location, &mut DefaultUserConfigWarnings)
    }

    /// Returns the built-in defaults.
    pub fn defaults() -> Self {
        let default_config = DefaultUserConfig::from_embedded();
        Self::resolve(&default_config, None)
            .expect("embedded default user config has a valid build program")
    }

    fn from_location_with_warnings(
        location: UserConfigLocation<'_>,
        warnings: &mut impl UserConfigWarnings,
    ) -> Result<Self, UserConfigError> {
        let user_config = DeserializedUserConfig::from_location_with_warnings(location, warnings)?;
        Self::resolve(&DefaultUserConfig::from_embedded(), user_config.as_ref())
    }

    fn resolve(
        default_config: &DefaultUserConfig,
        user_config: Option<&DeserializedUserConfig>,
    ) -> Result<Self, UserConfigError> {
        Ok(Self {
            build: BuildConfig::resolve(&default_config.build, user_config.map(|c| &c.build))?,
            display: DisplayConfig::resolve(
                &default_config.display,
                user_config.map(|c| &c.display),
            ),
        })
    }
}

/// Trait for handling user configuration warnings.
trait UserConfigWarnings {
    /// Handle unknown configuration keys found in a user config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs warnings using `tracing`.
struct DefaultUserConfigWarnings;

impl UserConfigWarnings for DefaultUserConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let unknown_str = match unknown.iter().collect::<Vec<_>>().as_slice() {
            // Print this on the same line.
            [key] => format!("key: {key}"),
            keys => {
                let mut unknown_str = "keys:\n".to_owned();
                for key in keys {
                    unknown_str.push_str("\n  - ");
                    unknown_str.push_str(key);
                }
                unknown_str
            }
        };

        warn!("in user config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// User-specific configuration (deserialized form).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedUserConfig {
    #[serde(default)]
    build: DeserializedBuildConfig,

    #[serde(default)]
    display: DeserializedDisplayConfig,
}

impl DeserializedUserConfig {
    fn from_location_with_warnings(
        location: UserConfigLocation<'_>,
        warnings: &mut impl UserConfigWarnings,
    ) -> Result<Option<Self>, UserConfigError> {
        match location {
            UserConfigLocation::Isolated => {
                debug!("user config: skipping (isolated)");
                Ok(None)
            }
            UserConfigLocation::Explicit(path) => {
                debug!("user config: loading from explicit path {path}");
                match Self::from_path_with_warnings(path, warnings)? {
                    Some(config) => Ok(Some(config)),
                    None => Err(UserConfigError::FileNotFound {
                        path: path.to_owned(),
                    }),
                }
            }
            UserConfigLocation::Default => match user_config_path()? {
                Some(path) => Self::from_path_with_warnings(&path, warnings),
                None => {
                    debug!("user config: could not determine config directory");
                    Ok(None)
                }
            },
        }
    }

    /// Loads user config from a specific path.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn from_path_with_warnings(
        path: &Utf8Path,
        warnings: &mut impl UserConfigWarnings,
    ) -> Result<Option<Self>, UserConfigError> {
        debug!("user config: attempting to load from {path}");
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("user config: file does not exist at {path}");
                return Ok(None);
            }
            Err(error) => {
                return Err(UserConfigError::Read {
                    path: path.to_owned(),
                    error,
                });
            }
        };

        let (config, unknown) =
            Self::deserialize_toml(&contents).map_err(|error| UserConfigError::Parse {
                path: path.to_owned(),
                error,
            })?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(path, &unknown);
        }

        debug!("user config: loaded successfully from {path}");
        Ok(Some(config))
    }

    fn deserialize_toml(contents: &str) -> Result<(Self, BTreeSet<String>), toml::de::Error> {
        let deserializer = toml::Deserializer::parse(contents)?;
        let mut unknown = BTreeSet::new();
        let config: DeserializedUserConfig = serde_ignored::deserialize(deserializer, |path| {
            unknown.insert(path.to_string());
        })?;
        Ok((config, unknown))
    }
}

/// Default user configuration parsed from the embedded TOML.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultUserConfig {
    build: DefaultBuildConfig,
    display: DefaultDisplayConfig,
}

impl DefaultUserConfig {
    const DEFAULT_CONFIG: &'static str = include_str!("../../default-user-config.toml");

    /// Parses the default config.
    ///
    /// Panics if the embedded TOML is invalid or contains unknown keys.
    fn from_embedded() -> Self {
        let deserializer = toml::Deserializer::parse(Self::DEFAULT_CONFIG)
            .expect("embedded default user config should parse");
        let mut unknown = BTreeSet::new();
        let config: DefaultUserConfig =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .expect("embedded default user config should be valid");

        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default user config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use camino_tempfile::tempdir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TestUserConfigWarnings {
        unknown_keys: Option<(Utf8PathBuf, BTreeSet<String>)>,
    }

    impl UserConfigWarnings for TestUserConfigWarnings {
        fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown_keys = Some((config_file.to_owned(), unknown.clone()));
        }
    }

    #[test]
    fn default_user_config_is_valid() {
        let config = UserConfig::defaults();
        assert_eq!(config.build.program, None);
        assert!(config.build.extra_args.is_empty());
        assert_eq!(config.display.pass_marker, "✓");
        assert_eq!(config.display.fail_annotation, "failed");
    }

    #[test]
    fn user_values_override_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            indoc! {r#"
                [build]
                program = "./gradlew --no-daemon"
                extra-args = ["--offline"]

                [display]
                fail-marker = "X"
            "#},
        )
        .unwrap();

        let mut warnings = TestUserConfigWarnings::default();
        let config = UserConfig::from_location_with_warnings(
            UserConfigLocation::Explicit(&config_path),
            &mut warnings,
        )
        .expect("config is valid");

        assert_eq!(
            config.build.program,
            Some(vec!["./gradlew".to_owned(), "--no-daemon".to_owned()])
        );
        assert_eq!(config.build.extra_args, vec!["--offline".to_owned()]);
        assert_eq!(config.display.fail_marker, "X");
        assert_eq!(config.display.pass_marker, "✓", "unset keys keep defaults");
        assert!(warnings.unknown_keys.is_none());
    }

    #[test]
    fn ignored_keys() {
        let config_contents = indoc! {r#"
            ignored1 = "test"

            [display]
            pass-marker = "+"
            ignored2 = "hi"
        "#};

        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, config_contents).unwrap();

        let mut warnings = TestUserConfigWarnings::default();
        let config = DeserializedUserConfig::from_path_with_warnings(&config_path, &mut warnings)
            .expect("config valid")
            .expect("config should be loaded");
        assert_eq!(config.display.pass_marker.as_deref(), Some("+"));

        let (path, unknown) = warnings.unknown_keys.expect("unknown keys were reported");
        assert_eq!(path, config_path);
        assert_eq!(
            unknown,
            BTreeSet::from(["display.ignored2".to_owned(), "ignored1".to_owned()])
        );
    }

    #[test]
    fn missing_files() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("does-not-exist.toml");

        let mut warnings = TestUserConfigWarnings::default();
        let loaded = DeserializedUserConfig::from_path_with_warnings(&config_path, &mut warnings)
            .expect("missing file is not an error");
        assert!(loaded.is_none());

        let error = UserConfig::from_location(UserConfigLocation::Explicit(&config_path))
            .expect_err("explicit path must exist");
        assert!(matches!(error, UserConfigError::FileNotFound { .. }));
    }

    #[test]
    fn isolated_and_parse_errors() {
        let config = UserConfig::from_location(UserConfigLocation::Isolated).unwrap();
        assert_eq!(config, UserConfig::defaults());

        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[build\nprogram = 1").unwrap();
        let error = UserConfig::from_location(UserConfigLocation::Explicit(&config_path))
            .expect_err("invalid TOML");
        assert!(matches!(error, UserConfigError::Parse { .. }));
    }

    #[test]
    fn location_from_cli_or_env() {
        assert!(matches!(
            UserConfigLocation::from_cli_or_env(None),
            UserConfigLocation::Default
        ));
        assert!(matches!(
            UserConfigLocation::from_cli_or_env(Some("none")),
            UserConfigLocation::Isolated
        ));
        assert!(matches!(
            UserConfigLocation::from_cli_or_env(Some("/tmp/config.toml")),
            UserConfigLocation::Explicit(path) if path == "/tmp/config.toml"
        ));
    }
}

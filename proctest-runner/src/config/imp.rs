// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Parallelism;
use crate::{
    decoder::DecoderKind,
    errors::{ConfigDiscoveryError, ConfigLoadError, ConfigParseError, ConfigParseErrorKind},
    executable::Executable,
    list::{DirSource, FileSource, GlobSource, TestSource},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::BTreeSet, fmt::Write, sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Trait for handling configuration warnings.
///
/// The default implementation, [`DefaultConfigWarnings`], logs them.
pub trait ConfigWarnings {
    /// Handles unknown configuration keys found in a config file.
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        base_dir: &Utf8Path,
        unknown: &BTreeSet<String>,
    );
}

/// Default implementation of [`ConfigWarnings`] that logs warnings using the tracing crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        base_dir: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                _ = write!(unknown_str, "\n  - {ignored_key}");
            }
        }

        warn!(
            "in config file {}, ignoring unknown configuration {unknown_str}",
            config_file.strip_prefix(base_dir).unwrap_or(config_file),
        );
    }
}

/// Overall configuration for a harness run.
///
/// Loaded from the built-in defaults, overlaid with a project config file. Relative paths in the
/// config file are resolved against the base directory.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    base_dir: Utf8PathBuf,
    config_file: Utf8PathBuf,
    processes: Parallelism,
    suffix: String,
    idle_interval: Duration,
    executables: IndexMap<String, Arc<Executable>>,
    default_executable: Option<Arc<Executable>>,
    registrations: Vec<Registration>,
}

impl HarnessConfig {
    /// The default location of the config within the base directory: `.config/proctest.toml`.
    pub const CONFIG_PATH: &'static str = ".config/proctest.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the config from `config_file`, or from [`Self::CONFIG_PATH`] within `base_dir` if
    /// that isn't specified. A missing file at the default location is not an error.
    pub fn from_sources(
        base_dir: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(base_dir, config_file, &mut DefaultConfigWarnings)
    }

    /// Reads the config like [`Self::from_sources`], with custom warning handling.
    pub fn from_sources_with_warnings(
        base_dir: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let base_dir = base_dir.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = base_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &base_dir, &unknown);
        }

        config
            .into_config(base_dir, &config_file)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))
    }

    /// Searches `start_dir` and its ancestors for [`Self::CONFIG_PATH`], and reads the first one
    /// found. The directory it was found in becomes the base directory.
    pub fn discover(start_dir: &Utf8Path) -> Result<Self, ConfigLoadError> {
        for dir in start_dir.ancestors() {
            let config_file = dir.join(Self::CONFIG_PATH);
            if config_file.is_file() {
                debug!(%config_file, "discovered config file");
                return Ok(Self::from_sources(dir, Some(&config_file))?);
            }
        }
        Err(ConfigDiscoveryError::new(start_dir).into())
    }

    /// Returns the default config, with no executables or registrations.
    pub fn default_config(base_dir: impl Into<Utf8PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let config_file = base_dir.join(Self::CONFIG_PATH);
        let config = Self::build_and_deserialize_config(&Self::make_default_config())
            .ok()
            .and_then(|(config, _)| config.into_config(base_dir.clone(), &config_file).ok());
        config.unwrap_or_else(|| Self {
            // Only reached if the embedded config is broken.
            base_dir,
            config_file,
            processes: Parallelism::default(),
            suffix: ".t".to_owned(),
            idle_interval: Duration::from_millis(2),
            executables: IndexMap::new(),
            default_executable: None,
            registrations: Vec::new(),
        })
    }

    /// The directory that relative paths are resolved against.
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// The config file that was read, or would have been read at the default location.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// The number of test files to run at the same time.
    pub fn processes(&self) -> Parallelism {
        self.processes
    }

    /// The suffix of test files.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// How long the scheduler sleeps after a round with no progress.
    pub fn idle_interval(&self) -> Duration {
        self.idle_interval
    }

    /// Returns every executable, in definition order.
    pub fn executables(&self) -> impl ExactSizeIterator<Item = &Arc<Executable>> + '_ {
        self.executables.values()
    }

    /// Returns the executable named `name`.
    pub fn executable(&self, name: &str) -> Option<&Arc<Executable>> {
        self.executables.get(name)
    }

    /// Returns the executable used by registrations that don't name one.
    pub fn default_executable(&self) -> Option<&Arc<Executable>> {
        self.default_executable.as_ref()
    }

    /// Returns the registrations, in order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(HarnessConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: HarnessConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The config crate reports the key as well, so drop it for consistency.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

/// A set of test files to register, with the executable that runs them and their labels.
#[derive(Clone, Debug)]
pub struct Registration {
    source: TestSource,
    executable: Arc<Executable>,
    labels: Vec<String>,
}

impl Registration {
    /// Creates a new registration.
    pub fn new(
        source: TestSource,
        executable: Arc<Executable>,
        labels: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            source,
            executable,
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Where the test files come from. Paths are absolute if the base directory was.
    pub fn source(&self) -> &TestSource {
        &self.source
    }

    /// The executable that runs the test files.
    pub fn executable(&self) -> &Arc<Executable> {
        &self.executable
    }

    /// The labels given to every test file.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HarnessConfigDeserialize {
    processes: Parallelism,
    suffix: String,
    #[serde(with = "humantime_serde")]
    idle_interval: Duration,
    #[serde(default)]
    executables: IndexMap<String, ExecutableDeserialize>,
    #[serde(default)]
    default_executable: Option<String>,
    #[serde(default)]
    register: Vec<RegistrationDeserialize>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ExecutableDeserialize {
    command: String,
    decoder: DecoderKind,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RegistrationDeserialize {
    #[serde(default)]
    file: Option<Utf8PathBuf>,
    #[serde(default)]
    dir: Option<Utf8PathBuf>,
    #[serde(default)]
    glob: Option<String>,
    #[serde(default)]
    executable: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
}

impl HarnessConfigDeserialize {
    fn into_config(
        self,
        base_dir: Utf8PathBuf,
        config_file: &Utf8Path,
    ) -> Result<HarnessConfig, ConfigParseErrorKind> {
        let executables = self
            .executables
            .into_iter()
            .map(|(name, executable)| {
                let parsed = Executable::new(&name, &executable.command, executable.decoder)
                    .map_err(|err| ConfigParseErrorKind::InvalidExecutable {
                        name: name.clone(),
                        err,
                    })?;
                Ok((name, Arc::new(parsed)))
            })
            .collect::<Result<IndexMap<_, _>, ConfigParseErrorKind>>()?;

        let lookup = |context: String, name: &str| {
            executables
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigParseErrorKind::UnknownExecutable {
                    context,
                    name: name.to_owned(),
                    known: executables.keys().cloned().collect(),
                })
        };

        let default_executable = self
            .default_executable
            .as_deref()
            .map(|name| lookup("default-executable".to_owned(), name))
            .transpose()?;

        let registrations = self
            .register
            .into_iter()
            .enumerate()
            .map(|(index, registration)| {
                let executable = match &registration.executable {
                    Some(name) => lookup(format!("register entry {index}"), name)?,
                    None => default_executable
                        .clone()
                        .ok_or(ConfigParseErrorKind::NoExecutable { index })?,
                };
                let source = registration.source(index, &base_dir)?;
                Ok(Registration::new(source, executable, registration.labels))
            })
            .collect::<Result<Vec<_>, ConfigParseErrorKind>>()?;

        Ok(HarnessConfig {
            config_file: config_file.to_owned(),
            base_dir,
            processes: self.processes,
            suffix: self.suffix,
            idle_interval: self.idle_interval,
            executables,
            default_executable,
            registrations,
        })
    }
}

impl RegistrationDeserialize {
    fn source(&self, index: usize, base_dir: &Utf8Path) -> Result<TestSource, ConfigParseErrorKind> {
        match (&self.file, &self.dir, &self.glob) {
            (Some(file), None, None) => Ok(TestSource::File(FileSource::new(base_dir.join(file)))),
            (None, Some(dir), None) => Ok(TestSource::Dir(DirSource::new(base_dir.join(dir)))),
            (None, None, Some(glob)) => {
                let pattern = if Utf8Path::new(glob).is_absolute() {
                    glob.clone()
                } else {
                    base_dir.join(glob).into_string()
                };
                Ok(TestSource::Glob(GlobSource::new(pattern)))
            }
            _ => Err(ConfigParseErrorKind::InvalidRegistration {
                index,
                found: [self.file.is_some(), self.dir.is_some(), self.glob.is_some()]
                    .into_iter()
                    .filter(|present| *present)
                    .count(),
            }),
        }
    }
}

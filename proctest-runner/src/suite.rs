// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ties configuration, discovery, selection and the harness together.

use crate::{
    config::HarnessConfig,
    errors::{LoadError, RunError, SelectError},
    list::{TestFile, TestRegistry},
    reporter::{OutputSink, SuiteStatistics},
    runner::HarnessBuilder,
};
use proctest_filtering::LabelExpression;
use tracing::debug;

/// A configured set of test files, ready to run.
#[derive(Clone, Debug)]
pub struct TestSuite {
    config: HarnessConfig,
    registry: TestRegistry,
}

impl TestSuite {
    /// Loads every test file registered in `config`.
    pub fn new(config: HarnessConfig) -> Result<Self, LoadError> {
        let registry = TestRegistry::from_config(&config)?;
        Ok(Self { config, registry })
    }

    /// Creates a suite from a config and an already-populated registry.
    pub fn from_parts(config: HarnessConfig, registry: TestRegistry) -> Self {
        Self { config, registry }
    }

    /// The config.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The registry of test files.
    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    /// Returns the files selected by label tokens, failing if there are none.
    pub fn select<I, S>(&self, tokens: I) -> Result<Vec<&TestFile>, RunError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let expression = LabelExpression::parse(tokens).map_err(SelectError::from)?;
        let files = self.registry.select_expression(&expression)?;
        if files.is_empty() {
            return Err(RunError::NoTestsSelected {
                expression: expression.to_string(),
            });
        }
        Ok(files)
    }

    /// Runs the files selected by label tokens, reporting to `sink`.
    ///
    /// Errors are only returned if nothing could be run. Failing test files are reported through
    /// the returned statistics.
    pub fn run<I, S>(
        &self,
        tokens: I,
        sink: &mut dyn OutputSink,
    ) -> Result<SuiteStatistics, RunError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let files = self.select(tokens)?;
        let harness = HarnessBuilder::from_config(&self.config).build();
        debug!(
            files = files.len(),
            processes = harness.processes(),
            "starting test run"
        );
        Ok(harness.run_collect(files, sink))
    }
}

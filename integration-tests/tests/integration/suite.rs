// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::Result;
use indoc::formatdoc;
use pretty_assertions::assert_eq;
use proctest_metadata::FrameWriter;
use proctest_runner::{
    config::HarnessConfig,
    errors::{RunError, SelectError},
    list::TestFile,
    reporter::NullSink,
    suite::TestSuite,
};

fn project(scripts: &ScriptDir) -> Result<TestSuite> {
    scripts.write(
        HarnessConfig::CONFIG_PATH,
        &formatdoc! {r#"
            processes = 2
            default-executable = "emit"

            [executables.emit]
            command = '"{EMIT_FRAMES}" %file%'
            decoder = "compact"

            [[register]]
            dir = "test/unit"
            labels = ["unit"]

            [[register]]
            glob = "test/unit/slow_*.t"
            labels = ["slow"]

            [[register]]
            file = "test/smoke.t"
            labels = ["smoke", "slow"]
        "#},
    )?;
    scripts.write("test/unit/math.t", "plan 1\npass adds\n")?;
    scripts.write("test/unit/slow_io.t", "plan 1\npass reads\n")?;
    scripts.write("test/unit/README.md", "not a test\n")?;
    scripts.write("test/smoke.t", "pass boots\n")?;

    let nested = scripts.path().join("test/unit");
    let config = HarnessConfig::discover(&nested)?;
    assert_eq!(config.base_dir(), scripts.path());
    Ok(TestSuite::new(config)?)
}

fn names(files: Vec<&TestFile>) -> Vec<&str> {
    files.into_iter().map(TestFile::name).collect()
}

#[test]
fn labels_select_files() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let suite = project(&scripts)?;

    let registry = suite.registry();
    assert_eq!(names(registry.files().collect()), vec!["math", "slow_io", "smoke"]);
    assert_eq!(
        registry.label_names().collect::<Vec<_>>(),
        vec!["unit", "slow", "smoke"]
    );

    assert_eq!(names(suite.select(["unit"])?), vec!["math", "slow_io"]);
    assert_eq!(names(suite.select(["unit", "-slow"])?), vec!["math"]);
    assert_eq!(names(suite.select(["smoke", "+unit"])?), vec!["smoke", "math", "slow_io"]);
    assert_eq!(names(suite.select(Vec::<String>::new())?).len(), 3);

    let err = suite.select(["unit", "-unit"]).unwrap_err();
    assert_eq!(err.to_string(), "no test files selected by `unit -unit`");
    let err = suite.select(["network"]).unwrap_err();
    assert!(
        matches!(err, RunError::Select(SelectError::UnknownLabel(_))),
        "{err:?}"
    );
    Ok(())
}

#[test]
fn run_reemits_frames() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let suite = project(&scripts)?;

    let mut writer = FrameWriter::new(Vec::new());
    let stats = suite.run(["slow"], &mut writer)?;
    assert!(stats.is_successful());
    assert_eq!(stats.file_count(), 2);
    assert_eq!(stats.passed(), 2);
    assert_eq!(stats.planned(), Some(1));

    let output = String::from_utf8(writer.into_inner())?;
    let lines: Vec<_> = output.lines().collect();
    assert!(lines.contains(&r#"["pass",["reads"]]"#), "{output}");
    assert!(lines.contains(&r#"["pass",["boots"]]"#), "{output}");
    assert_eq!(lines.last(), Some(&r#"["flush",[]]"#));

    let stats = suite.run(["unit", "-slow"], &mut NullSink)?;
    assert_eq!(stats.file_count(), 1);
    Ok(())
}

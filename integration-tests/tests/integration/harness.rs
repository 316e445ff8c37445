// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::Result;
use indoc::{formatdoc, indoc};
use pretty_assertions::assert_eq;
use proctest_runner::{
    config::Parallelism,
    decoder::DecoderKind,
    executable::Executable,
    list::TestFile,
    reporter::{RecordingSink, SinkCall},
    runner::HarnessBuilder,
};
use std::{fmt::Write, sync::Arc};

#[test]
fn one_process_runs_files_in_order() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let files = ["a", "b", "c"]
        .into_iter()
        .map(|name| scripts.script(&format!("{name}.t"), &format!("plan 1\npass {name}\n")))
        .collect::<Result<Vec<_>>>()?;

    let harness = HarnessBuilder::new().build();
    let mut sink = BracketChecker::new(RecordingSink::new());
    let stats = harness.run_collect(&files, &mut sink);
    let calls = sink.into_inner().into_calls();

    let paths: Vec<_> = files.iter().map(TestFile::path).collect();
    assert_eq!(focus_sequence(&calls), paths);

    // Each file is closed before the next one is focused.
    let closes: Vec<_> = calls
        .iter()
        .enumerate()
        .filter(|(_, call)| **call == SinkCall::Close)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(closes.len(), 3);
    for (close, next) in closes.iter().zip(&paths[1..]) {
        let focus = position(&calls, |call| call == &SinkCall::Focus(next.to_path_buf()));
        assert!(close < &focus, "close at {close} precedes focus of {next} at {focus}");
    }
    assert_eq!(calls.last(), Some(&SinkCall::Flush));

    assert!(stats.is_successful());
    assert_eq!(stats.file_count(), 3);
    assert_eq!(stats.passed(), 3);
    assert_eq!(stats.planned(), Some(3));
    Ok(())
}

#[test]
fn files_run_concurrently() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let markers: Vec<_> = ["a", "b", "c"].map(|name| scripts.marker(name)).into();

    // Each file waits until every file has started, which only works if all three run at once.
    let files = markers
        .iter()
        .enumerate()
        .map(|(index, marker)| {
            let mut script = format!("touch {marker}\n");
            for other in &markers {
                writeln!(script, "wait-for {other}")?;
            }
            writeln!(script, "pass file {index}")?;
            scripts.script(&format!("{index}.t"), &script)
        })
        .collect::<Result<Vec<_>>>()?;

    let harness = HarnessBuilder::new()
        .set_processes(Parallelism::Count(3))
        .build();
    let mut sink = BracketChecker::new(RecordingSink::new());
    assert!(harness.run(&files, &mut sink));
    let calls = sink.into_inner().into_calls();

    let first_close = position(&calls, |call| call == &SinkCall::Close);
    for file in &files {
        let focus = position(&calls, |call| {
            call == &SinkCall::Focus(file.path().to_path_buf())
        });
        assert!(
            focus < first_close,
            "{} was started before any file finished",
            file.path()
        );
    }
    assert_eq!(
        calls.iter().filter(|call| **call == SinkCall::Close).count(),
        3
    );
    Ok(())
}

#[test]
fn failures_do_not_stop_the_run() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let missing = Arc::new(Executable::from_args(
        "missing",
        ["/nonexistent/proctest-interpreter"],
        DecoderKind::Compact,
    )?);

    let files = vec![
        scripts.script(
            "fails.t",
            indoc! {"
                plan 2
                pass one
                fail two
            "},
        )?,
        TestFile::new(scripts.write("unrunnable.t", "")?, missing),
        scripts.script(
            "incomplete.t",
            indoc! {"
                plan 3
                pass one
            "},
        )?,
        scripts.script(
            "noisy.t",
            indoc! {"
                pass quiet
                stderr something odd
            "},
        )?,
        scripts.script("passes.t", "pass fine\n")?,
    ];

    let harness = HarnessBuilder::new()
        .set_processes(Parallelism::Count(2))
        .build();
    let mut sink = BracketChecker::new(RecordingSink::new());
    let stats = harness.run_collect(&files, &mut sink);

    assert_eq!(stats.file_count(), 5);
    assert!(stats.files().all(|file| file.is_closed()));
    assert!(!stats.is_successful());

    let failed: Vec<_> = stats.failed_files().map(|file| file.path()).collect();
    assert_eq!(
        failed,
        vec![
            files[0].path(),
            files[1].path(),
            files[2].path(),
            files[3].path(),
        ]
    );

    let fails = stats.file(files[0].path()).expect("file ran");
    assert_eq!((fails.passed(), fails.failed()), (1, 1));
    let unrunnable = stats.file(files[1].path()).expect("file ran");
    assert_eq!(unrunnable.errors(), 1);
    assert_eq!(unrunnable.total(), 0);
    assert!(stats.file(files[2].path()).expect("file ran").is_incomplete());
    assert_eq!(stats.file(files[3].path()).expect("file ran").errors(), 1);
    assert!(stats.file(files[4].path()).expect("file ran").is_successful());
    Ok(())
}

#[test]
fn output_is_attributed_to_the_right_file() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let go = scripts.marker("go");
    let slow = scripts.script(
        "slow.t",
        &formatdoc! {"
            pass slow 1
            wait-for {go}
            pass slow 2
        "},
    )?;
    let fast = scripts.script(
        "fast.t",
        &formatdoc! {"
            pass fast 1
            touch {go}
        "},
    )?;

    let harness = HarnessBuilder::new()
        .set_processes(Parallelism::Count(2))
        .build();
    let files = [slow, fast];
    let stats = harness.run_collect(&files, &mut RecordingSink::new());

    let slow_stats = stats.file(files[0].path()).expect("file ran");
    assert_eq!(slow_stats.passed(), 2);
    let fast_stats = stats.file(files[1].path()).expect("file ran");
    assert_eq!(fast_stats.passed(), 1);
    assert!(stats.is_successful());
    Ok(())
}

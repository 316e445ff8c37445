// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::Result;
use indoc::{formatdoc, indoc};
use pretty_assertions::assert_eq;
use proctest_metadata::{ErrorRecord, Event};
use proctest_runner::{
    decoder::DecoderKind,
    executable::Executable,
    list::TestFile,
    process::ProcessExit,
    reporter::RecordingSink,
    runner::Launcher,
};
use std::sync::Arc;

fn stderr_warning(message: &str, file: &TestFile) -> Event {
    Event::Error(ErrorRecord::new(message, file.path().as_str(), 0).with_kind(ErrorRecord::WARNING))
}

fn run(launcher: &mut Launcher, file: &TestFile) -> RecordingSink {
    let mut sink = RecordingSink::new();
    launcher.launch(file);
    wait_until(|| {
        launcher.proceed(&mut sink);
        launcher.is_done()
    });
    sink
}

#[test]
fn compact_frames_become_events() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let file = scripts.script(
        "math.t",
        indoc! {"
            plan 3
            pass adds
            fail subtracts
            comment thinking
            skip divides
        "},
    )?;

    let mut launcher = Launcher::new();
    let sink = run(&mut launcher, &file);
    assert_eq!(
        sink.into_events(),
        vec![
            Event::Plan(3),
            Event::pass("adds"),
            Event::fail("subtracts"),
            Event::comment("thinking"),
            Event::skip("divides", ""),
        ]
    );
    assert_eq!(launcher.last_exit(), Some(ProcessExit::Code(0)));
    Ok(())
}

#[test]
fn text_output_is_decoded() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let path = scripts.write(
        "legacy.t",
        indoc! {"
            stdout 1..1
            stdout # some commentary
            stdout ok 1 - foo
        "},
    )?;
    let executable = Arc::new(Executable::from_args(
        "emit-text",
        [EMIT_FRAMES],
        DecoderKind::Text,
    )?);
    let file = TestFile::new(path, executable);

    let mut launcher = Launcher::new();
    let sink = run(&mut launcher, &file);
    assert_eq!(
        sink.into_events(),
        vec![Event::Plan(1), Event::pass("foo")]
    );
    assert!(launcher.is_done());
    Ok(())
}

#[test]
fn partial_stderr_line_is_flushed_at_close() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let release = scripts.marker("release");
    let file = scripts.script(
        "noisy.t",
        &formatdoc! {"
            stderr Error 1
            stderr-partial Error 2
            wait-for {release}
        "},
    )?;

    let mut launcher = Launcher::new();
    let mut sink = RecordingSink::new();
    launcher.launch(&file);

    // The complete line is forwarded while the process is still running.
    wait_until(|| {
        launcher.proceed(&mut sink);
        !sink.calls().is_empty()
    });
    assert!(!launcher.is_done());
    // The fragment is held back until the process closes.
    launcher.proceed(&mut sink);
    assert_eq!(sink.calls().len(), 1);

    std::fs::write(&release, "")?;
    wait_until(|| {
        launcher.proceed(&mut sink);
        launcher.is_done()
    });

    assert_eq!(
        sink.into_events(),
        vec![
            stderr_warning("Error 1", &file),
            stderr_warning("Error 2", &file),
        ]
    );
    Ok(())
}

#[test]
fn undecodable_output_is_reported() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let file = scripts.script(
        "garbage.t",
        indoc! {"
            pass before
            stdout this is not a frame
            pass after
        "},
    )?;

    let mut launcher = Launcher::new();
    let sink = run(&mut launcher, &file);
    assert_eq!(
        sink.into_events(),
        vec![
            Event::pass("before"),
            Event::Error(
                ErrorRecord::new(
                    "could not parse test output: \"this is not a frame\"",
                    file.path().as_str(),
                    1,
                )
                .with_kind(ErrorRecord::WARNING)
            ),
        ]
    );
    Ok(())
}

#[test]
fn exit_status_is_recorded() -> Result<()> {
    test_init();
    let scripts = ScriptDir::new()?;
    let file = scripts.script(
        "crash.t",
        indoc! {"
            pass only
            exit 3
            pass unreachable
        "},
    )?;

    let mut launcher = Launcher::new();
    let sink = run(&mut launcher, &file);
    assert_eq!(sink.into_events(), vec![Event::pass("only")]);
    assert_eq!(launcher.last_exit(), Some(ProcessExit::Code(3)));
    Ok(())
}

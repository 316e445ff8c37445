// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A scripted test file runtime, used as the executable for integration tests.
//!
//! Takes the path of a script and runs it one line at a time. Each line is a command followed by
//! its argument:
//!
//! - `plan N`, `pass MSG`, `fail MSG`, `skip MSG`, `todo MSG`, `warning MSG`, `error MSG`,
//!   `comment MSG`: write the corresponding compact frame to stdout.
//! - `stdout TEXT`, `stderr TEXT`: write a raw line.
//! - `stdout-partial TEXT`, `stderr-partial TEXT`: write raw text with no line terminator.
//! - `touch PATH`: create an empty file.
//! - `wait-for PATH`: wait until a file exists (giving up after 30 seconds, with exit code 2).
//! - `sleep MS`: sleep for a number of milliseconds.
//! - `exit CODE`: exit immediately.
//!
//! Blank lines and lines starting with `#` are ignored.

use color_eyre::eyre::{Context, Result, bail, eyre};
use proctest_metadata::{ErrorRecord, FrameWriter};
use std::{
    io::{self, Write},
    path::Path,
    process::exit,
    thread,
    time::{Duration, Instant},
};

const WAIT_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    color_eyre::install()?;

    let script_path = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("usage: emit-frames <script>"))?;
    let script = std::fs::read_to_string(&script_path)
        .wrap_err_with(|| format!("failed to read script `{script_path}`"))?;

    let mut frames = FrameWriter::new(io::stdout());
    for (index, line) in script.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
        run_command(&mut frames, command, arg)
            .wrap_err_with(|| format!("{script_path}:{}: `{line}`", index + 1))?;
    }

    Ok(())
}

fn run_command(frames: &mut FrameWriter<io::Stdout>, command: &str, arg: &str) -> Result<()> {
    match command {
        "plan" => frames.plan(arg.parse()?)?,
        "pass" => frames.pass(arg)?,
        "fail" => frames.fail(arg, None)?,
        "skip" => frames.skip(arg, "")?,
        "todo" => frames.todo(arg)?,
        "warning" => frames.warning(arg, "", 0)?,
        "error" => frames.error(ErrorRecord::new(arg, "", 0))?,
        "comment" => frames.comment(arg)?,
        "stdout" => println!("{arg}"),
        "stdout-partial" => {
            let mut stdout = io::stdout();
            write!(stdout, "{arg}")?;
            stdout.flush()?;
        }
        "stderr" => eprintln!("{arg}"),
        "stderr-partial" => {
            let mut stderr = io::stderr();
            write!(stderr, "{arg}")?;
            stderr.flush()?;
        }
        "touch" => std::fs::write(arg, "")?,
        "wait-for" => {
            let start = Instant::now();
            while !Path::new(arg).exists() {
                if start.elapsed() > WAIT_TIMEOUT {
                    eprintln!("timed out waiting for `{arg}`");
                    exit(2);
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
        "sleep" => thread::sleep(Duration::from_millis(arg.parse()?)),
        "exit" => exit(arg.parse()?),
        other => bail!("unknown command `{other}`"),
    }
    Ok(())
}

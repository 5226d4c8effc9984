use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::process::Command;

use anyhow::anyhow;

/// Replaces the current process image with the supplied command, preserving
/// the wrapper's pid so signals reach the application directly. Only returns
/// if the exec itself fails.
pub fn exec_command(argv: &[OsString]) -> anyhow::Error {
    let Some((program, args)) = argv.split_first() else {
        return anyhow!("no command supplied to hand off to");
    };

    let error = Command::new(program).args(args).exec();
    anyhow::Error::new(error).context(format!("exec {program:?}"))
}

//! Runs the command described by a [`CommandRecord`] as a transparent
//! stand-in: stdio is inherited and the child's exit status becomes ours.

use std::ffi::OsString;
use std::process::{Command, ExitStatus, Stdio};

use crate::sig::IgnoreInterrupts;
use crate::{CommandRecord, DelegateError, Result};

/// Full child argv: the record's command followed by `extra_args`.
pub fn child_argv(record: &CommandRecord, extra_args: &[OsString]) -> Vec<OsString> {
    record
        .command
        .iter()
        .map(OsString::from)
        .chain(extra_args.iter().cloned())
        .collect()
}

/// Builds the child process. The program is resolved through `PATH` by
/// the OS when it has no directory component.
pub fn build_command(record: &CommandRecord, extra_args: &[OsString]) -> Command {
    let mut command = Command::new(record.program());
    command
        .args(record.fixed_args())
        .args(extra_args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

/// Spawns the child and blocks until it exits. There is no timeout.
///
/// SIGINT and SIGQUIT are ignored by the parent while it waits, so a
/// terminal interrupt reaches only the child and the parent still reports
/// the child's exit status.
pub fn run(record: &CommandRecord, extra_args: &[OsString]) -> Result<ExitStatus> {
    log::debug!("executing {:?}", child_argv(record, extra_args));

    let mut child = build_command(record, extra_args)
        .spawn()
        .map_err(|source| DelegateError::Spawn {
            program: record.program().to_string(),
            source,
        })?;
    log::debug!("spawned child pid {}", child.id());

    let interrupts = IgnoreInterrupts::install();
    let status = child
        .wait()
        .map_err(DelegateError::io("failed to wait for child process"))?;
    drop(interrupts);
    log::debug!("child finished: {status}");
    Ok(status)
}

/// Exit code the parent must terminate with to mirror `status`.
#[cfg(unix)]
pub fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        code
    } else if let Some(signal) = status.signal() {
        128 + signal
    } else {
        1
    }
}

#[cfg(not(unix))]
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    // Signal dispositions are process-wide; tests that wait on a child
    // take this lock so their handler changes do not interleave.
    static WAIT_LOCK: Mutex<()> = Mutex::new(());

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn extra_args_are_appended_in_order() {
        let record = CommandRecord::new(["echo", "a"]).unwrap();
        assert_eq!(
            child_argv(&record, &os(&["b", "c"])),
            os(&["echo", "a", "b", "c"])
        );

        let command = build_command(&record, &os(&["b", "c"]));
        assert_eq!(command.get_program(), "echo");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["a", "b", "c"]);
    }

    #[test]
    fn record_is_not_mutated() {
        let record = CommandRecord::new(["echo", "a"]).unwrap();
        let before = record.clone();
        let _ = child_argv(&record, &os(&["b"]));
        assert_eq!(record, before);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let record = CommandRecord::new(["exe-delegate-test-no-such-program"]).unwrap();
        let err = run(&record, &[]).unwrap_err();
        assert!(matches!(err, DelegateError::Spawn { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arguments_pass_through_unchanged() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![0xff, b'x']);
        let record = CommandRecord::new(["printf", "%s"]).unwrap();
        let extra = vec![raw.clone()];

        assert_eq!(
            child_argv(&record, &extra),
            vec![OsString::from("printf"), OsString::from("%s"), raw.clone()]
        );
        let command = build_command(&record, &extra);
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, [OsString::from("%s").as_os_str(), raw.as_os_str()]);
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_is_propagated() {
        let _lock = WAIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let record = CommandRecord::new(["sh", "-c", "exit 17"]).unwrap();
        let status = run(&record, &[]).unwrap();
        assert_eq!(exit_code(status), 17);

        let record = CommandRecord::new(["true"]).unwrap();
        assert_eq!(exit_code(run(&record, &[]).unwrap()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn signal_maps_to_128_plus_signal() {
        let _lock = WAIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let record = CommandRecord::new(["sh", "-c", "kill -9 $$"]).unwrap();
        let status = run(&record, &[]).unwrap();
        assert_eq!(exit_code(status), 128 + 9);
    }

    #[cfg(unix)]
    #[test]
    fn interrupt_reaches_child_and_parent_reports_its_code() {
        let _lock = WAIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // The shell interrupts its parent (this process) and then itself;
        // the parent must survive and see the trap's exit code.
        let record = CommandRecord::new([
            "sh",
            "-c",
            "trap 'exit 5' INT; sleep 0.2; kill -INT $PPID; kill -INT $$; sleep 5; exit 9",
        ])
        .unwrap();
        let status = run(&record, &[]).unwrap();
        assert_eq!(exit_code(status), 5);
    }
}

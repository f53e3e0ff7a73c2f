use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Argument that turns on diagnostic logging. It is removed from argv
/// before anything else looks at it, so wrapped commands never see it.
pub const DEBUG_FLAG: &str = "--debug-exe-delegate";

/// Process-wide configuration, built once from argv at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// argv with the debug flag removed. `args[0]` is the program name.
    pub args: Vec<OsString>,
    pub debug: bool,
    /// Resolved path of the running executable.
    pub current_exe: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_args(std::env::args_os())
    }

    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut args: Vec<OsString> = args.into_iter().collect();
        let debug = strip_debug_flag(&mut args);
        let current_exe = resolve_current_exe(args.first().map(OsString::as_os_str));
        Self {
            args,
            debug,
            current_exe,
        }
    }

    /// Everything after the program name.
    pub fn extra_args(&self) -> &[OsString] {
        self.args.get(1..).unwrap_or_default()
    }
}

/// Removes the first debug flag after argv[0]. Later copies are left in
/// place and passed through.
fn strip_debug_flag(args: &mut Vec<OsString>) -> bool {
    match args
        .iter()
        .skip(1)
        .position(|arg| arg.as_os_str() == OsStr::new(DEBUG_FLAG))
    {
        Some(index) => {
            args.remove(index + 1);
            true
        }
        None => false,
    }
}

fn resolve_current_exe(argv0: Option<&OsStr>) -> PathBuf {
    match std::env::current_exe() {
        Ok(path) => path,
        Err(err) => {
            log::debug!("current_exe unavailable ({err}), falling back to argv[0]");
            let argv0 = argv0.unwrap_or_default();
            which::which(argv0).unwrap_or_else(|_| PathBuf::from(argv0))
        }
    }
}

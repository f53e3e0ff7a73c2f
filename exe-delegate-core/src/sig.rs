//! Keeps the parent alive through terminal signals aimed at the whole
//! process group, so the child decides how to react and its exit status
//! is what gets propagated.

#[cfg(unix)]
use nix::sys::signal::{SigHandler, Signal, signal};

#[cfg(unix)]
const FORWARDED: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// Ignores SIGINT and SIGQUIT until dropped, then restores the previous
/// handlers. Install it only after the child has been spawned so the
/// child keeps default handling.
pub(crate) struct IgnoreInterrupts {
    #[cfg(unix)]
    previous: Vec<(Signal, SigHandler)>,
}

impl IgnoreInterrupts {
    #[cfg(unix)]
    pub(crate) fn install() -> Self {
        let previous = FORWARDED
            .into_iter()
            .filter_map(|sig| {
                // SAFETY: SIG_IGN is a built-in handler and runs no code.
                match unsafe { signal(sig, SigHandler::SigIgn) } {
                    Ok(previous) => Some((sig, previous)),
                    Err(err) => {
                        log::warn!("cannot ignore {sig}: {err}");
                        None
                    }
                }
            })
            .collect();
        Self { previous }
    }

    #[cfg(not(unix))]
    pub(crate) fn install() -> Self {
        Self {}
    }
}

#[cfg(unix)]
impl Drop for IgnoreInterrupts {
    fn drop(&mut self) {
        for (sig, handler) in self.previous.drain(..) {
            // SAFETY: reinstates the handler that was active before install.
            if let Err(err) = unsafe { signal(sig, handler) } {
                log::warn!("cannot restore {sig} handler: {err}");
            }
        }
    }
}

//! Signal Controller
//!
//! The interpreter survives SIGINT (its handler does nothing, and children get
//! the default disposition back before `exec`), and each SIGTSTP flips
//! foreground-only mode. Handlers only touch an atomic and call `write(2)`.

use std::sync::atomic::{AtomicBool, Ordering};

use failure::ResultExt;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::unistd;

use crate::errors::{ErrorKind, Result};

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

const ENTER_FOREGROUND_ONLY: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n";
const EXIT_FOREGROUND_ONLY: &[u8] = b"\nExiting foreground-only mode\n";

/// Returns `true` while trailing `&` markers are being ignored.
pub fn is_foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::SeqCst)
}

/// Flips foreground-only mode, returning the new state.
fn toggle_foreground_only() -> bool {
    !FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst)
}

extern "C" fn handle_sigint(_: libc::c_int) {}

extern "C" fn handle_sigtstp(_: libc::c_int) {
    let message = if toggle_foreground_only() {
        ENTER_FOREGROUND_ONLY
    } else {
        EXIT_FOREGROUND_ONLY
    };
    let _ = unistd::write(libc::STDOUT_FILENO, message);
}

/// Installs the interpreter's SIGINT and SIGTSTP handlers.
///
/// All catchable signals are blocked while a handler runs, and interrupted
/// system calls are restarted so a toggle never aborts a pending read.
pub fn install_handlers() -> Result<()> {
    let sigint = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );
    let sigtstp = SigAction::new(
        SigHandler::Handler(handle_sigtstp),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );

    // sigaction(2) is unsafe because handlers must be async-signal-safe; ours
    // only use an atomic and write(2).
    unsafe {
        signal::sigaction(Signal::SIGINT, &sigint).context(ErrorKind::Nix)?;
        signal::sigaction(Signal::SIGTSTP, &sigtstp).context(ErrorKind::Nix)?;
    }

    debug!("installed SIGINT and SIGTSTP handlers");
    Ok(())
}

/// Resets signal dispositions in a freshly forked child.
///
/// SIGINT goes back to the default so Ctrl-C kills foreground work. SIGTSTP
/// is ignored, and an ignored disposition survives `exec`, so only the
/// interpreter reacts to the foreground-only toggle.
pub fn reset_for_child() -> nix::Result<()> {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    unsafe {
        signal::sigaction(Signal::SIGINT, &default)?;
        signal::sigaction(Signal::SIGTSTP, &ignore)?;
    }

    Ok(())
}

/// Blocks SIGINT and SIGTSTP for the calling thread and returns the previous
/// mask. Held across `fork` so a child can never run the interpreter's
/// handlers before `reset_for_child`.
pub fn block_handled_signals() -> nix::Result<SigSet> {
    let mut blocked = SigSet::empty();
    blocked.add(Signal::SIGINT);
    blocked.add(Signal::SIGTSTP);

    let mut previous = SigSet::empty();
    signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&blocked), Some(&mut previous))?;
    Ok(previous)
}

/// Reinstates a mask returned by `block_handled_signals`.
pub fn restore_signal_mask(previous: &SigSet) -> nix::Result<()> {
    signal::pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(previous), None)
}

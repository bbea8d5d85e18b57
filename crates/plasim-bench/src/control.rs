//! Cooperative cancellation and checkpoint-dump requests.
//!
//! Workers poll a [`Control`] token between trials. On Unix, SIGUSR1 requests
//! a dump of the latest checkpoint and SIGINT requests an orderly stop; a
//! second SIGINT while the first is still being honoured exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Default)]
struct Flags {
    interrupt: AtomicBool,
    dump: AtomicBool,
}

/// Shared cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Control {
    flags: Arc<Flags>,
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask workers to stop after their current trial.
    pub fn request_interrupt(&self) {
        self.flags.interrupt.store(true, Ordering::SeqCst);
    }

    /// Ask one worker to print the latest checkpoint.
    pub fn request_dump(&self) {
        self.flags.dump.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flags.interrupt.load(Ordering::Relaxed)
    }

    /// Consume a pending dump request. Only one caller observes `true`.
    pub fn take_dump_request(&self) -> bool {
        self.flags.dump.swap(false, Ordering::AcqRel)
    }
}

static SIGNAL_TARGET: OnceLock<Control> = OnceLock::new();

/// Route SIGINT and SIGUSR1 to `control`.
///
/// Only the first installed token receives signals; returns `false` if a
/// different token was installed before or signals are unsupported.
pub fn install_signal_handlers(control: &Control) -> bool {
    let installed = SIGNAL_TARGET.get_or_init(|| control.clone());
    if !Arc::ptr_eq(&installed.flags, &control.flags) {
        return false;
    }
    register()
}

#[cfg(unix)]
extern "C" fn handle_signal(signal: libc::c_int) {
    let Some(control) = SIGNAL_TARGET.get() else {
        return;
    };
    match signal {
        libc::SIGINT => {
            if control.is_interrupted() {
                // SAFETY: _exit is async-signal-safe.
                unsafe { libc::_exit(130) };
            }
            control.request_interrupt();
        }
        libc::SIGUSR1 => control.request_dump(),
        _ => {}
    }
}

#[cfg(unix)]
fn register() -> bool {
    let handler = handle_signal as *const () as libc::sighandler_t;
    // SAFETY: the handler only touches atomics and async-signal-safe calls.
    unsafe {
        libc::signal(libc::SIGINT, handler) != libc::SIG_ERR
            && libc::signal(libc::SIGUSR1, handler) != libc::SIG_ERR
    }
}

#[cfg(not(unix))]
fn register() -> bool {
    false
}

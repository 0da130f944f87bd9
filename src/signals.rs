//! Interrupt handling while a script runs as a child process.
//!
//! The handler keeps this process alive until the child has been reaped. The
//! first interrupt or termination request is relayed to the child as `SIGTERM`,
//! a repeated one as `SIGKILL`. A request that arrives before the child is
//! known is relayed as soon as it is. On platforms without signals the console
//! already delivers the interrupt to the child and nothing is relayed.

use std::sync::Once;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use tracing::{debug, warn};

static INSTALL: Once = Once::new();
static SLOT: ChildSlot = ChildSlot::new();

/// Install the process-wide handler. Safe to call more than once.
pub fn install() {
    INSTALL.call_once(|| {
        if let Err(err) = ctrlc::set_handler(|| SLOT.signal()) {
            warn!(%err, "could not install signal handler");
        }
    });
}

/// Marks `pid` as the child to relay signals to until the guard is dropped.
pub fn watch(pid: u32) -> Watch<'static> {
    SLOT.watch(pid)
}

/// The running child and the number of signals received for it.
struct ChildSlot {
    pid: AtomicU32,
    received: AtomicUsize,
}

impl ChildSlot {
    const fn new() -> Self {
        Self {
            pid: AtomicU32::new(0),
            received: AtomicUsize::new(0),
        }
    }

    fn watch(&self, pid: u32) -> Watch<'_> {
        self.pid.store(pid, Ordering::SeqCst);
        let pending = self.received.load(Ordering::SeqCst);
        if pid != 0 && pending > 0 {
            debug!(pid, pending, "relaying signal received before spawn");
            relay(pid, pending > 1);
        }
        Watch { slot: self }
    }

    fn signal(&self) {
        let count = self.received.fetch_add(1, Ordering::SeqCst) + 1;
        let pid = self.pid.load(Ordering::SeqCst);
        debug!(pid, count, "signal received while waiting for script");
        if pid != 0 {
            relay(pid, count > 1);
        }
    }
}

pub struct Watch<'a> {
    slot: &'a ChildSlot,
}

impl Drop for Watch<'_> {
    fn drop(&mut self) {
        self.slot.pid.store(0, Ordering::SeqCst);
        self.slot.received.store(0, Ordering::SeqCst);
    }
}

#[cfg(unix)]
fn relay(pid: u32, force: bool) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
    if let Err(err) = kill(Pid::from_raw(raw), signal) {
        // The child may already be gone.
        debug!(%err, ?signal, "could not relay signal");
    }
}

#[cfg(not(unix))]
fn relay(_pid: u32, _force: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        install();
        install();
    }

    #[test]
    fn dropping_watch_clears_slot() {
        let slot = ChildSlot::new();
        {
            let _guard = slot.watch(0);
            slot.signal();
            assert_eq!(slot.received.load(Ordering::SeqCst), 1);
        }
        assert_eq!(slot.pid.load(Ordering::SeqCst), 0);
        assert_eq!(slot.received.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    fn sleeper() -> std::process::Child {
        std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep")
    }

    #[cfg(unix)]
    fn killed_by(child: &mut std::process::Child) -> Option<i32> {
        use std::os::unix::process::ExitStatusExt;
        child.wait().expect("wait").signal()
    }

    #[test]
    #[cfg(unix)]
    fn relay_terminates_child() {
        use nix::sys::signal::Signal;

        let mut child = sleeper();
        relay(child.id(), false);

        assert_eq!(killed_by(&mut child), Some(Signal::SIGTERM as i32));
    }

    #[test]
    #[cfg(unix)]
    fn signal_while_watching_reaches_child() {
        use nix::sys::signal::Signal;

        let slot = ChildSlot::new();
        let mut child = sleeper();
        let _guard = slot.watch(child.id());
        slot.signal();

        assert_eq!(killed_by(&mut child), Some(Signal::SIGTERM as i32));
    }

    #[test]
    #[cfg(unix)]
    fn signal_before_spawn_is_relayed_on_watch() {
        use nix::sys::signal::Signal;

        let slot = ChildSlot::new();
        slot.signal();
        let mut child = sleeper();
        let _guard = slot.watch(child.id());

        assert_eq!(killed_by(&mut child), Some(Signal::SIGTERM as i32));
    }

    #[test]
    #[cfg(unix)]
    fn repeated_signal_before_spawn_kills_child() {
        use nix::sys::signal::Signal;

        let slot = ChildSlot::new();
        slot.signal();
        slot.signal();
        let mut child = sleeper();
        let _guard = slot.watch(child.id());

        assert_eq!(killed_by(&mut child), Some(Signal::SIGKILL as i32));
    }
}

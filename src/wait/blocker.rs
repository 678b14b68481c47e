/*!
 * Wait Blocker
 * The suspension primitive: registers interest in a child transition and
 * parks the calling thread until a qualifying transition or an
 * interruption wakes it.
 *
 * Race safety: the already-satisfied check and the interest registration
 * happen in one critical section under the registry lock, the same lock
 * lifecycle transitions mutate state under. A transition can therefore
 * never fall between the check and the registration.
 */

use crate::core::types::Pid;
use crate::process::table::{ProcessTable, TableInner};
use crate::process::types::ThreadState;
use crate::wait::types::{WaitEvent, WaitOutcome, WaitSpecification, WaitTarget};
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// State of one parked waiter, filled in by the notifier
enum WaitCell {
    Pending,
    Satisfied(Pid),
    Interrupted,
}

/// Ephemeral record tying a waiting thread to its specification. Lives in
/// the registry's waiter list only for the duration of one wait call.
pub(crate) struct WaitRegistration {
    owner: Pid,
    target: WaitTarget,
    report_continued: bool,
    cell: Mutex<WaitCell>,
    condvar: Condvar,
}

impl WaitRegistration {
    fn new(owner: Pid, target: WaitTarget, report_continued: bool) -> Self {
        Self {
            owner,
            target,
            report_continued,
            cell: Mutex::new(WaitCell::Pending),
            condvar: Condvar::new(),
        }
    }

    /// Does a transition of `pid` (whose parent is `parent`) qualify?
    fn matches(&self, pid: Pid, parent: Option<Pid>, event: WaitEvent) -> bool {
        if event == WaitEvent::Continued && !self.report_continued {
            return false;
        }
        match self.target {
            WaitTarget::AnyChild => parent == Some(self.owner),
            WaitTarget::Process(target) => target == pid,
        }
    }

    /// Deliver a qualifying transition. First notification wins; later
    /// ones leave the cell untouched.
    fn satisfy(&self, pid: Pid) {
        let mut cell = self.cell.lock();
        if matches!(*cell, WaitCell::Pending) {
            *cell = WaitCell::Satisfied(pid);
            self.condvar.notify_one();
        }
    }

    fn interrupt(&self) {
        let mut cell = self.cell.lock();
        if matches!(*cell, WaitCell::Pending) {
            *cell = WaitCell::Interrupted;
            self.condvar.notify_one();
        }
    }

    /// Park until notified. Re-checks the cell on every wake, so a
    /// spurious wake goes back to sleep.
    fn park(&self) -> WaitOutcome {
        let mut cell = self.cell.lock();
        loop {
            match *cell {
                WaitCell::Pending => self.condvar.wait(&mut cell),
                WaitCell::Satisfied(pid) => return WaitOutcome::Satisfied(pid),
                WaitCell::Interrupted => return WaitOutcome::Interrupted,
            }
        }
    }
}

/// Wake every registered waiter whose specification matches this
/// transition. Called by the lifecycle operations while they still hold
/// the registry lock, which is what closes the missed-wakeup window.
pub(crate) fn wake_matching(inner: &mut TableInner, pid: Pid, event: WaitEvent) {
    let parent = inner.processes.get(&pid).and_then(|d| d.parent);
    for waiter in &inner.waiters {
        if waiter.matches(pid, parent, event) {
            debug!("waking waiter {} for {:?} of process {}", waiter.owner, event, pid);
            waiter.satisfy(pid);
        }
    }
}

/// A child that already satisfies the specification at registration time.
///
/// An exact-pid target that no longer exists also counts as ready: the
/// caller re-resolves the pid after the blocker returns and reports the
/// vanished child there. Continue transitions are edge-observed and never
/// satisfy at registration time.
fn find_ready(inner: &TableInner, caller: Pid, target: WaitTarget) -> Option<Pid> {
    match target {
        WaitTarget::Process(pid) => match inner.processes.get(&pid) {
            None => Some(pid),
            Some(desc) if desc.is_dead() || desc.state() == ThreadState::Stopped => Some(pid),
            Some(_) => None,
        },
        WaitTarget::AnyChild => inner
            .children_of(caller)
            .into_iter()
            .find(|pid| {
                inner
                    .processes
                    .get(pid)
                    .map(|d| d.is_dead() || d.state() == ThreadState::Stopped)
                    .unwrap_or(false)
            }),
    }
}

/// The suspension primitive
pub struct WaitBlocker {
    table: Arc<ProcessTable>,
}

impl WaitBlocker {
    pub fn new(table: Arc<ProcessTable>) -> Self {
        Self { table }
    }

    /// Block `caller` until a qualifying transition, an interruption, or
    /// (for non-blocking calls) immediately.
    ///
    /// The registry lock is held from the readiness check through the
    /// registration and released before parking; it is NOT held while
    /// suspended.
    pub fn block(&self, caller: Pid, spec: &WaitSpecification) -> WaitOutcome {
        let registration = {
            let mut inner = self.table.lock();
            if let Some(pid) = find_ready(&inner, caller, spec.target) {
                debug!("wait by {} already satisfied by process {}", caller, pid);
                return WaitOutcome::Satisfied(pid);
            }
            if spec.options.non_blocking() {
                return WaitOutcome::WouldBlock;
            }
            let registration = Arc::new(WaitRegistration::new(
                caller,
                spec.target,
                spec.options.report_continued(),
            ));
            inner.waiters.push(Arc::clone(&registration));
            debug!("process {} parked waiting on {:?}", caller, spec.target);
            registration
        };

        let outcome = registration.park();

        // The registration is single-use; drop it from the list on the way out
        let mut inner = self.table.lock();
        inner
            .waiters
            .retain(|w| !Arc::ptr_eq(w, &registration));
        debug!("process {} woke: {:?}", caller, outcome);
        outcome
    }

    /// Signal-delivery hook: abort every pending wait owned by `pid`.
    /// Leaves the watched processes untouched.
    pub fn interrupt(&self, pid: Pid) {
        let inner = self.table.lock();
        for waiter in &inner.waiters {
            if waiter.owner == pid {
                waiter.interrupt();
            }
        }
    }
}

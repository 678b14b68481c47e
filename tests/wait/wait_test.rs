/*!
 * Wait Operation Tests
 * End-to-end scenarios against the wait orchestration layer
 */

use pretty_assertions::assert_eq;
use procwait::{
    ChildSelector, ExitStatus, ProcessTable, Signal, StatusCode, SyscallExecutor, UserMemory,
    WaitError, WaitOptions,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn setup() -> (Arc<ProcessTable>, Arc<SyscallExecutor>) {
    let table = Arc::new(ProcessTable::new());
    let memory = Arc::new(UserMemory::new());
    let executor = Arc::new(SyscallExecutor::new(Arc::clone(&table), memory));
    (table, executor)
}

#[test]
fn test_exit_then_wait_end_to_end() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 100).unwrap();
    let b = table.spawn("b", Some(a), 100).unwrap();

    // B still alive: non-blocking probe reports nothing ready
    let probe = WaitOptions::EXITED | WaitOptions::NOHANG;
    assert_eq!(executor.do_waitid(a, ChildSelector::All, probe), Ok(None));

    table.exit(b, ExitStatus::Exited(7)).unwrap();

    let record = executor
        .do_waitid(a, ChildSelector::All, WaitOptions::EXITED)
        .unwrap()
        .unwrap();
    assert_eq!(record.signal, Signal::SIGCHLD.number());
    assert_eq!(record.pid, b);
    assert_eq!(record.uid, 100);
    assert_eq!(record.code, StatusCode::Exited as u32);
    assert_eq!(record.value, 7);

    // B was reaped: waiting on it again fails
    assert_eq!(
        executor.do_waitid(a, ChildSelector::Pid(b), WaitOptions::EXITED),
        Err(WaitError::NoSuchChild(b))
    );
    assert!(!table.exists(b));
}

#[test]
fn test_wait_on_stopped_child_leaves_it_registered() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 0).unwrap();
    let b = table.spawn("b", Some(a), 0).unwrap();

    table.stop(b, Signal::SIGTSTP).unwrap();

    let record = executor
        .do_waitid(a, ChildSelector::Pid(b), WaitOptions::EXITED)
        .unwrap()
        .unwrap();
    assert_eq!(record.pid, b);
    assert_eq!(record.code, StatusCode::Stopped as u32);
    assert_eq!(record.value, Signal::SIGTSTP.number() as i32);

    // Stop reporting does not reap
    assert!(table.exists(b));

    // The stop state persists, so another wait observes it again
    let record = executor
        .do_waitid(a, ChildSelector::All, WaitOptions::EXITED)
        .unwrap()
        .unwrap();
    assert_eq!(record.code, StatusCode::Stopped as u32);
}

#[test]
fn test_blocking_wait_wakes_on_exit() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 0).unwrap();
    let b = table.spawn("b", Some(a), 0).unwrap();

    let executor2 = Arc::clone(&executor);
    let waiter =
        thread::spawn(move || executor2.do_waitid(a, ChildSelector::All, WaitOptions::EXITED));

    thread::sleep(Duration::from_millis(50));
    table.exit(b, ExitStatus::Killed(Signal::SIGKILL)).unwrap();

    let record = waiter.join().unwrap().unwrap().unwrap();
    assert_eq!(record.pid, b);
    assert_eq!(record.code, StatusCode::Killed as u32);
    assert_eq!(record.value, Signal::SIGKILL.number() as i32);
}

#[test]
fn test_continue_before_registration_is_invisible() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 0).unwrap();
    let b = table.spawn("b", Some(a), 0).unwrap();

    table.stop(b, Signal::SIGSTOP).unwrap();
    table.resume(b).unwrap();

    // The continue already happened; a fresh non-blocking wait sees a
    // running child and nothing ready, even when asking for continues
    let options = WaitOptions::EXITED | WaitOptions::CONTINUED | WaitOptions::NOHANG;
    assert_eq!(executor.do_waitid(a, ChildSelector::All, options), Ok(None));
}

#[test]
fn test_parked_continued_waiter_reports_continue_race() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 0).unwrap();
    let b = table.spawn("b", Some(a), 0).unwrap();

    let executor2 = Arc::clone(&executor);
    let options = WaitOptions::EXITED | WaitOptions::CONTINUED;
    let waiter = thread::spawn(move || executor2.do_waitid(a, ChildSelector::Pid(b), options));

    thread::sleep(Duration::from_millis(50));
    // Stop wakes the waiter; the immediate resume can beat its re-lock, in
    // which case it observes a running child and reports Continued
    table.stop(b, Signal::SIGSTOP).unwrap();
    table.resume(b).unwrap();

    let record = waiter.join().unwrap().unwrap().unwrap();
    assert_eq!(record.pid, b);
    assert!(
        record.code == StatusCode::Stopped as u32 || record.code == StatusCode::Continued as u32
    );
    assert_eq!(record.value, Signal::SIGSTOP.number() as i32);
    assert!(table.exists(b));
}

#[test]
fn test_waiting_with_no_children_fails() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 0).unwrap();

    assert_eq!(
        executor.do_waitid(a, ChildSelector::All, WaitOptions::EXITED),
        Err(WaitError::NoChildren(a))
    );
    assert_eq!(
        executor.do_waitid(
            a,
            ChildSelector::All,
            WaitOptions::EXITED | WaitOptions::NOHANG
        ),
        Err(WaitError::NoChildren(a))
    );
}

#[test]
fn test_group_selector_rejected_without_registering() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 0).unwrap();
    let _b = table.spawn("b", Some(a), 0).unwrap();

    let err = executor.do_waitid(a, ChildSelector::Group(1), WaitOptions::EXITED);
    assert!(matches!(err, Err(WaitError::InvalidArgument(_))));
    assert_eq!(table.waiter_count(), 0);
}

#[test]
fn test_any_child_reaps_each_dead_child_once() {
    let (table, executor) = setup();
    let a = table.spawn("a", None, 0).unwrap();
    let c1 = table.spawn("c1", Some(a), 0).unwrap();
    let c2 = table.spawn("c2", Some(a), 0).unwrap();

    table.exit(c1, ExitStatus::Exited(1)).unwrap();
    table.exit(c2, ExitStatus::Exited(2)).unwrap();

    let mut seen = Vec::new();
    for _ in 0..2 {
        let record = executor
            .do_waitid(a, ChildSelector::All, WaitOptions::EXITED)
            .unwrap()
            .unwrap();
        seen.push((record.pid, record.value));
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![(c1, 1), (c2, 2)]);

    // Both reaped: no waitable children remain
    assert_eq!(
        executor.do_waitid(a, ChildSelector::All, WaitOptions::EXITED),
        Err(WaitError::NoChildren(a))
    );
}

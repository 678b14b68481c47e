/*!
 * Wait Race Tests
 * Thread-based checks of the concurrency contract: no missed wakeups,
 * exactly-once reaping, and interruption semantics
 */

use procwait::{
    ChildSelector, ExitStatus, ProcessTable, Signal, StatusCode, SyscallExecutor, UserMemory,
    WaitError, WaitOptions,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn setup() -> (Arc<ProcessTable>, Arc<SyscallExecutor>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let table = Arc::new(ProcessTable::new());
    let memory = Arc::new(UserMemory::new());
    let executor = Arc::new(SyscallExecutor::new(Arc::clone(&table), memory));
    (table, executor)
}

#[test]
fn test_no_missed_wakeup_under_racing_exit() {
    let (table, executor) = setup();
    let parent = table.spawn("parent", None, 0).unwrap();

    // The exit races the registration with no artificial delay; whichever
    // side wins the lock, the waiter must observe the exit
    for round in 0..50 {
        let child = table.spawn("child", Some(parent), 0).unwrap();

        let executor2 = Arc::clone(&executor);
        let waiter = thread::spawn(move || {
            executor2.do_waitid(parent, ChildSelector::Pid(child), WaitOptions::EXITED)
        });

        let table2 = Arc::clone(&table);
        let exiter = thread::spawn(move || {
            table2.exit(child, ExitStatus::Exited(round)).unwrap();
        });

        let record = waiter.join().unwrap().unwrap().unwrap();
        assert_eq!(record.pid, child);
        assert_eq!(record.value, round);
        exiter.join().unwrap();
    }
}

#[test]
fn test_exactly_once_reap_among_concurrent_waiters() {
    let (table, executor) = setup();
    let parent = table.spawn("parent", None, 0).unwrap();
    let child = table.spawn("child", Some(parent), 0).unwrap();

    let mut waiters = Vec::new();
    for _ in 0..4 {
        let executor2 = Arc::clone(&executor);
        waiters.push(thread::spawn(move || {
            executor2.do_waitid(parent, ChildSelector::Pid(child), WaitOptions::EXITED)
        }));
    }

    thread::sleep(Duration::from_millis(50));
    table.exit(child, ExitStatus::Exited(3)).unwrap();

    let mut reaped = 0;
    let mut vanished = 0;
    for waiter in waiters {
        match waiter.join().unwrap() {
            Ok(Some(record)) => {
                assert_eq!(record.pid, child);
                assert_eq!(record.value, 3);
                reaped += 1;
            }
            Err(WaitError::NoSuchChild(pid)) => {
                assert_eq!(pid, child);
                vanished += 1;
            }
            other => panic!("unexpected wait outcome: {:?}", other),
        }
    }
    assert_eq!(reaped, 1);
    assert_eq!(vanished, 3);
    assert!(!table.exists(child));
}

#[test]
fn test_interruption_leaves_target_untouched() {
    let (table, executor) = setup();
    let parent = table.spawn("parent", None, 0).unwrap();
    let child = table.spawn("child", Some(parent), 0).unwrap();

    let executor2 = Arc::clone(&executor);
    let waiter = thread::spawn(move || {
        executor2.do_waitid(parent, ChildSelector::Pid(child), WaitOptions::EXITED)
    });

    thread::sleep(Duration::from_millis(50));
    executor.interrupt(parent);

    assert_eq!(waiter.join().unwrap(), Err(WaitError::Interrupted));
    assert!(table.exists(child));
    assert_eq!(table.waiter_count(), 0);

    // Interruption reaps nothing: the exit is still observable afterwards
    table.exit(child, ExitStatus::Exited(0)).unwrap();
    let record = executor
        .do_waitid(parent, ChildSelector::Pid(child), WaitOptions::EXITED)
        .unwrap()
        .unwrap();
    assert_eq!(record.code, StatusCode::Exited as u32);
}

#[test]
fn test_stop_wakes_only_matching_parent() {
    let (table, executor) = setup();
    let parent_a = table.spawn("parent-a", None, 0).unwrap();
    let parent_b = table.spawn("parent-b", None, 0).unwrap();
    let child_a = table.spawn("child-a", Some(parent_a), 0).unwrap();
    let child_b = table.spawn("child-b", Some(parent_b), 0).unwrap();

    let executor2 = Arc::clone(&executor);
    let waiter_b = thread::spawn(move || {
        executor2.do_waitid(parent_b, ChildSelector::All, WaitOptions::EXITED)
    });

    thread::sleep(Duration::from_millis(50));
    // A transition on A's child must not satisfy B's waiter
    table.stop(child_a, Signal::SIGSTOP).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(table.waiter_count(), 1);

    table.exit(child_b, ExitStatus::Exited(9)).unwrap();
    let record = waiter_b.join().unwrap().unwrap().unwrap();
    assert_eq!(record.pid, child_b);
    assert_eq!(record.value, 9);
}

#[test]
fn test_concurrent_nohang_probes_never_block() {
    let (table, executor) = setup();
    let parent = table.spawn("parent", None, 0).unwrap();
    let _child = table.spawn("child", Some(parent), 0).unwrap();

    let options = WaitOptions::EXITED | WaitOptions::NOHANG;
    let mut probes = Vec::new();
    for _ in 0..8 {
        let executor2 = Arc::clone(&executor);
        probes.push(thread::spawn(move || {
            executor2.do_waitid(parent, ChildSelector::All, options)
        }));
    }
    for probe in probes {
        assert_eq!(probe.join().unwrap(), Ok(None));
    }
    assert_eq!(table.waiter_count(), 0);
}

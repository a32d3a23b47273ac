/*!
 * Collect Tests
 * Who may collect whom, and what is left afterwards
 */

use lifecycle_kernel::process::{AddressSpaceManager, ProcessScheduler, ThreadEntry};
use lifecycle_kernel::{
    ExitReason, MemoryManager, Pid, Process, ProcessError, ProcessManager, ScheduleError,
    TrapFrame, WaitOptions,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Keeps children alive without running them
#[derive(Default)]
struct ParkedScheduler {
    parked: Mutex<Vec<Arc<Process>>>,
}

impl ParkedScheduler {
    fn process(&self, pid: Pid) -> Arc<Process> {
        self.parked
            .lock()
            .iter()
            .find(|p| p.pid() == Some(pid))
            .cloned()
            .unwrap()
    }
}

impl ProcessScheduler for ParkedScheduler {
    fn schedule_new(
        &self,
        process: Arc<Process>,
        _frame: TrapFrame,
        _entry: ThreadEntry,
    ) -> Result<(), ScheduleError> {
        self.parked.lock().push(process);
        Ok(())
    }
}

fn setup() -> (ProcessManager, Arc<ParkedScheduler>, Arc<Process>) {
    let memory = MemoryManager::new(128);
    let scheduler = Arc::new(ParkedScheduler::default());
    let manager = ProcessManager::builder()
        .with_max_processes(16)
        .with_memory(Arc::new(memory.clone()))
        .with_scheduler(scheduler.clone())
        .build();
    let init = Process::new("init");
    init.install_address_space(memory.create(1).unwrap());
    manager.register_root(&init).unwrap();
    (manager, scheduler, init)
}

fn fork(
    manager: &ProcessManager,
    scheduler: &ParkedScheduler,
    parent: &Arc<Process>,
) -> (Pid, Arc<Process>) {
    let pid = manager
        .spawn(parent, &TrapFrame::default(), Box::new(|_, _| {}))
        .unwrap();
    (pid, scheduler.process(pid))
}

#[test]
fn test_sibling_cannot_collect() {
    let (manager, scheduler, init) = setup();
    let (a, first) = fork(&manager, &scheduler, &init);
    let (b, second) = fork(&manager, &scheduler, &init);
    let _ = manager.terminate(&second, ExitReason::Exited(0));

    assert_eq!(
        manager.collect(&first, b, WaitOptions::NONE).unwrap_err(),
        ProcessError::NotAChild { pid: b, caller: a }
    );
    // Rejection leaves the record for the real parent
    assert!(manager.table().contains(b));
    manager.collect(&init, b, WaitOptions::NONE).unwrap();
}

#[test]
fn test_grandparent_cannot_collect() {
    let (manager, scheduler, init) = setup();
    let (_, child) = fork(&manager, &scheduler, &init);
    let (grandchild, descendant) = fork(&manager, &scheduler, &child);
    let _ = manager.terminate(&descendant, ExitReason::Exited(4));

    assert!(matches!(
        manager.collect(&init, grandchild, WaitOptions::NONE),
        Err(ProcessError::NotAChild { .. })
    ));
    let (_, status) = manager.collect(&child, grandchild, WaitOptions::NONE).unwrap();
    assert_eq!(status.exit_code(), Some(4));
}

#[test]
fn test_second_collect_finds_nothing() {
    let (manager, scheduler, init) = setup();
    let (pid, child) = fork(&manager, &scheduler, &init);
    let _ = manager.terminate(&child, ExitReason::Exited(9));

    manager.collect(&init, pid, WaitOptions::NONE).unwrap();
    assert_eq!(
        manager.collect(&init, pid, WaitOptions::NONE).unwrap_err(),
        ProcessError::NoSuchProcess(pid)
    );
    assert_eq!(manager.process_count(), 1);
}

#[test]
fn test_unsupported_options_touch_nothing() {
    let (manager, scheduler, init) = setup();
    let (pid, child) = fork(&manager, &scheduler, &init);
    let _ = manager.terminate(&child, ExitReason::Exited(1));

    for bits in [1, 2, 3, -1] {
        assert!(matches!(
            manager.collect(&init, pid, WaitOptions::from_bits(bits)),
            Err(ProcessError::InvalidArgument(_))
        ));
    }
    assert!(manager.table().lookup(pid).unwrap().is_finished());
}

#[test]
fn test_signaled_child_reports_signal() {
    let (manager, scheduler, init) = setup();
    let (pid, child) = fork(&manager, &scheduler, &init);
    let _ = manager.terminate(&child, ExitReason::Signaled(9));

    let (_, status) = manager.collect(&init, pid, WaitOptions::NONE).unwrap();
    assert_eq!(status.term_signal(), Some(9));
    assert_eq!(status.exit_code(), None);
}

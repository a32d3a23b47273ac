/*!
 * Spawn Failure Tests
 * Every failure path of spawn rolls back completely
 */

use lifecycle_kernel::memory::{AddressSpace, MemoryResult};
use lifecycle_kernel::process::{AddressSpaceManager, ProcessScheduler, ThreadEntry};
use lifecycle_kernel::{
    MemoryError, MemoryManager, Pid, Process, ProcessError, ProcessManager, ScheduleError,
    TrapFrame,
};
use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;

mock! {
    pub Memory {}

    impl AddressSpaceManager for Memory {
        fn create(&self, pages: usize) -> MemoryResult<AddressSpace>;
        fn duplicate(&self, source: &AddressSpace) -> MemoryResult<AddressSpace>;
        fn destroy(&self, space: AddressSpace);
    }
}

mock! {
    pub Scheduler {}

    impl ProcessScheduler for Scheduler {
        fn schedule_new(
            &self,
            process: Arc<Process>,
            frame: TrapFrame,
            entry: ThreadEntry,
        ) -> Result<(), ScheduleError>;
        fn process_exited(&self, pid: Pid);
    }
}

fn root(memory: &MemoryManager) -> Arc<Process> {
    let init = Process::new("init");
    init.install_address_space(memory.create(2).unwrap());
    init
}

#[test]
fn test_copy_failure_leaves_no_record() {
    let backing = MemoryManager::new(8);
    let mut memory = MockMemory::new();
    memory.expect_duplicate().times(1).returning(|source| {
        Err(MemoryError::OutOfMemory {
            requested: source.pages(),
            available: 0,
            total: 8,
        })
    });
    memory.expect_destroy().never();

    let mut scheduler = MockScheduler::new();
    scheduler.expect_schedule_new().never();

    let manager = ProcessManager::builder()
        .with_memory(Arc::new(memory))
        .with_scheduler(Arc::new(scheduler))
        .build();
    let init = root(&backing);
    manager.register_root(&init).unwrap();

    let err = manager
        .spawn(&init, &TrapFrame::default(), Box::new(|_, _| {}))
        .unwrap_err();
    assert_eq!(
        err,
        ProcessError::OutOfMemory {
            requested: 2,
            available: 0
        }
    );
    assert_eq!(manager.process_count(), 1);
}

#[test]
fn test_schedule_failure_releases_everything() {
    let memory = MemoryManager::new(16);
    let mut scheduler = MockScheduler::new();
    scheduler
        .expect_schedule_new()
        .times(1)
        .returning(|process, _, _| {
            Err(ScheduleError::SpawnFailed {
                pid: process.pid().unwrap_or_default(),
                reason: "no threads left".into(),
            })
        });

    let manager = ProcessManager::builder()
        .with_memory(Arc::new(memory.clone()))
        .with_scheduler(Arc::new(scheduler))
        .build();
    let init = root(&memory);
    manager.register_root(&init).unwrap();
    let before = memory.stats();

    let err = manager
        .spawn(&init, &TrapFrame::default(), Box::new(|_, _| {}))
        .unwrap_err();
    assert!(matches!(err, ProcessError::SchedulingFailed(_)));
    assert_eq!(manager.process_count(), 1);
    assert!(!manager.table().contains(2));
    assert_eq!(memory.stats(), before);

    // The identifier was never consumed
    assert_eq!(manager.table().allocate(&Process::new("next"), Some(1)).unwrap(), 2);
}

#[test]
fn test_out_of_memory_with_real_budget() {
    let memory = MemoryManager::new(3);
    let manager = ProcessManager::builder()
        .with_memory(Arc::new(memory.clone()))
        .with_scheduler(Arc::new(MockScheduler::new()))
        .build();
    let init = root(&memory);
    manager.register_root(&init).unwrap();

    let err = manager
        .spawn(&init, &TrapFrame::default(), Box::new(|_, _| {}))
        .unwrap_err();
    assert_eq!(
        err,
        ProcessError::OutOfMemory {
            requested: 2,
            available: 1
        }
    );
    assert_eq!(memory.stats().used_pages, 2);
}

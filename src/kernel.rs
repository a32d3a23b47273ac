/*!
 * Kernel
 *
 * Wires the process manager to its hosted collaborators and boots the
 * first user process. Waiting for quiescence stands in for the boot menu
 * sleeping until the last user process is gone.
 */

use crate::arch::{MipsContextCloner, TrapFrame};
use crate::core::config::KernelConfig;
use crate::core::limits::USER_BASE;
use crate::core::types::{KernelResult, Pid};
use crate::memory::{MemoryManager, MemoryStats};
use crate::process::{
    AddressSpaceManager, Exited, Process, ProcessInfo, ProcessManager, ProcessScheduler,
    SchedulerStats, ThreadScheduler,
};
use crate::syscalls::{launcher, SyscallDispatcher, UserContext};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Point-in-time view of kernel state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct KernelSnapshot {
    pub processes: Vec<ProcessInfo>,
    pub memory: MemoryStats,
    pub scheduler: SchedulerStats,
}

/// The assembled kernel
pub struct Kernel {
    config: KernelConfig,
    memory: MemoryManager,
    scheduler: Arc<ThreadScheduler>,
    manager: Arc<ProcessManager>,
    dispatcher: SyscallDispatcher,
}

impl Kernel {
    pub fn new(config: KernelConfig) -> KernelResult<Self> {
        config.validate()?;

        let memory = MemoryManager::new(config.memory_pages);
        let scheduler = Arc::new(ThreadScheduler::new());
        let manager = Arc::new(
            ProcessManager::builder()
                .with_max_processes(config.max_processes)
                .with_memory(Arc::new(memory.clone()))
                .with_context_cloner(Arc::new(MipsContextCloner))
                .with_scheduler(scheduler.clone())
                .build(),
        );
        let dispatcher = SyscallDispatcher::new(Arc::clone(&manager));

        info!(
            max_processes = config.max_processes,
            memory_pages = config.memory_pages,
            process_pages = config.process_pages,
            "Kernel initialized"
        );

        Ok(Self {
            config,
            memory,
            scheduler,
            manager,
            dispatcher,
        })
    }

    /// Start `program` as a process with no parent
    ///
    /// The process gets a fresh address space and a stack at the top of it.
    pub fn boot<F>(&self, name: &str, program: F) -> KernelResult<Pid>
    where
        F: FnOnce(UserContext) -> Exited + Send + 'static,
    {
        let process = Process::new(name);
        let space = self.memory.create(self.config.process_pages)?;
        let frame = TrapFrame::new(USER_BASE as u64, space.end() as u64);
        process.install_address_space(space);

        let pid = match self.manager.register_root(&process) {
            Ok(pid) => pid,
            Err(e) => {
                self.release(&process);
                return Err(e.into());
            }
        };

        let entry = launcher(self.dispatcher.clone(), Box::new(program));
        if let Err(e) = self.scheduler.schedule_new(Arc::clone(&process), frame, entry) {
            warn!(pid, "Failed to start root process: {}", e);
            self.manager.table().remove(pid);
            self.release(&process);
            return Err(e.into());
        }

        info!(pid, name, "Booted root process");
        Ok(pid)
    }

    /// Block until every process thread has finished
    pub fn wait_for_quiescence(&self) {
        self.scheduler.wait_idle();
    }

    /// Boot `program` and wait for it and all its descendants
    pub fn run<F>(&self, name: &str, program: F) -> KernelResult<Pid>
    where
        F: FnOnce(UserContext) -> Exited + Send + 'static,
    {
        let pid = self.boot(name, program)?;
        self.wait_for_quiescence();
        Ok(pid)
    }

    /// Refuse new processes and wait for the running ones
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        info!(remaining = self.manager.process_count(), "Kernel shut down");
    }

    fn release(&self, process: &Process) {
        if let Some(space) = process.take_address_space() {
            self.memory.destroy(space);
        }
    }

    #[inline]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    #[inline]
    pub fn manager(&self) -> &Arc<ProcessManager> {
        &self.manager
    }

    #[inline]
    pub fn dispatcher(&self) -> &SyscallDispatcher {
        &self.dispatcher
    }

    #[inline]
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    #[inline]
    pub fn scheduler(&self) -> &Arc<ThreadScheduler> {
        &self.scheduler
    }

    pub fn snapshot(&self) -> KernelSnapshot {
        KernelSnapshot {
            processes: self.manager.list_processes(),
            memory: self.memory.stats(),
            scheduler: self.scheduler.stats(),
        }
    }
}

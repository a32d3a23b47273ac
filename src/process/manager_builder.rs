/*!
 * Process Manager Builder
 * Builder pattern for ProcessManager construction
 */

use super::manager::ProcessManager;
use super::scheduler::ThreadScheduler;
use super::table::ProcessTable;
use super::traits::{AddressSpaceManager, ContextCloner, ProcessScheduler};
use crate::arch::MipsContextCloner;
use crate::core::limits::{DEFAULT_MAX_PROCESSES, DEFAULT_MEMORY_PAGES};
use crate::memory::MemoryManager;
use std::sync::Arc;
use tracing::info;

/// Builder for ProcessManager
///
/// Any collaborator left unset falls back to the hosted default.
pub struct ProcessManagerBuilder {
    max_processes: usize,
    memory: Option<Arc<dyn AddressSpaceManager>>,
    cloner: Option<Arc<dyn ContextCloner>>,
    scheduler: Option<Arc<dyn ProcessScheduler>>,
}

impl ProcessManagerBuilder {
    /// Create a new ProcessManager builder
    pub fn new() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            memory: None,
            cloner: None,
            scheduler: None,
        }
    }

    /// Set the process table capacity
    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes;
        self
    }

    /// Use this address-space manager
    pub fn with_memory(mut self, memory: Arc<dyn AddressSpaceManager>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Use this context cloner
    pub fn with_context_cloner(mut self, cloner: Arc<dyn ContextCloner>) -> Self {
        self.cloner = Some(cloner);
        self
    }

    /// Use this scheduler
    pub fn with_scheduler(mut self, scheduler: Arc<dyn ProcessScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Build the ProcessManager
    pub fn build(self) -> ProcessManager {
        let mut defaults = Vec::new();

        let memory = self.memory.unwrap_or_else(|| {
            defaults.push("memory");
            Arc::new(MemoryManager::new(DEFAULT_MEMORY_PAGES))
        });
        let cloner = self.cloner.unwrap_or_else(|| {
            defaults.push("context-cloner");
            Arc::new(MipsContextCloner)
        });
        let scheduler = self.scheduler.unwrap_or_else(|| {
            defaults.push("thread-scheduler");
            Arc::new(ThreadScheduler::new())
        });

        if defaults.is_empty() {
            info!(capacity = self.max_processes, "Process manager initialized");
        } else {
            info!(
                capacity = self.max_processes,
                "Process manager initialized with default {}",
                defaults.join(", ")
            );
        }

        ProcessManager {
            table: Arc::new(ProcessTable::new(self.max_processes)),
            memory,
            cloner,
            scheduler,
        }
    }
}

impl Default for ProcessManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

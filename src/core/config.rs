/*!
 * Kernel Configuration
 *
 * Runtime configuration for the process table and simulated memory.
 * Sources, in increasing precedence: defaults, JSON file, KERNEL_* environment.
 */

use super::errors::KernelError;
use super::limits::{
    DEFAULT_MAX_PROCESSES, DEFAULT_MEMORY_PAGES, DEFAULT_PROCESS_PAGES, MAX_PROCESSES_CEILING,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KernelConfig {
    /// Process table capacity (identifiers 1..=max_processes)
    pub max_processes: usize,
    /// Total simulated memory, in pages
    pub memory_pages: usize,
    /// Pages in the root process address space
    pub process_pages: usize,
    /// Emit JSON log lines instead of compact text
    pub trace_json: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            memory_pages: DEFAULT_MEMORY_PAGES,
            process_pages: DEFAULT_PROCESS_PAGES,
            trace_json: false,
        }
    }
}

impl KernelConfig {
    /// Small configuration for tests and demos
    pub const fn compact(max_processes: usize) -> Self {
        Self {
            max_processes,
            memory_pages: 1024,
            process_pages: 4,
            trace_json: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_memory_pages(mut self, memory_pages: usize) -> Self {
        self.memory_pages = memory_pages;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_process_pages(mut self, process_pages: usize) -> Self {
        self.process_pages = process_pages;
        self
    }

    /// Defaults overridden by environment variables
    ///
    /// - KERNEL_MAX_PROCESSES
    /// - KERNEL_MEMORY_PAGES
    /// - KERNEL_PROCESS_PAGES
    /// - KERNEL_TRACE_JSON ("1" or "true")
    pub fn from_env() -> Result<Self, KernelError> {
        Self::default().merge_env()
    }

    /// Load a JSON config file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KernelError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply KERNEL_* environment overrides on top of this config
    pub fn merge_env(mut self) -> Result<Self, KernelError> {
        if let Some(value) = env_usize("KERNEL_MAX_PROCESSES")? {
            self.max_processes = value;
        }
        if let Some(value) = env_usize("KERNEL_MEMORY_PAGES")? {
            self.memory_pages = value;
        }
        if let Some(value) = env_usize("KERNEL_PROCESS_PAGES")? {
            self.process_pages = value;
        }
        if let Ok(value) = std::env::var("KERNEL_TRACE_JSON") {
            self.trace_json = value == "1" || value == "true";
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if self.max_processes == 0 || self.max_processes > MAX_PROCESSES_CEILING {
            return Err(KernelError::Config(format!(
                "max_processes must be in 1..={}, got {}",
                MAX_PROCESSES_CEILING, self.max_processes
            )));
        }
        if self.process_pages == 0 {
            return Err(KernelError::Config("process_pages must be non-zero".into()));
        }
        if self.process_pages > self.memory_pages {
            return Err(KernelError::Config(format!(
                "process_pages ({}) exceeds memory_pages ({})",
                self.process_pages, self.memory_pages
            )));
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Result<Option<usize>, KernelError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| KernelError::Config(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}

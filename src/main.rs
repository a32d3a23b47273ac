/*!
 * Lifecycle Kernel - Main Entry Point
 *
 * Boots an init process that runs a small fork/wait workload, then prints
 * the final process table and memory accounting as JSON.
 */

use anyhow::Context;
use lifecycle_kernel::{init_tracing, Errno, Kernel, KernelConfig, UserContext, WaitOptions};
use tracing::{info, warn};

const WORKERS: i32 = 4;

/// Worker: forks a helper, collects it and exits with the helper's code
fn worker(mut ctx: UserContext, index: i32) -> lifecycle_kernel::Exited {
    let helper = match ctx.fork(move |ctx| ctx.exit(index * 10)) {
        Ok(pid) => pid,
        Err(errno) => {
            warn!(%errno, "Worker could not fork");
            return ctx.exit(1);
        }
    };
    match ctx.waitpid(helper, WaitOptions::NONE) {
        Ok((_, status)) => ctx.exit(status.exit_code().unwrap_or(-1)),
        Err(_) => ctx.exit(2),
    }
}

fn init(mut ctx: UserContext) -> lifecycle_kernel::Exited {
    let base = lifecycle_kernel::core::limits::USER_BASE;
    let _ = ctx.write_word(base, 42);

    let mut children = Vec::new();
    for index in 1..=WORKERS {
        match ctx.fork(move |ctx| worker(ctx, index)) {
            Ok(pid) => children.push(pid),
            Err(errno) => warn!(%errno, index, "Fork failed"),
        }
    }

    // Never collected: reclaimed when init exits
    let _ = ctx.fork(|ctx| ctx.exit(0));

    // The child sees a copy of the parent's memory
    if let Ok(pid) = ctx.fork(move |mut ctx| {
        let seen = ctx.read_word(base).unwrap_or(-1);
        let _ = ctx.write_word(base, 7);
        ctx.exit(seen)
    }) {
        if let Ok((_, status)) = ctx.waitpid(pid, WaitOptions::NONE) {
            info!(
                child_saw = ?status.exit_code(),
                parent_still_has = ?ctx.read_word(base).ok(),
                "Address space copy"
            );
        }
    }

    for pid in children {
        match ctx.waitpid(pid, WaitOptions::NONE) {
            Ok((pid, status)) => info!(pid, code = ?status.exit_code(), "Worker collected"),
            Err(errno) => warn!(pid, %errno, "waitpid failed"),
        }
    }

    let rejected = ctx.waitpid(1, WaitOptions::WNOHANG);
    info!(result = ?rejected.map_err(|e: Errno| e.code()), "WNOHANG is unsupported");

    ctx.exit(0)
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::var("KERNEL_CONFIG") {
        Ok(path) => KernelConfig::from_file(&path)
            .and_then(KernelConfig::merge_env)
            .with_context(|| format!("loading {}", path))?,
        Err(_) => KernelConfig::from_env().context("reading KERNEL_* environment")?,
    };
    init_tracing(config.trace_json);

    info!("Lifecycle kernel starting...");
    let kernel = Kernel::new(config)?;
    let pid = kernel.run("init", init)?;
    info!(pid, "Init finished; system quiescent");
    kernel.shutdown();

    println!("{}", serde_json::to_string_pretty(&kernel.snapshot())?);
    Ok(())
}

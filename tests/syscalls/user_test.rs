/*!
 * User Context Tests
 * The library-level wrappers as a user program sees them
 */

use lifecycle_kernel::core::limits::USER_BASE;
use lifecycle_kernel::process::{WaitKind, SIGABRT};
use lifecycle_kernel::{Errno, Kernel, KernelConfig, WaitOptions};
use pretty_assertions::assert_eq;
use std::sync::mpsc;

fn kernel() -> Kernel {
    Kernel::new(KernelConfig::compact(16)).unwrap()
}

#[test]
fn test_child_learns_own_pid() {
    let kernel = kernel();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let child_tx = tx.clone();
            let forked = ctx
                .fork(move |mut ctx| {
                    child_tx.send(ctx.getpid().unwrap()).unwrap();
                    ctx.exit(0)
                })
                .unwrap();
            ctx.waitpid(forked, WaitOptions::NONE).unwrap();
            tx.send(forked).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    let seen_by_child = rx.recv().unwrap();
    let returned_to_parent = rx.recv().unwrap();
    assert_eq!(seen_by_child, returned_to_parent);
}

#[test]
fn test_fault_keeps_status_for_retry() {
    let kernel = kernel();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let child = ctx.fork(|ctx| ctx.exit(7)).unwrap();
            let bad = ctx.waitpid_raw(i64::from(child), 0x10, WaitOptions::NONE);
            let good = ctx.waitpid(child, WaitOptions::NONE);
            let again = ctx.waitpid(child, WaitOptions::NONE);
            tx.send((bad, good, again)).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    let (bad, good, again) = rx.recv().unwrap();
    assert_eq!(bad, Err(Errno::EFAULT));
    let (_, status) = good.unwrap();
    assert_eq!(status.exit_code(), Some(7));
    assert_eq!(again.unwrap_err(), Errno::ESRCH);
}

#[test]
fn test_high_status_pointer_faults_instead_of_reaping() {
    let kernel = kernel();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let child = ctx.fork(|ctx| ctx.exit(4)).unwrap();
            let bad = ctx.waitpid_raw(i64::from(child), usize::MAX - 3, WaitOptions::NONE);
            let retry = ctx.waitpid(child, WaitOptions::NONE);
            tx.send((bad, retry)).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    let (bad, retry) = rx.recv().unwrap();
    assert_eq!(bad, Err(Errno::EFAULT));
    let (_, status) = retry.unwrap();
    assert_eq!(status.exit_code(), Some(4));
}

#[test]
fn test_wait_errors() {
    let kernel = kernel();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let child = ctx.fork(|ctx| ctx.exit(0)).unwrap();
            let results = vec![
                ctx.waitpid(child, WaitOptions::WNOHANG).map(|_| ()),
                ctx.waitpid(child, WaitOptions::WUNTRACED).map(|_| ()),
                ctx.waitpid(999, WaitOptions::NONE).map(|_| ()),
                ctx.waitpid_raw(-1, 0, WaitOptions::NONE).map(|_| ()),
                ctx.waitpid(1, WaitOptions::NONE).map(|_| ()),
            ];
            ctx.waitpid(child, WaitOptions::NONE).unwrap();
            tx.send(results).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    assert_eq!(
        rx.recv().unwrap(),
        vec![
            Err(Errno::EINVAL),
            Err(Errno::EINVAL),
            Err(Errno::ESRCH),
            Err(Errno::ESRCH),
            Err(Errno::ECHILD),
        ]
    );
}

#[test]
fn test_child_gets_a_copy_of_memory() {
    let kernel = kernel();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            ctx.write_word(USER_BASE, 42).unwrap();
            let child = ctx
                .fork(|mut ctx| {
                    let seen = ctx.read_word(USER_BASE).unwrap();
                    ctx.write_word(USER_BASE, 7).unwrap();
                    ctx.exit(seen)
                })
                .unwrap();
            let (_, status) = ctx.waitpid(child, WaitOptions::NONE).unwrap();
            tx.send((status.exit_code(), ctx.read_word(USER_BASE))).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    assert_eq!(rx.recv().unwrap(), (Some(42), Ok(42)));
}

#[test]
fn test_panicking_program_is_reported_as_signaled() {
    let kernel = kernel();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let child = ctx
                .fork(|_ctx| panic!("user program crashed"))
                .unwrap();
            tx.send(ctx.waitpid(child, WaitOptions::NONE)).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    let (_, status) = rx.recv().unwrap().unwrap();
    assert_eq!(status.kind(), WaitKind::Signaled);
    assert_eq!(status.term_signal(), Some(SIGABRT));
    assert!(kernel.manager().list_processes().is_empty());
}

#[test]
fn test_table_full_is_enproc() {
    let kernel = Kernel::new(KernelConfig::compact(2)).unwrap();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let first = ctx.fork(|ctx| ctx.exit(0)).unwrap();
            let second = ctx.fork(|ctx| ctx.exit(0));
            ctx.waitpid(first, WaitOptions::NONE).unwrap();
            tx.send(second).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    assert_eq!(rx.recv().unwrap(), Err(Errno::ENPROC));
}

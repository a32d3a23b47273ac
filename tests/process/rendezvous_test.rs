/*!
 * Rendezvous Tests
 * Exit/wait ordering in both directions, run on real process threads
 */

use lifecycle_kernel::{Kernel, KernelConfig, WaitOptions};
use pretty_assertions::assert_eq;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_child_exits_before_parent_waits() {
    let kernel = Kernel::new(KernelConfig::compact(8)).unwrap();
    let manager = Arc::clone(kernel.manager());
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let child = ctx.fork(|ctx| ctx.exit(7)).unwrap();
            while !manager.table().lookup(child).unwrap().is_finished() {
                thread::yield_now();
            }
            tx.send((child, ctx.waitpid(child, WaitOptions::NONE))).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    let (child, result) = rx.recv().unwrap();
    let (reaped, status) = result.unwrap();
    assert_eq!(child, 2);
    assert_eq!(reaped, child);
    assert_eq!(status.raw(), 28);
    assert_eq!(status.exit_code(), Some(7));
    assert!(kernel.manager().list_processes().is_empty());
}

#[test]
fn test_parent_waits_before_child_exits() {
    let kernel = Kernel::new(KernelConfig::compact(8)).unwrap();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let child = ctx
                .fork(|ctx| {
                    thread::sleep(Duration::from_millis(50));
                    ctx.exit(3)
                })
                .unwrap();
            tx.send(ctx.waitpid(child, WaitOptions::NONE)).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    let (_, status) = rx.recv().unwrap().unwrap();
    assert_eq!(status.exit_code(), Some(3));
    assert_eq!(kernel.manager().process_count(), 0);
}

#[test]
fn test_many_children_each_collected_once() {
    let kernel = Kernel::new(KernelConfig::compact(32)).unwrap();
    let (tx, rx) = mpsc::channel();

    kernel
        .run("init", move |mut ctx| {
            let children: Vec<_> = (0..10)
                .map(|code| ctx.fork(move |ctx| ctx.exit(code)).unwrap())
                .collect();
            let codes: Vec<_> = children
                .iter()
                .rev()
                .map(|&pid| ctx.waitpid(pid, WaitOptions::NONE).unwrap().1.exit_code())
                .collect();
            tx.send(codes).unwrap();
            ctx.exit(0)
        })
        .unwrap();

    let codes = rx.recv().unwrap();
    let expected: Vec<_> = (0..10).rev().map(Some).collect();
    assert_eq!(codes, expected);
    assert_eq!(kernel.memory().stats().used_pages, 0);
}

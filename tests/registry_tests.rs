//! Registration through the module entry and re-registration semantics.

mod common;

use std::ffi::{CStr, c_char};
use std::sync::atomic::{AtomicU64, Ordering};

use yumstudio::entry::{YumStudioModuleEntry, ys_get_native};
use yumstudio::prelude::*;
use yumstudio::sys::{INVALID_NODE, ysnative};
use yumstudio::{NativeTable, Slots};

static A_CALLS: AtomicU64 = AtomicU64::new(0);
static B_CALLS: AtomicU64 = AtomicU64::new(0);
static FREED: AtomicU64 = AtomicU64::new(INVALID_NODE);
static FREE_COUNT: AtomicU64 = AtomicU64::new(0);

unsafe extern "C" fn create_42() -> u64 {
    A_CALLS.fetch_add(1, Ordering::SeqCst);
    42
}

unsafe extern "C" fn parent_a(_node: u64) -> u64 {
    A_CALLS.fetch_add(1, Ordering::SeqCst);
    1
}

unsafe extern "C" fn create_b() -> u64 {
    B_CALLS.fetch_add(1, Ordering::SeqCst);
    7
}

unsafe extern "C" fn parent_b(_node: u64) -> u64 {
    B_CALLS.fetch_add(1, Ordering::SeqCst);
    2
}

unsafe extern "C" fn record_free(node: u64) {
    FREED.store(node, Ordering::SeqCst);
    FREE_COUNT.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn never_found(_name: *const c_char) -> u64 {
    INVALID_NODE
}

unsafe extern "C" fn only_root(name: *const c_char) -> u64 {
    let name = unsafe { CStr::from_ptr(name) };
    if name == c"Root" { 3 } else { INVALID_NODE }
}

fn table_a() -> ysnative {
    ysnative {
        create: Some(create_42),
        get_parent: Some(parent_a),
        queuefree: Some(record_free),
        get_node: Some(never_found),
        ..ysnative::zeroed()
    }
}

fn table_b() -> ysnative {
    ysnative {
        create: Some(create_b),
        get_parent: Some(parent_b),
        queuefree: Some(record_free),
        get_node: Some(only_root),
        ..ysnative::zeroed()
    }
}

#[test]
fn entry_registers_the_host_table() {
    let _guard = common::serial();
    let before = yumstudio::generation();
    let raw = table_a();
    unsafe { YumStudioModuleEntry(&raw) };

    assert_eq!(yumstudio::generation(), before + 1);
    let node = Node::create().unwrap();
    assert_eq!(node.uid(), Uid::new(42));
    node.into_uid();
}

#[test]
fn null_entry_keeps_current_table() {
    let _guard = common::serial();
    let raw = table_a();
    unsafe { YumStudioModuleEntry(&raw) };
    let generation = yumstudio::generation();

    unsafe { YumStudioModuleEntry(std::ptr::null()) };
    assert_eq!(yumstudio::generation(), generation);
    assert_eq!(yumstudio::get_table().create(), Uid::new(42));
}

#[test]
fn get_native_exposes_the_registered_record() {
    let _guard = common::serial();
    let raw = table_b();
    unsafe { YumStudioModuleEntry(&raw) };

    let exported = ys_get_native();
    assert!(!exported.is_null());
    let create = unsafe { (*exported).create }.expect("create slot");
    assert_eq!(unsafe { create() }, 7);
    assert!(unsafe { (*exported).connect }.is_none());
}

#[test]
fn reregistration_never_mixes_tables() {
    let _guard = common::serial();
    let raw_a = table_a();
    unsafe { YumStudioModuleEntry(&raw_a) };
    let node = Node::from_uid(Uid::new(5));
    assert_eq!(node.get_parent(), Uid::new(1));

    let raw_b = table_b();
    unsafe { YumStudioModuleEntry(&raw_b) };
    let a_before = A_CALLS.load(Ordering::SeqCst);
    let b_before = B_CALLS.load(Ordering::SeqCst);

    // The existing handle follows the new table too.
    assert_eq!(node.get_parent(), Uid::new(2));
    let created = Node::create().unwrap();
    assert_eq!(created.uid(), Uid::new(7));

    assert_eq!(A_CALLS.load(Ordering::SeqCst), a_before);
    assert_eq!(B_CALLS.load(Ordering::SeqCst), b_before + 2);
    node.into_uid();
    created.into_uid();
}

#[test]
fn drop_frees_exactly_once_per_handle() {
    let _guard = common::serial();
    let raw = table_a();
    unsafe { YumStudioModuleEntry(&raw) };
    let count = FREE_COUNT.load(Ordering::SeqCst);

    let node = Node::create().unwrap();
    let alias = Node::from_uid(node.uid());
    drop(node);
    assert_eq!(FREED.load(Ordering::SeqCst), 42);
    assert_eq!(FREE_COUNT.load(Ordering::SeqCst), count + 1);

    drop(alias);
    assert_eq!(FREE_COUNT.load(Ordering::SeqCst), count + 2);
}

#[test]
fn lookup_follows_the_table() {
    let _guard = common::serial();
    let raw_a = table_a();
    unsafe { YumStudioModuleEntry(&raw_a) };
    assert!(Node::from_name("Root").unwrap_err().is_not_found());

    let raw_b = table_b();
    unsafe { YumStudioModuleEntry(&raw_b) };
    let root = Node::from_name("Root").unwrap();
    assert_eq!(root.uid(), Uid::new(3));
    root.into_uid();
}

#[test]
fn ensure_ready_checks_required_slots() {
    let _guard = common::serial();
    let raw = table_a();
    unsafe { YumStudioModuleEntry(&raw) };

    let required = Slots::CREATE | Slots::QUEUEFREE;
    let table: &NativeTable = yumstudio::ensure_ready(required).unwrap();
    assert!(!table.is_ready());
    assert_eq!(
        yumstudio::ensure_ready(Slots::all()).unwrap_err(),
        NativeError::NotRegistered(
            Slots::ADD_CHILD
                | Slots::ADD_CHILDREN
                | Slots::CONNECT
                | Slots::GET_PARENTS
                | Slots::GET_CHILDREN
        )
    );
}

#[test]
#[should_panic(expected = "native slot GET_CHILDREN is not registered")]
fn calling_a_null_slot_panics() {
    let _guard = common::serial();
    let raw = table_a();
    unsafe { YumStudioModuleEntry(&raw) };
    Node::from_uid(Uid::new(1)).get_children(4);
}

#[test]
fn fake_table_is_complete() {
    assert!(yumstudio::fake::native_table().is_ready());
}

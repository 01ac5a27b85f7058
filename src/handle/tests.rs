//! Tests for the handle registry

use super::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn test_first_handle_is_one() {
    let registry = HandleRegistry::new();
    assert_eq!(registry.allocate("a").as_raw(), 1);
    assert_eq!(registry.allocate("b").as_raw(), 2);
}

#[test]
fn test_resolve_unknown_handle() {
    let registry: HandleRegistry<String> = HandleRegistry::new();
    assert_eq!(
        registry.resolve(Handle::from_raw(42)),
        Err(RegistryError::NotFound(42))
    );
    assert_eq!(
        registry.resolve(Handle::from_raw(0)),
        Err(RegistryError::NotFound(0))
    );
    assert_eq!(
        registry.resolve(Handle::from_raw(-1)),
        Err(RegistryError::NotFound(-1))
    );
}

#[test]
fn test_release_then_resolve_is_not_found() {
    let registry = HandleRegistry::new();
    let handle = registry.allocate(String::from("section"));
    assert_eq!(registry.resolve(handle).unwrap(), "section");

    assert_eq!(registry.release(handle), Some(String::from("section")));
    assert!(registry.resolve(handle).is_err());
    assert!(registry.is_empty());
}

#[test]
fn test_double_release_is_reported() {
    let registry = HandleRegistry::new();
    let handle = registry.allocate(7u32);
    assert_eq!(registry.release(handle), Some(7));
    assert_eq!(registry.release(handle), None);
}

#[test]
fn test_released_values_are_not_recycled() {
    let registry = HandleRegistry::new();
    let first = registry.allocate(1);
    registry.release(first);
    let second = registry.allocate(2);
    assert_ne!(first, second);
    assert_eq!(second.as_raw(), 2);
}

#[test]
fn test_wraparound_skips_live_handles() {
    let registry = HandleRegistry::new();
    let one = registry.allocate("live");
    registry.inner.lock().next = i32::MAX;

    let max = registry.allocate("max");
    assert_eq!(max.as_raw(), i32::MAX);

    // Counter wraps to 1, which is still live, so 2 is handed out.
    let wrapped = registry.allocate("wrapped");
    assert_eq!(one.as_raw(), 1);
    assert_eq!(wrapped.as_raw(), 2);
}

#[test]
fn test_concurrent_allocation_is_unique() {
    let registry = Arc::new(HandleRegistry::new());
    let threads: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                (0..200)
                    .map(|i| registry.allocate(t * 1000 + i).as_raw())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for thread in threads {
        for raw in thread.join().unwrap() {
            assert!(seen.insert(raw), "handle {} issued twice", raw);
        }
    }
    assert_eq!(registry.len(), 1600);
}

#[derive(Debug, Clone)]
enum Op {
    Allocate,
    Release(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Allocate),
        1 => (0usize..64).prop_map(Op::Release),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Live handles are unique and released handles never resolve again.
    #[test]
    fn allocate_release_laws(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let registry = HandleRegistry::new();
        let mut live: Vec<Handle> = Vec::new();
        let mut released: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate => {
                    let handle = registry.allocate(live.len());
                    prop_assert!(!live.contains(&handle));
                    prop_assert!(handle.as_raw() >= 1);
                    live.push(handle);
                }
                Op::Release(i) if !live.is_empty() => {
                    let handle = live.remove(i % live.len());
                    prop_assert!(registry.release(handle).is_some());
                    released.push(handle);
                }
                Op::Release(_) => {}
            }
        }

        for handle in &released {
            prop_assert!(registry.resolve(*handle).is_err());
        }
        for handle in &live {
            prop_assert!(registry.resolve(*handle).is_ok());
        }
        prop_assert_eq!(registry.len(), live.len());
    }
}

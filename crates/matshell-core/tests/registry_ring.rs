use matshell_core::{Matrix, MatrixError, Registry};
use matshell_contracts::DEFAULT_REGISTRY_CAPACITY;

fn named(name: &str) -> Matrix {
    Matrix::new(name, 2, 2).expect("create matrix")
}

#[test]
fn capacity_plus_one_inserts_overwrite_slot_zero() {
    let cap = DEFAULT_REGISTRY_CAPACITY;
    let mut reg = Registry::new(cap).expect("registry");
    for i in 0..cap {
        let ins = reg.insert(named(&format!("m{i}")));
        assert_eq!(ins.slot, i);
        assert!(ins.evicted.is_none());
    }
    let ins = reg.insert(named("last"));
    assert_eq!(ins.slot, 0);
    assert_eq!(ins.evicted.as_ref().map(|n| n.as_str()), Some("m0"));

    assert_eq!(reg.get(0).expect("slot 0").name().as_str(), "last");
    assert!(matches!(
        reg.find_by_name("m0"),
        Err(MatrixError::NotFound { .. })
    ));
    assert_eq!(reg.find_by_name("m1").expect("m1"), 1);
    assert_eq!(reg.len(), cap);
}

#[test]
fn destroy_all_twice_leaves_registry_empty() {
    let mut reg = Registry::new(3).expect("registry");
    reg.insert(named("a"));
    reg.insert(named("b"));
    assert_eq!(reg.destroy_all(), 2);
    assert!(reg.is_empty());
    assert_eq!(reg.destroy_all(), 0);
    assert!(reg.is_empty());
    assert!(reg.find_by_name("a").is_err());
}

#[test]
fn cursor_keeps_advancing_after_destroy_all() {
    let mut reg = Registry::new(2).expect("registry");
    reg.insert(named("a"));
    reg.destroy_all();
    // The ring position is not reset by clearing slots.
    assert_eq!(reg.insert(named("b")).slot, 1);
    assert_eq!(reg.insert(named("c")).slot, 0);
}

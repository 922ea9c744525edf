//! Tests for the tracing setup.

use std::sync::Mutex;

use spyke_core::tracing::setup::init_tracing;

static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_per_module_filter_is_accepted() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("SPYKE_LOG", "spyke_curation::analyzer=debug,spyke_curation::executor=info");
    init_tracing();
    std::env::remove_var("SPYKE_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_filter_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("SPYKE_LOG", "[[not a filter");
    init_tracing();
    std::env::remove_var("SPYKE_LOG");
}

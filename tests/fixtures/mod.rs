//! Shared test fixtures
//!
//! Each integration-test binary compiles its own copy and uses a subset.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cim_circuits::{output, Output};

/// Continuation that appends every delivered value to a shared sink.
pub fn collector<T: Send + 'static>() -> (Output<T>, Arc<Mutex<Vec<T>>>) {
    let sink = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&sink);
    (
        output(move |value| captured.lock().unwrap().push(value)),
        sink,
    )
}

/// Snapshot of everything a collector has received so far.
pub fn collected<T: Clone>(sink: &Arc<Mutex<Vec<T>>>) -> Vec<T> {
    sink.lock().unwrap().clone()
}

/// Install a test subscriber so `RUST_LOG` surfaces circuit tracing.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

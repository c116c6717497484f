//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use minicache::cache::{CacheEvent, CacheObserver};
use minicache::{BoxError, Handler};

/// Records `(kind, key)` for every cache event.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<(String, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.events().into_iter().map(|(kind, _)| kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl CacheObserver for RecordingObserver {
    fn on_event(&self, event: &CacheEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push((event.kind().to_string(), event.key().to_string()));
    }
}

/// Handler answering `hello <segment 1>` and counting its invocations.
pub fn greeter(calls: Arc<AtomicUsize>) -> impl Handler {
    move |segments: Vec<String>| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let name = segments.get(1).cloned().unwrap_or_default();
            Ok::<_, BoxError>(Bytes::from(format!("hello {name}")))
        }
    }
}

/// Handler that always fails.
pub fn failing(message: &'static str) -> impl Handler {
    move |_segments: Vec<String>| async move { Err::<Bytes, BoxError>(message.into()) }
}

/// Handler returning a fixed body.
pub fn fixed(body: &'static str) -> impl Handler {
    move |_segments: Vec<String>| async move { Ok::<_, BoxError>(Bytes::from_static(body.as_bytes())) }
}

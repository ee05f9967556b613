use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, continuing with the inner value if a panicking thread
/// poisoned it.
pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|e| {
        tracing::warn!("{} mutex poisoned; continuing", name);
        e.into_inner()
    })
}

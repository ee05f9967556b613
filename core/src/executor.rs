//! Dedicated sequential execution context.
//!
//! A [`SerialExecutor`] owns one named worker thread and runs submitted jobs
//! one at a time, in submission order. A job submitted from inside another
//! job runs after the current one returns.

use std::sync::Mutex;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::sync::lock;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct SerialExecutor {
    name: String,
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SerialExecutor {
    /// Spawn the worker thread.
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let (tx, rx) = mpsc::channel::<Job>();

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            // Ends once every sender is gone and the queue is empty.
            for job in rx {
                job();
            }
        })?;

        Ok(Self {
            name,
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Queue a job. Returns `false` if the executor has been shut down.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match lock(&self.tx, &self.name).as_ref() {
            Some(tx) => tx.send(Box::new(job)).is_ok(),
            None => {
                tracing::warn!("{}: job submitted after shutdown", self.name);
                false
            }
        }
    }

    /// Stop accepting jobs, let queued jobs finish, and join the worker.
    ///
    /// Calling this from a job running on the worker only closes the queue.
    pub fn shutdown(&self) {
        lock(&self.tx, &self.name).take();

        let handle = lock(&self.handle, &self.name).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!("{}: worker thread panicked", self.name);
            }
        }
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_jobs_run_in_order() {
        let executor = SerialExecutor::spawn("test-executor").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let seen = seen.clone();
            assert!(executor.submit(move || seen.lock().unwrap().push(i)));
        }
        executor.shutdown();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_jobs_never_overlap() {
        let executor = SerialExecutor::spawn("test-executor").unwrap();
        let active = Arc::new(Mutex::new(0usize));
        let max_active = Arc::new(Mutex::new(0usize));

        for _ in 0..4 {
            let active = active.clone();
            let max_active = max_active.clone();
            executor.submit(move || {
                let now = {
                    let mut a = active.lock().unwrap();
                    *a += 1;
                    *a
                };
                {
                    let mut m = max_active.lock().unwrap();
                    *m = (*m).max(now);
                }
                thread::sleep(std::time::Duration::from_millis(10));
                *active.lock().unwrap() -= 1;
            });
        }
        executor.shutdown();

        assert_eq!(*max_active.lock().unwrap(), 1);
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let executor = SerialExecutor::spawn("test-executor").unwrap();
        executor.shutdown();
        assert!(!executor.submit(|| {}));
    }
}

//! Serial callback dispatcher.
//!
//! # Responsibility
//! - Run posted jobs one at a time, in submission order, on a dedicated thread.
//!
//! # Invariants
//! - Clones share one worker thread and one queue.
//! - The worker exits after the last handle is dropped and the queue drains.
//! - A panicking job is logged and does not stop the worker.

use crate::error::{InquiryError, InquiryResult};
use log::{debug, error};
use std::fmt::{Debug, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

static NEXT_HANDLER_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerInner>,
}

struct HandlerInner {
    name: String,
    sender: Sender<Job>,
}

impl Handler {
    /// Spawns a new worker thread.
    pub fn new() -> InquiryResult<Self> {
        let name = format!(
            "inquiry-handler-{}",
            NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed)
        );
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker_name = name.clone();

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!(
                            "event=handler_job module=handler status=error handler={worker_name} error_code=job_panicked"
                        );
                    }
                }
                debug!("event=handler_stop module=handler status=ok handler={worker_name}");
            })
            .map_err(|err| InquiryError::Dispatch(format!("failed to spawn {name}: {err}")))?;

        Ok(Self {
            inner: Arc::new(HandlerInner { name, sender }),
        })
    }

    /// Queues `job` behind every previously posted job.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> InquiryResult<()> {
        self.inner
            .sender
            .send(Box::new(job))
            .map_err(|_| InquiryError::Dispatch(format!("{} is not running", self.inner.name)))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether both handles feed the same worker.
    pub fn same(a: &Handler, b: &Handler) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl Debug for Handler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").field("name", &self.inner.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Handler;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn runs_jobs_in_submission_order() {
        let handler = Handler::new().expect("handler");
        let (tx, rx) = mpsc::channel();
        for index in 0..20 {
            let tx = tx.clone();
            handler
                .post(move || tx.send(index).expect("receiver alive"))
                .expect("post");
        }

        let received = (0..20)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("job ran"))
            .collect::<Vec<_>>();
        assert_eq!(received, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_job_does_not_stop_worker() {
        let handler = Handler::new().expect("handler");
        let (tx, rx) = mpsc::channel();
        handler.post(|| panic!("job failure")).expect("post");
        handler
            .post(move || tx.send("after").expect("receiver alive"))
            .expect("post");
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).expect("second job ran"),
            "after"
        );
    }

    #[test]
    fn clones_share_worker() {
        let handler = Handler::new().expect("handler");
        let clone = handler.clone();
        let other = Handler::new().expect("handler");
        assert!(Handler::same(&handler, &clone));
        assert!(!Handler::same(&handler, &other));
        assert_ne!(handler.name(), other.name());
    }
}

//! Periodic background task with cooperative cancellation.
//!
//! # Invariants
//! - The tick never runs after `cancel` returns.
//! - `cancel` is idempotent and joins the worker thread.

use log::{info, warn};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "electriscan-autosave";

#[derive(Debug)]
pub struct AutosaveTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutosaveTimer {
    /// Spawns a thread that runs `tick` every `period` until cancelled.
    pub fn start<F>(period: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        info!(
            "event=autosave_start module=service status=ok period_ms={}",
            period.as_millis()
        );
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the timer and waits for an in-flight tick to finish.
    pub fn cancel(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        drop(self.stop.take());
        if handle.join().is_err() {
            warn!("event=autosave_stop module=service status=error reason=worker_panicked");
            return;
        }
        info!("event=autosave_stop module=service status=ok");
    }
}

impl Drop for AutosaveTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

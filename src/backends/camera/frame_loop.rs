// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for capture loops
//!
//! Every camera backend produces frames on a dedicated thread. This module
//! owns that thread: it runs the per-frame closure until told to stop, and
//! guarantees the thread is joined (and the device it holds is closed)
//! before `stop()` returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a capture loop running in a separate thread
///
/// ```ignore
/// let controller = CaptureLoopController::spawn_with_init(
///     "v4l2-capture",
///     || open_device(path),
///     move |device| {
///         publish(device.next_frame());
///         LoopAction::Continue
///     },
/// )?;
///
/// // Later: blocks until the thread has exited and dropped the device
/// controller.stop();
/// ```
pub struct CaptureLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoopController {
    /// Start a capture loop that needs no setup
    pub fn start<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::spawn(name, move |stop_signal, thread_name| {
            run_loop(&stop_signal, &thread_name, &mut (), |_| loop_fn());
        })
    }

    /// Start a capture loop whose resources are created on the loop thread
    ///
    /// `init_fn` runs first on the new thread. Its error is handed back to the
    /// caller, who is blocked until initialization finishes, so a failed
    /// device open surfaces as a normal `Err` instead of a silently dead thread.
    pub fn spawn_with_init<S, E, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> Result<Self, E>
    where
        S: 'static,
        E: From<String> + Send + 'static,
        I: FnOnce() -> Result<S, E> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let (init_tx, init_rx) = mpsc::sync_channel::<Result<(), E>>(1);

        let mut controller = Self::spawn(name, move |stop_signal, thread_name| {
            let mut state = match init_fn() {
                Ok(state) => {
                    let _ = init_tx.send(Ok(()));
                    state
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                    return;
                }
            };
            drop(init_tx);
            run_loop(&stop_signal, &thread_name, &mut state, &mut loop_fn);
        });

        match init_rx.recv() {
            Ok(Ok(())) => Ok(controller),
            Ok(Err(e)) => {
                controller.join();
                Err(e)
            }
            Err(_) => {
                controller.join();
                Err(E::from(format!(
                    "capture loop '{}' died during initialization",
                    name
                )))
            }
        }
    }

    fn spawn<B>(name: &str, body: B) -> Self
    where
        B: FnOnce(Arc<AtomicBool>, String) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            body(thread_stop, thread_name.clone());
            info!(name = %thread_name, "Capture loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Stopped from inside the loop; it exits on its own
                return;
            }
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Capture loop thread finished");
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

fn run_loop<S, F>(stop_signal: &AtomicBool, name: &str, state: &mut S, mut loop_fn: F)
where
    F: FnMut(&mut S) -> LoopAction,
{
    loop {
        if stop_signal.load(Ordering::SeqCst) {
            debug!(name = %name, "Stop signal received");
            break;
        }

        if loop_fn(state) == LoopAction::Stop {
            debug!(name = %name, "Loop requested stop");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoopController::start("test-loop", move || {
            if counter_clone.fetch_add(1, Ordering::SeqCst) >= 10 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        });

        controller.join();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_stop_joins_thread() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoopController::start("test-loop", move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            LoopAction::Continue
        });

        thread::sleep(Duration::from_millis(30));
        controller.stop();
        assert!(!controller.is_running());

        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop > 0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_init_state_reaches_loop() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = Arc::clone(&seen);

        let mut controller = CaptureLoopController::spawn_with_init(
            "test-init",
            || Ok::<_, String>(42u32),
            move |state| {
                seen_clone.store(*state, Ordering::SeqCst);
                LoopAction::Stop
            },
        )
        .unwrap();

        controller.join();
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_init_failure_is_returned() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let result = CaptureLoopController::spawn_with_init(
            "test-fail-init",
            || Err::<(), _>("device busy".to_string()),
            move |_| {
                ran_clone.store(true, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        assert_eq!(result.err().as_deref(), Some("device busy"));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_stops_loop() {
        let controller = CaptureLoopController::start("test-drop", || {
            thread::sleep(Duration::from_millis(5));
            LoopAction::Continue
        });
        assert!(controller.is_running());
        drop(controller);
    }
}

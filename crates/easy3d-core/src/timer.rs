//! Delayed and periodic callbacks on background threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs callbacks after a delay or periodically.
///
/// Callbacks scheduled through [`Timer::set_timeout`] and
/// [`Timer::set_interval`] are cancelled by [`Timer::stop`] or when the timer is
/// dropped. A paused timer skips interval ticks until resumed.
#[derive(Debug, Default)]
pub struct Timer {
    stopped: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `func` once after `delay`. Cannot be cancelled.
    pub fn single_shot<F>(delay: Duration, func: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::spawn(move || {
            thread::sleep(delay);
            func();
        })
    }

    /// Calls `func` once after `delay` unless the timer is stopped first.
    pub fn set_timeout<F>(&self, delay: Duration, func: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.stopped.store(false, Ordering::SeqCst);
        let stopped = Arc::clone(&self.stopped);
        thread::spawn(move || {
            if stopped.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(delay);
            if stopped.load(Ordering::SeqCst) {
                return;
            }
            func();
        })
    }

    /// Calls `func` every `interval` until the timer is stopped.
    pub fn set_interval<F>(&self, interval: Duration, mut func: F) -> JoinHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.stopped.store(false, Ordering::SeqCst);
        let stopped = Arc::clone(&self.stopped);
        let paused = Arc::clone(&self.paused);
        thread::spawn(move || loop {
            if stopped.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(interval);
            if paused.load(Ordering::SeqCst) {
                continue;
            }
            if stopped.load(Ordering::SeqCst) {
                return;
            }
            func();
        })
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Resumes a paused timer that has not been stopped.
    pub fn resume(&self) {
        if !self.is_stopped() {
            self.paused.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    #[test]
    fn test_single_shot() {
        let (tx, rx) = mpsc::channel();
        Timer::single_shot(Duration::from_millis(5), move || {
            let _ = tx.send(42);
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(42));
    }

    #[test]
    fn test_timeout_cancelled_by_stop() {
        let timer = Timer::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = timer.set_timeout(Duration::from_millis(50), move || {
            flag.store(true, Ordering::SeqCst);
        });
        timer.stop();
        handle.join().unwrap();
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_interval_runs_until_stopped() {
        let timer = Timer::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let (tx, rx) = mpsc::channel();
        let handle = timer.set_interval(Duration::from_millis(2), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 2 {
                let _ = tx.send(());
            }
        });
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        timer.stop();
        handle.join().unwrap();
        assert!(count.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn test_resume_after_stop_keeps_paused() {
        let timer = Timer::new();
        timer.pause();
        timer.stop();
        timer.resume();
        assert!(timer.is_paused());
    }
}

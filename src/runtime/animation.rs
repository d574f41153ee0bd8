//! Animation clock owned by the engine.
//!
//! A ticker thread bumps a shared frame counter and asks the engine loop to repaint. It only
//! runs while the engine is streaming; `stop` joins the thread and resets the counter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub type TickRequester = Arc<dyn Fn() + Send + Sync>;

/// Accent glyphs advance once every this many spinner frames.
const ACCENT_DIVISOR: usize = 3;

pub struct AnimationClock {
    interval: Duration,
    requester: Option<TickRequester>,
    frame: Arc<AtomicUsize>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for AnimationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationClock")
            .field("interval", &self.interval)
            .field("frame", &self.frame())
            .field("running", &self.is_running())
            .finish()
    }
}

impl AnimationClock {
    pub fn new(interval: Duration, requester: Option<TickRequester>) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            requester,
            frame: Arc::new(AtomicUsize::new(0)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    pub fn frame(&self) -> usize {
        self.frame.load(Ordering::SeqCst)
    }

    pub fn spinner_frame(&self) -> usize {
        self.frame()
    }

    pub fn accent_frame(&self) -> usize {
        self.frame() / ACCENT_DIVISOR
    }

    pub fn start(&mut self) {
        if self.thread.is_some() {
            return;
        }
        self.stop_flag.store(false, Ordering::SeqCst);
        self.frame.store(0, Ordering::SeqCst);

        let stop_flag = Arc::clone(&self.stop_flag);
        let frame = Arc::clone(&self.frame);
        let requester = self.requester.clone();
        let interval = self.interval;
        tracing::debug!(?interval, "animation clock started");

        self.thread = Some(thread::spawn(move || {
            while !stop_flag.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }
                frame.fetch_add(1, Ordering::SeqCst);
                if let Some(request) = requester.as_ref() {
                    request();
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
            tracing::debug!("animation clock stopped");
        }
        self.frame.store(0, Ordering::SeqCst);
    }
}

impl Drop for AnimationClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::AnimationClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn ticks_request_repaints_and_stop_resets() {
        let requests = Arc::new(AtomicUsize::new(0));
        let requests_clone = Arc::clone(&requests);
        let mut clock = AnimationClock::new(
            Duration::from_millis(10),
            Some(Arc::new(move || {
                requests_clone.fetch_add(1, Ordering::SeqCst);
            })),
        );
        assert!(!clock.is_running());
        clock.start();
        clock.start();
        thread::sleep(Duration::from_millis(80));
        assert!(requests.load(Ordering::SeqCst) >= 1);
        assert!(clock.frame() >= 1);

        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.frame(), 0);
        let after_stop = requests.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(requests.load(Ordering::SeqCst), after_stop);
    }
}

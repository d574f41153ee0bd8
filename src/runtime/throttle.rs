//! Repaint coalescing: at most one physical repaint per `min_interval`.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RepaintThrottle {
    min_interval: Duration,
    last_paint: Option<Instant>,
    dirty: bool,
}

impl RepaintThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_paint: None,
            dirty: false,
        }
    }

    pub fn request(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True when a repaint was requested and the interval since the last paint has elapsed.
    pub fn due(&self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        match self.next_deadline() {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// When a pending repaint becomes due; `None` if nothing is pending or it is due already.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.dirty {
            return None;
        }
        self.last_paint.map(|last| last + self.min_interval)
    }

    pub fn painted(&mut self, now: Instant) {
        self.last_paint = Some(now);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::RepaintThrottle;
    use std::time::{Duration, Instant};

    #[test]
    fn coalesces_requests_inside_interval() {
        let start = Instant::now();
        let mut throttle = RepaintThrottle::new(Duration::from_millis(16));
        assert!(!throttle.due(start));
        throttle.request();
        assert!(throttle.due(start));
        throttle.painted(start);

        throttle.request();
        throttle.request();
        assert!(!throttle.due(start + Duration::from_millis(5)));
        assert_eq!(throttle.next_deadline(), Some(start + Duration::from_millis(16)));
        assert!(throttle.due(start + Duration::from_millis(16)));
        throttle.painted(start + Duration::from_millis(16));
        assert!(throttle.next_deadline().is_none());
    }
}

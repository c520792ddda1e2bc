use std::time::Duration;

/// One pending deadline on the editor clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleShotTimer {
    interval: Duration,
    deadline: Option<Duration>,
}

impl SingleShotTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arms (or rearms) the timer to fire one interval after `now`.
    pub fn arm(&mut self, now: Duration) {
        self.deadline = Some(now + self.interval);
    }

    /// Arms the timer unless it is already pending.
    pub fn arm_if_idle(&mut self, now: Duration) {
        if self.deadline.is_none() {
            self.arm(now);
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Disarms and returns `true` once the deadline has passed.
    pub fn fire_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Trailing-edge throttle: the first schedule arms the timer, later ones only
/// replace the value delivered when it fires.
#[derive(Debug, Clone)]
pub struct Throttled<T> {
    timer: SingleShotTimer,
    pending: Option<T>,
}

impl<T> Throttled<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: SingleShotTimer::new(interval),
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T, now: Duration) {
        self.pending = Some(value);
        self.timer.arm_if_idle(now);
    }

    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        if self.timer.fire_due(now) {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timer.deadline()
    }
}

/// Delay restarted by every schedule.
#[derive(Debug, Clone)]
pub struct Delayed {
    timer: SingleShotTimer,
}

impl Delayed {
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: SingleShotTimer::new(interval),
        }
    }

    pub fn schedule(&mut self, now: Duration) {
        self.timer.arm(now);
    }

    pub fn take_due(&mut self, now: Duration) -> bool {
        self.timer.fire_due(now)
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.timer.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn throttle_delivers_the_last_value_once() {
        let mut throttle = Throttled::new(40 * MS);
        throttle.schedule(1, Duration::ZERO);
        throttle.schedule(2, 10 * MS);
        throttle.schedule(3, 30 * MS);
        assert_eq!(throttle.take_due(39 * MS), None);
        assert_eq!(throttle.take_due(40 * MS), Some(3));
        assert_eq!(throttle.take_due(100 * MS), None);
    }

    #[test]
    fn delay_restarts_on_every_schedule() {
        let mut delay = Delayed::new(40 * MS);
        delay.schedule(Duration::ZERO);
        delay.schedule(30 * MS);
        assert!(!delay.take_due(40 * MS));
        assert!(delay.take_due(70 * MS));
        assert!(!delay.is_pending());
    }
}

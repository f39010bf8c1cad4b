//! Time-ordered pending events.
//!
//! Events due at or before the current time never enter the queue; the caller
//! executes them synchronously. Future events stay sorted by time and are
//! drained at the start of each quantum. Equal times keep submission order.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent<T> {
    pub time: f64,
    pub event: T,
}

#[derive(Debug, Clone)]
pub struct EventScheduler<T> {
    queue: VecDeque<ScheduledEvent<T>>,
}

impl<T> Default for EventScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventScheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert keeping time order, after any event with the same time.
    pub fn schedule(&mut self, time: f64, event: T) {
        let index = self.queue.partition_point(|e| e.time <= time);
        self.queue.insert(index, ScheduledEvent { time, event });
    }

    /// Pop the earliest event if it is due at `time`.
    pub fn pop_due(&mut self, time: f64) -> Option<ScheduledEvent<T>> {
        if self.queue.front()?.time <= time {
            self.queue.pop_front()
        } else {
            None
        }
    }

    pub fn next_time(&self) -> Option<f64> {
        self.queue.front().map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_in_time_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(5.0, "five");
        scheduler.schedule(1.0, "one");
        scheduler.schedule(3.0, "three");
        assert_eq!(scheduler.next_time(), Some(1.0));

        let mut order = Vec::new();
        while let Some(e) = scheduler.pop_due(10.0) {
            order.push(e.event);
        }
        assert_eq!(order, ["one", "three", "five"]);
    }

    #[test]
    fn test_only_due_events_pop() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(2.0, 2);
        scheduler.schedule(1.0, 1);
        assert_eq!(scheduler.pop_due(1.5).map(|e| e.event), Some(1));
        assert!(scheduler.pop_due(1.5).is_none());
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_equal_times_keep_submission_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(1.0, 'a');
        scheduler.schedule(1.0, 'b');
        scheduler.schedule(0.5, 'c');
        let order: Vec<char> = std::iter::from_fn(|| scheduler.pop_due(1.0))
            .map(|e| e.event)
            .collect();
        assert_eq!(order, ['c', 'a', 'b']);
    }
}

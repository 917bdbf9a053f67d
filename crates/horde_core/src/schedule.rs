//! Scheduled-task table
//!
//! Pending timers are stored as "fires-at" timestamps keyed by the owner and
//! purpose of the timer. Scheduling a key that is already pending replaces
//! the old entry, so there is never more than one in-flight callback per key.

use std::collections::BTreeMap;

/// A single pending timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    /// World time at which the timer expires
    pub fires_at: f64,
    /// Re-arm interval for repeating timers
    pub interval: Option<f64>,
}

impl Timer {
    pub fn once(fires_at: f64) -> Self {
        Self {
            fires_at,
            interval: None,
        }
    }

    pub fn repeating(fires_at: f64, interval: f64) -> Self {
        Self {
            fires_at,
            interval: Some(interval),
        }
    }
}

/// Timer table keyed by `K`
#[derive(Debug, Clone)]
pub struct TimerTable<K: Ord + Copy> {
    entries: BTreeMap<K, Timer>,
}

impl<K: Ord + Copy> TimerTable<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Arm (or re-arm) a one-shot timer `delay` seconds after `now`
    pub fn schedule(&mut self, key: K, now: f64, delay: f64) {
        self.entries.insert(key, Timer::once(now + delay.max(0.0)));
    }

    /// Arm (or re-arm) a repeating timer
    pub fn schedule_repeating(&mut self, key: K, now: f64, interval: f64) {
        let interval = interval.max(f64::EPSILON);
        self.entries.insert(key, Timer::repeating(now + interval, interval));
    }

    /// Cancel a pending timer, returning whether one existed
    pub fn cancel(&mut self, key: K) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// Cancel every timer matching the predicate
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&K) -> bool) {
        self.entries.retain(|key, _| !predicate(key));
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn get(&self, key: K) -> Option<&Timer> {
        self.entries.get(&key)
    }

    /// Seconds left before the timer fires
    pub fn remaining(&self, key: K, now: f64) -> Option<f64> {
        self.entries.get(&key).map(|t| (t.fires_at - now).max(0.0))
    }

    /// Collect every timer due at `now`, ordered by expiry time.
    ///
    /// One-shot timers are removed. Repeating timers fire once per call and
    /// are re-armed relative to their previous expiry.
    pub fn drain_due(&mut self, now: f64) -> Vec<K> {
        let mut due: Vec<(f64, K)> = self
            .entries
            .iter()
            .filter(|(_, timer)| timer.fires_at <= now)
            .map(|(key, timer)| (timer.fires_at, *key))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, key) in &due {
            let Some(timer) = self.entries.get_mut(key) else {
                continue;
            };
            match timer.interval {
                Some(interval) => {
                    timer.fires_at += interval;
                    if timer.fires_at <= now {
                        timer.fires_at = now + interval;
                    }
                }
                None => {
                    self.entries.remove(key);
                }
            }
        }

        due.into_iter().map(|(_, key)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Ord + Copy> Default for TimerTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut timers = TimerTable::new();
        timers.schedule(1u32, 0.0, 0.5);

        assert!(timers.drain_due(0.4).is_empty());
        assert_eq!(timers.drain_due(0.5), vec![1]);
        assert!(timers.drain_due(1.0).is_empty());
        assert!(!timers.is_pending(1));
    }

    #[test]
    fn test_reschedule_replaces_entry() {
        let mut timers = TimerTable::new();
        timers.schedule(7u32, 0.0, 0.5);
        timers.schedule(7u32, 0.3, 0.5);

        assert_eq!(timers.len(), 1);
        assert!(timers.drain_due(0.6).is_empty());
        assert_eq!(timers.drain_due(0.8), vec![7]);
    }

    #[test]
    fn test_repeating_rearms() {
        let mut timers = TimerTable::new();
        timers.schedule_repeating(1u32, 0.0, 0.5);

        assert_eq!(timers.drain_due(0.5), vec![1]);
        assert!(timers.is_pending(1));
        assert_eq!(timers.remaining(1, 0.5), Some(0.5));
        assert_eq!(timers.drain_due(1.0), vec![1]);
    }

    #[test]
    fn test_due_order_by_expiry() {
        let mut timers = TimerTable::new();
        timers.schedule(1u32, 0.0, 0.9);
        timers.schedule(2u32, 0.0, 0.1);
        timers.schedule(3u32, 0.0, 0.5);

        assert_eq!(timers.drain_due(1.0), vec![2, 3, 1]);
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerTable::new();
        timers.schedule((1u32, 'a'), 0.0, 1.0);
        timers.schedule((1u32, 'b'), 0.0, 1.0);
        timers.schedule((2u32, 'a'), 0.0, 1.0);

        assert!(timers.cancel((1, 'a')));
        assert!(!timers.cancel((1, 'a')));

        timers.cancel_where(|(owner, _)| *owner == 1);
        assert_eq!(timers.drain_due(2.0), vec![(2, 'a')]);
    }
}

//! Global event queue.

use relia_types::{SimTime, TransitionId};
use std::collections::{BTreeMap, HashMap};

/// Ordering key of a scheduled firing.
///
/// Events are ordered by absolute time, then by the order in which they were
/// scheduled. The sequence number makes the order total, so two firings at
/// the same instant always happen in the same order for the same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKey {
    /// Absolute firing time.
    pub time: SimTime,
    /// Insertion sequence number (tie-break).
    pub sequence: u64,
}

/// Pending transition firings across all automata.
///
/// A transition is pending at most once. The reverse index allows
/// cancelling a pending firing without scanning the queue.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    events: BTreeMap<EventKey, TransitionId>,
    index: HashMap<TransitionId, EventKey>,
    next_sequence: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a transition to fire at `time`.
    ///
    /// # Panics
    ///
    /// Panics if the transition is already pending. Callers check
    /// [`is_pending`](Self::is_pending) first: a running timer is never
    /// silently replaced.
    pub fn schedule(&mut self, transition: TransitionId, time: SimTime) -> EventKey {
        assert!(
            !self.index.contains_key(&transition),
            "{} is already scheduled",
            transition
        );
        let key = EventKey {
            time,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.events.insert(key, transition);
        self.index.insert(transition, key);
        key
    }

    /// Cancel a pending transition. Returns its key if it was pending.
    pub fn cancel(&mut self, transition: TransitionId) -> Option<EventKey> {
        let key = self.index.remove(&transition)?;
        self.events.remove(&key);
        Some(key)
    }

    /// Earliest pending event.
    pub fn peek(&self) -> Option<(EventKey, TransitionId)> {
        self.events.first_key_value().map(|(k, t)| (*k, *t))
    }

    /// Remove and return the earliest pending event.
    pub fn pop(&mut self) -> Option<(EventKey, TransitionId)> {
        let (key, transition) = self.events.pop_first()?;
        self.index.remove(&transition);
        Some((key, transition))
    }

    /// Whether a transition is pending.
    pub fn is_pending(&self, transition: TransitionId) -> bool {
        self.index.contains_key(&transition)
    }

    /// Scheduled firing time of a pending transition.
    pub fn scheduled_time(&self, transition: TransitionId) -> Option<SimTime> {
        self.index.get(&transition).map(|k| k.time)
    }

    /// Pending events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = (EventKey, TransitionId)> + '_ {
        self.events.iter().map(|(k, t)| (*k, *t))
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event is pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every pending event and restart the sequence.
    pub fn clear(&mut self) {
        self.events.clear();
        self.index.clear();
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_time_then_sequence() {
        let mut queue = EventQueue::new();
        queue.schedule(TransitionId(0), SimTime::new(5.0));
        queue.schedule(TransitionId(1), SimTime::new(1.0));
        queue.schedule(TransitionId(2), SimTime::new(5.0));
        queue.schedule(TransitionId(3), SimTime::new(1.0));

        let order: Vec<_> = std::iter::from_fn(|| queue.pop().map(|(_, t)| t)).collect();
        assert_eq!(
            order,
            vec![
                TransitionId(1),
                TransitionId(3),
                TransitionId(0),
                TransitionId(2)
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut queue = EventQueue::new();
        queue.schedule(TransitionId(0), SimTime::new(1.0));
        queue.schedule(TransitionId(1), SimTime::new(2.0));

        assert!(queue.cancel(TransitionId(0)).is_some());
        assert!(queue.cancel(TransitionId(0)).is_none());
        assert!(!queue.is_pending(TransitionId(0)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek().map(|(_, t)| t), Some(TransitionId(1)));
        assert_eq!(
            queue.scheduled_time(TransitionId(1)),
            Some(SimTime::new(2.0))
        );
    }

    #[test]
    fn test_reschedule_after_pop() {
        let mut queue = EventQueue::new();
        queue.schedule(TransitionId(0), SimTime::new(1.0));
        let (first, _) = queue.pop().unwrap();
        let second = queue.schedule(TransitionId(0), SimTime::new(1.0));
        assert!(second > first);
    }

    #[test]
    #[should_panic(expected = "already scheduled")]
    fn test_double_schedule_panics() {
        let mut queue = EventQueue::new();
        queue.schedule(TransitionId(0), SimTime::new(1.0));
        queue.schedule(TransitionId(0), SimTime::new(2.0));
    }

    #[test]
    fn test_clear_restarts_sequence() {
        let mut queue = EventQueue::new();
        queue.schedule(TransitionId(0), SimTime::new(1.0));
        queue.clear();
        let key = queue.schedule(TransitionId(0), SimTime::new(1.0));
        assert_eq!(key.sequence, 0);
    }
}

//! A strictly ordered, phased event queue.
//!
//! The queue itself is generic over the step payload (`S`) so that both the
//! field graph's `FieldUpdate`-equivalent steps and the activation
//! network's `Fired` steps (defined in `synfield-net`) can share one
//! ordering discipline and one scheduler implementation without the field
//! graph needing to know about activations.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::error::{FieldsError, Result};
use crate::ids::{Round, Timestamp};
use crate::phase::ProcessingPhase;

/// Anything that can sit in the queue: it must report the phase it belongs
/// to and a sort-value used to order steps within a phase (e.g. a
/// quantized accumulated delta, or a quantized net-input for `Fired`).
pub trait SchedulableStep {
    fn phase(&self) -> ProcessingPhase;
    fn sort_value(&self) -> i64;

    /// Whether this occurrence should be deferred to the round after the
    /// current one (mirrors a field definition's `is_next_round` flag).
    fn wants_next_round(&self) -> bool {
        false
    }
}

/// The strict total order steps are processed in: round, then phase rank,
/// then sort-value, then insertion timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueKey {
    pub round: Round,
    pub phase_rank: u8,
    pub sort_value: i64,
    pub timestamp: Timestamp,
}

impl QueueKey {
    fn new(round: Round, phase: ProcessingPhase, sort_value: i64, timestamp: Timestamp) -> Self {
        Self {
            round,
            phase_rank: phase.rank(),
            sort_value,
            timestamp,
        }
    }
}

/// A generic, strictly ordered scheduler. One instance owns every step of
/// type `S`; callers (the field graph, the activation network's `Context`)
/// identify steps by the `u64` id returned from [`Self::add_step`].
pub struct Scheduler<S: SchedulableStep> {
    entries: BTreeMap<QueueKey, u64>,
    keys_by_id: HashMap<u64, QueueKey>,
    steps: HashMap<u64, S>,
    next_timestamp: u64,
    current_round: u64,
    next_id: u64,
}

impl<S: SchedulableStep> Default for Scheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SchedulableStep> Scheduler<S> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            keys_by_id: HashMap::new(),
            steps: HashMap::new(),
            next_timestamp: 0,
            current_round: 0,
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_round(&self) -> u64 {
        self.current_round
    }

    fn fresh_timestamp(&mut self) -> Timestamp {
        let ts = Timestamp(self.next_timestamp);
        self.next_timestamp += 1;
        ts
    }

    fn round_for(&self, step: &S) -> Round {
        if step.phase().is_delayed() {
            Round::DELAYED
        } else if step.wants_next_round() {
            Round(self.current_round + 1)
        } else {
            Round(self.current_round)
        }
    }

    /// Inserts a new step, assigning it a fresh timestamp and id.
    pub fn add_step(&mut self, step: S) -> u64 {
        let round = self.round_for(&step);
        let ts = self.fresh_timestamp();
        let key = QueueKey::new(round, step.phase(), step.sort_value(), ts);
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(key, id);
        self.keys_by_id.insert(id, key);
        self.steps.insert(id, step);
        id
    }

    /// Removes a step without processing it.
    pub fn remove_step(&mut self, id: u64) -> Result<S> {
        let key = self
            .keys_by_id
            .remove(&id)
            .ok_or_else(|| FieldsError::logic(format!("no such queued step {id}")))?;
        self.entries.remove(&key);
        self.steps
            .remove(&id)
            .ok_or_else(|| FieldsError::logic(format!("step {id} missing from store")))
    }

    /// Re-scores an already-queued step's sort-value, preserving queue
    /// order invariants by removing and reinserting it with a fresh
    /// timestamp only if its relative order would otherwise be stale.
    pub fn update_sort_value(&mut self, id: u64, new_sort_value: i64) -> Result<()>
    where
        S: Clone,
    {
        let old_key = *self
            .keys_by_id
            .get(&id)
            .ok_or_else(|| FieldsError::logic(format!("no such queued step {id}")))?;
        if old_key.sort_value == new_sort_value {
            return Ok(());
        }
        self.entries.remove(&old_key);
        let new_key = QueueKey {
            sort_value: new_sort_value,
            ..old_key
        };
        self.entries.insert(new_key, id);
        self.keys_by_id.insert(id, new_key);
        Ok(())
    }

    pub fn contains(&self, id: u64) -> bool {
        self.keys_by_id.contains_key(&id)
    }

    /// Pops the minimum-key step, if any, advancing `current_round` to
    /// match the popped step's round (monotonic: rounds never go
    /// backwards within a single `process` run).
    pub fn pop_next(&mut self) -> Option<(u64, S)> {
        let (&key, &id) = self.entries.iter().next()?;
        self.entries.remove(&key);
        self.keys_by_id.remove(&id);
        let step = self.steps.remove(&id)?;
        if key.round.0 != u64::MAX {
            self.current_round = self.current_round.max(key.round.0);
        }
        Some((id, step))
    }

    /// Drains the queue, calling `process_one` for each step in order
    /// unless `filter` rejects it. Honors `timeout`, checked between steps.
    pub fn process<F, P>(&mut self, mut process_one: F, filter: Option<P>, timeout: Option<Duration>) -> Result<usize>
    where
        F: FnMut(&mut Self, S),
        P: Fn(&S) -> bool,
    {
        let start = Instant::now();
        let mut processed = 0usize;
        while let Some((_, step)) = {
            if let Some(t) = timeout {
                if start.elapsed() > t {
                    return Err(FieldsError::timeout(t.as_millis() as u64));
                }
            }
            self.pop_next()
        } {
            if let Some(ref f) = filter {
                if !f(&step) {
                    continue;
                }
            }
            process_one(self, step);
            processed += 1;
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestStep {
        phase: ProcessingPhase,
        sort_value: i64,
    }

    impl SchedulableStep for TestStep {
        fn phase(&self) -> ProcessingPhase {
            self.phase
        }
        fn sort_value(&self) -> i64 {
            self.sort_value
        }
    }

    #[test]
    fn orders_by_phase_then_sort_value() {
        let mut sched: Scheduler<TestStep> = Scheduler::new();
        sched.add_step(TestStep {
            phase: ProcessingPhase::Fired,
            sort_value: 5,
        });
        sched.add_step(TestStep {
            phase: ProcessingPhase::Inference,
            sort_value: 100,
        });
        let (_, first) = sched.pop_next().unwrap();
        assert_eq!(first.phase, ProcessingPhase::Inference);
        let (_, second) = sched.pop_next().unwrap();
        assert_eq!(second.phase, ProcessingPhase::Fired);
        assert!(sched.is_empty());
    }

    #[test]
    fn delayed_phase_sorts_last() {
        let mut sched: Scheduler<TestStep> = Scheduler::new();
        sched.add_step(TestStep {
            phase: ProcessingPhase::Save,
            sort_value: -1000,
        });
        sched.add_step(TestStep {
            phase: ProcessingPhase::Training,
            sort_value: 1000,
        });
        let (_, first) = sched.pop_next().unwrap();
        assert_eq!(first.phase, ProcessingPhase::Training);
    }

    #[test]
    fn remove_step_detaches_it() {
        let mut sched: Scheduler<TestStep> = Scheduler::new();
        let id = sched.add_step(TestStep {
            phase: ProcessingPhase::Inference,
            sort_value: 0,
        });
        sched.remove_step(id).unwrap();
        assert!(sched.is_empty());
        assert!(sched.remove_step(id).is_err());
    }
}

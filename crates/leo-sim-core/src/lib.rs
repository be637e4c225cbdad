//! Discrete-event scheduling primitives.
//!
//! A single priority queue of events keyed by (virtual time, sequence
//! number) drives the whole simulation. Handlers run to completion
//! without preemption; there are no suspension points — "waiting" is
//! always expressed as scheduling a future event. See [`Scheduler`].
//!
//! Also carries the per-link channel model ([`Link`]) and the bounded
//! transmit queue ([`TxQueue`]) that every node's outbound gate uses.

use ordered_float::NotNan;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("cannot schedule event at time {requested} before current time {now}")]
    TimeTravel { requested: f64, now: f64 },
}

/// Opaque handle returned by [`Scheduler::schedule_at`], usable with
/// [`Scheduler::cancel`]. Cancellation tombstones by id rather than
/// performing a true O(log N) heap removal — an accepted trade-off of
/// building on the `priority_queue` crate's API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(u64);

/// A single scheduled occurrence. `E` is the caller-defined event
/// payload (kind + target + whatever data the handler needs).
#[derive(Debug, Clone)]
struct ScheduledEvent<E> {
    handle: EventHandle,
    payload: E,
}

/// The global event priority queue keyed by (time, insertion sequence).
/// Pops always return the smallest (time, seq) pair, giving FIFO order
/// among events scheduled at the same virtual time.
pub struct Scheduler<E> {
    queue: PriorityQueue<EventHandle, Reverse<(NotNan<f64>, u64)>>,
    events: std::collections::HashMap<EventHandle, ScheduledEvent<E>>,
    tombstoned: HashSet<EventHandle>,
    now: f64,
    next_seq: u64,
    next_handle: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            events: std::collections::HashMap::new(),
            tombstoned: HashSet::new(),
            now: 0.0,
            next_seq: 0,
            next_handle: 0,
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule `payload` to fire at time `t`. Requires `t >= now()`.
    pub fn schedule_at(&mut self, t: f64, payload: E) -> Result<EventHandle, SchedulerError> {
        if t < self.now {
            return Err(SchedulerError::TimeTravel {
                requested: t,
                now: self.now,
            });
        }
        let handle = EventHandle(self.next_handle);
        self.next_handle += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        let key = NotNan::new(t).expect("scheduled time must not be NaN");
        self.queue.push(handle, Reverse((key, seq)));
        self.events.insert(handle, ScheduledEvent { handle, payload });
        Ok(handle)
    }

    /// Idempotent: cancelling an already-fired or already-cancelled
    /// handle is a no-op.
    pub fn cancel(&mut self, handle: EventHandle) {
        self.tombstoned.insert(handle);
    }

    /// Pop the earliest non-cancelled event, advancing the virtual
    /// clock to its time. Returns `None` once the queue is drained.
    pub fn pop(&mut self) -> Option<(f64, E)> {
        loop {
            let (handle, Reverse((time, _seq))) = self.queue.pop()?;
            if self.tombstoned.remove(&handle) {
                self.events.remove(&handle);
                continue;
            }
            self.now = time.into_inner();
            let scheduled = self.events.remove(&handle).expect("handle must have payload");
            return Some((self.now, scheduled.payload));
        }
    }
}

/// Per-link channel model: datarate, one-way propagation delay, and the
/// time the channel becomes free again.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub datarate_bps: f64,
    pub delay_s: f64,
    pub busy_until: f64,
}

impl Link {
    pub fn new(datarate_bps: f64, delay_s: f64) -> Self {
        Self {
            datarate_bps,
            delay_s,
            busy_until: 0.0,
        }
    }

    /// Is the link busy at virtual time `now`? A link transmitting a
    /// packet submitted exactly `busy_until == now` is not busy
    /// (strict `<`, matching the boundary property in the spec).
    pub fn is_busy(&self, now: f64) -> bool {
        now < self.busy_until
    }

    /// Attempt to transmit a packet of `bit_length` bits starting at
    /// `now`. Fails (returns `None`) if the link is currently busy —
    /// the caller must hold the packet and retry once `busy_until`
    /// elapses. On success, updates `busy_until` and returns the
    /// arrival time at the receiver.
    pub fn try_transmit(&mut self, now: f64, bit_length: f64) -> Option<f64> {
        if self.is_busy(now) {
            return None;
        }
        let tx_duration = bit_length / self.datarate_bps;
        self.busy_until = now + tx_duration;
        Some(now + tx_duration + self.delay_s)
    }

    /// Update the link's propagation delay. Only affects packets
    /// admitted after this call — packets already in flight keep
    /// their originally computed arrival time.
    pub fn set_delay(&mut self, delay_s: f64) {
        self.delay_s = delay_s;
    }
}

/// Bounded FIFO with tail-drop, generic over the queued message type.
#[derive(Debug, Clone)]
pub struct TxQueue<M> {
    items: VecDeque<M>,
    capacity: usize,
    drop_count: u64,
}

impl<M> TxQueue<M> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            drop_count: 0,
        }
    }

    /// Enqueue `item`. Returns `false` (and tail-drops, incrementing
    /// the drop counter) if the queue is already at capacity.
    pub fn enqueue(&mut self, item: M) -> bool {
        if self.items.len() >= self.capacity {
            self.drop_count += 1;
            return false;
        }
        self.items.push_back(item);
        true
    }

    pub fn peek(&self) -> Option<&M> {
        self.items.front()
    }

    pub fn pop(&mut self) -> Option<M> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count
    }

    /// Record an externally-detected drop (e.g. gate disconnected
    /// while the message sat at the head of the queue).
    pub fn record_external_drop(&mut self) {
        self.drop_count += 1;
    }
}

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

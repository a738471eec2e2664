use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use crossbeam::channel::{self, Receiver, RecvError, Sender, TryRecvError, TrySendError};

/// "Something changed" notifications for observers; the current state is
/// re-read through the cache getters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    ConfigurationChanged,
    HitrateChanged,
    CacheInvalidated,
}

impl CacheEvent {
    const KINDS: usize = 3;

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Receiving end of [`Listeners::subscribe`].
///
/// Events of the same kind coalesce while they wait: an idle subscriber
/// holds at most one pending event per kind, in the order they were first
/// raised.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<CacheEvent>,
    pending: Arc<AtomicU8>,
}

impl Subscription {
    fn taken(&self, event: CacheEvent) -> CacheEvent {
        self.pending.fetch_and(!event.bit(), Ordering::AcqRel);
        event
    }

    pub fn recv(&self) -> Result<CacheEvent, RecvError> {
        self.receiver.recv().map(|e| self.taken(e))
    }

    pub fn try_recv(&self) -> Result<CacheEvent, TryRecvError> {
        self.receiver.try_recv().map(|e| self.taken(e))
    }

    /// Drains the pending events without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = CacheEvent> + '_ {
        self.receiver.try_iter().map(|e| self.taken(e))
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[derive(Debug)]
struct Sink {
    sender: Sender<CacheEvent>,
    pending: Arc<AtomicU8>,
}

impl Sink {
    /// False once the subscriber is gone.
    fn notify(&self, event: CacheEvent) -> bool {
        if Arc::strong_count(&self.pending) == 1 {
            return false;
        }
        if self.pending.fetch_or(event.bit(), Ordering::AcqRel) & event.bit() != 0 {
            return true;
        }
        match self.sender.try_send(event) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Listeners {
    sinks: Vec<Sink>,
}

impl Listeners {
    pub fn subscribe(&mut self) -> Subscription {
        let (sender, receiver) = channel::bounded(CacheEvent::KINDS);
        let pending = Arc::new(AtomicU8::new(0));
        self.sinks.push(Sink {
            sender,
            pending: Arc::clone(&pending),
        });
        Subscription { receiver, pending }
    }

    /// Delivers `event` to every live subscriber and forgets the dropped ones.
    pub fn emit(&mut self, event: CacheEvent) {
        self.sinks.retain(|s| s.notify(event));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

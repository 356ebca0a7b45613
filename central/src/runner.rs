//! Event delivery from the transport into the client.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::{Channel, TrySendError};

use crate::central::CentralClient;
use crate::event::{Event, EventHandler};
use crate::transport::Transport;

/// Queue of transport events.
///
/// The transport posts events from whatever context observes them; a [`Runner`] drains them
/// one at a time into the client.
pub struct EventQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, Event, N>,
}

impl<M: RawMutex, const N: usize> EventQueue<M, N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { channel: Channel::new() }
    }

    /// Post an event. Hands the event back if the queue is full.
    pub fn post(&self, event: Event) -> Result<(), Event> {
        self.channel.try_send(event).map_err(|e| match e {
            TrySendError::Full(event) => {
                warn!("[runner] event queue full, returning event for {:?}", event.conn());
                event
            }
        })
    }

    /// Wait for the next event.
    pub async fn next(&self) -> Event {
        self.channel.receive().await
    }

    /// Take the next event, if any.
    pub fn try_next(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }
}

impl<M: RawMutex, const N: usize> Default for EventQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A client shared between the event runner and application tasks.
///
/// Each access locks the client for the duration of the closure. Handlers run under the lock
/// and must not access the shared client themselves.
pub struct SharedCentral<M: RawMutex, T: Transport> {
    inner: Mutex<M, RefCell<CentralClient<T>>>,
}

impl<M: RawMutex, T: Transport> SharedCentral<M, T> {
    /// Wrap a client.
    pub fn new(client: CentralClient<T>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(client)),
        }
    }

    /// Run `f` with exclusive access to the client.
    pub fn with<R>(&self, f: impl FnOnce(&mut CentralClient<T>) -> R) -> R {
        self.inner.lock(|client| f(&mut *client.borrow_mut()))
    }

    /// Unwrap the client.
    pub fn into_inner(self) -> CentralClient<T> {
        self.inner.into_inner().into_inner()
    }
}

/// Feeds queued events into a shared client.
pub struct Runner<'d, M: RawMutex, T: Transport, const N: usize> {
    queue: &'d EventQueue<M, N>,
    central: &'d SharedCentral<M, T>,
}

impl<'d, M: RawMutex, T: Transport, const N: usize> Runner<'d, M, T, N> {
    /// Create a runner for `central` reading from `queue`.
    pub fn new(queue: &'d EventQueue<M, N>, central: &'d SharedCentral<M, T>) -> Self {
        Self { queue, central }
    }

    /// Process events forever.
    pub async fn run<H: EventHandler>(&self, handler: &mut H) {
        loop {
            let event = self.queue.next().await;
            self.central.with(|client| client.process(event, handler));
        }
    }

    /// Process every queued event without waiting, returning how many were handled.
    pub fn process_pending<H: EventHandler>(&self, handler: &mut H) -> usize {
        let mut count = 0;
        while let Some(event) = self.queue.try_next() {
            self.central.with(|client| client.process(event, handler));
            count += 1;
        }
        count
    }
}

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::events::{ErrorEvent, MediaStateEvent, ReceiveEvent, TraceEvent};

/// Listener for received data.
pub type ReceivedHandler = Box<dyn Fn(&ReceiveEvent) + Send + Sync>;
/// Listener for asynchronous errors.
pub type ErrorHandler = Box<dyn Fn(&ErrorEvent) + Send + Sync>;
/// Listener for state transitions. May veto by clearing `accepted`.
pub type StateHandler = Box<dyn Fn(&mut MediaStateEvent) + Send + Sync>;
/// Listener for trace records.
pub type TraceHandler = Box<dyn Fn(&TraceEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    received: RwLock<Vec<Arc<dyn Fn(&ReceiveEvent) + Send + Sync>>>,
    error: RwLock<Vec<Arc<dyn Fn(&ErrorEvent) + Send + Sync>>>,
    state: RwLock<Vec<Arc<dyn Fn(&mut MediaStateEvent) + Send + Sync>>>,
    trace: RwLock<Vec<Arc<dyn Fn(&TraceEvent) + Send + Sync>>>,
}

enum Notification {
    Received(ReceiveEvent),
    Error(ErrorEvent),
    Trace(TraceEvent),
    Flush(Sender<()>),
}

/// Delivers media events to registered listeners.
///
/// Received, error and trace events are queued to a dedicated worker thread,
/// so a slow listener never stalls the transport's read loop. Events of one
/// media reach listeners in the order they were queued. State-change
/// notifications run synchronously on the calling thread because listeners
/// may veto them.
///
/// A panicking listener is logged and skipped; the remaining listeners still
/// run.
pub struct EventDispatcher {
    name: String,
    listeners: Arc<Listeners>,
    queue: Mutex<Option<Sender<Notification>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventDispatcher {
    /// `name` labels the worker thread.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: Arc::new(Listeners::default()),
            queue: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    pub fn on_received(&self, handler: ReceivedHandler) {
        self.listeners.received.write().push(Arc::from(handler));
    }

    pub fn on_error(&self, handler: ErrorHandler) {
        self.listeners.error.write().push(Arc::from(handler));
    }

    pub fn on_state_change(&self, handler: StateHandler) {
        self.listeners.state.write().push(Arc::from(handler));
    }

    pub fn on_trace(&self, handler: TraceHandler) {
        self.listeners.trace.write().push(Arc::from(handler));
    }

    /// Whether anyone listens for received data.
    pub fn has_received_listeners(&self) -> bool {
        !self.listeners.received.read().is_empty()
    }

    /// Whether anyone listens for trace records.
    pub fn has_trace_listeners(&self) -> bool {
        !self.listeners.trace.read().is_empty()
    }

    pub fn received(&self, event: ReceiveEvent) {
        self.enqueue(Notification::Received(event));
    }

    pub fn error(&self, event: ErrorEvent) {
        self.enqueue(Notification::Error(event));
    }

    pub fn trace(&self, event: TraceEvent) {
        self.enqueue(Notification::Trace(event));
    }

    /// Run state listeners on the calling thread. Returns whether every
    /// listener accepted the transition.
    pub fn state_changed(&self, event: &mut MediaStateEvent) -> bool {
        let handlers = self.listeners.state.read().clone();
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(media = %self.name, state = %event.state(), "state listener panicked");
            }
        }
        event.accepted()
    }

    /// Block until every event queued before this call has been delivered.
    pub fn flush(&self) {
        if self.is_worker_thread() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        if self.enqueue(Notification::Flush(tx)) {
            let _ = rx.recv();
        }
    }

    /// Queue `notification`, starting the worker on first use.
    ///
    /// Returns false when the notification was delivered inline because no
    /// worker could be started.
    fn enqueue(&self, notification: Notification) -> bool {
        let mut queue = self.queue.lock();
        if queue.is_none() {
            match self.spawn_worker() {
                Ok(sender) => *queue = Some(sender),
                Err(err) => {
                    warn!(media = %self.name, error = %err, "event worker unavailable, delivering inline");
                    drop(queue);
                    deliver(&self.name, &self.listeners, notification);
                    return false;
                }
            }
        }
        if let Some(sender) = queue.as_ref() {
            if let Err(mpsc::SendError(notification)) = sender.send(notification) {
                *queue = None;
                drop(queue);
                deliver(&self.name, &self.listeners, notification);
                return false;
            }
        }
        true
    }

    fn spawn_worker(&self) -> std::io::Result<Sender<Notification>> {
        let (tx, rx) = mpsc::channel();
        let listeners = Arc::clone(&self.listeners);
        let name = self.name.clone();
        let handle = thread::Builder::new()
            .name(format!("medialink-events-{}", self.name))
            .spawn(move || run_worker(&name, &listeners, rx))?;
        *self.worker.lock() = Some(handle);
        Ok(tx)
    }

    fn is_worker_thread(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == thread::current().id())
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        // Dropping the sender ends the worker once the queue drains.
        self.queue.lock().take();
        if let Some(handle) = self.worker.lock().take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn run_worker(name: &str, listeners: &Listeners, rx: Receiver<Notification>) {
    debug!(media = %name, "event worker started");
    while let Ok(notification) = rx.recv() {
        deliver(name, listeners, notification);
    }
    debug!(media = %name, "event worker stopped");
}

fn deliver(name: &str, listeners: &Listeners, notification: Notification) {
    // Listeners are cloned out of the lock so they can register more listeners.
    match notification {
        Notification::Received(event) => {
            let handlers = listeners.received.read().clone();
            invoke(name, "received", &handlers, &event);
        }
        Notification::Error(event) => {
            let handlers = listeners.error.read().clone();
            invoke(name, "error", &handlers, &event);
        }
        Notification::Trace(event) => {
            let handlers = listeners.trace.read().clone();
            invoke(name, "trace", &handlers, &event);
        }
        Notification::Flush(done) => {
            let _ = done.send(());
        }
    }
}

fn invoke<E>(name: &str, kind: &str, handlers: &[Arc<dyn Fn(&E) + Send + Sync>], event: &E) {
    for handler in handlers {
        if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
            warn!(media = %name, listener = kind, "listener panicked");
        }
    }
}

//! Registration bridge between external push sources and circuits
//!
//! An external push source is any register/deregister pair of procedures
//! accepting a handler that receives an occurrence payload. The bridge wires
//! a circuit to such a source and returns a [`Registration`] handle whose
//! release runs the deregistration procedure **at most once**, no matter how
//! many times or from how many threads release is requested.
//!
//! Dropping an unreleased handle releases it as a best-effort safety net.
//! Relying on drop order for deregistration is discouraged; call
//! [`Registration::release`] explicitly.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::circuit::{lock, Circuit, Handler, Output};
use crate::errors::{CircuitError, CircuitResult};

/// An external push source: a register/deregister pair over handlers.
///
/// Implement this for whatever owns the notification dispatch, such as a
/// property-change notifier or a message bus adapter. The in-memory
/// [`Notifier`] is the reference implementation.
pub trait PushSource<T> {
    /// Start delivering occurrences to `handler`.
    fn register(&self, handler: Handler<T>);

    /// Stop delivering occurrences to `handler`.
    fn deregister(&self, handler: Handler<T>);
}

type Deregister<T> = Box<dyn FnOnce(Handler<T>) + Send>;

/// Releasable handle for a circuit wired to an external push source.
///
/// Owns the handler it registered and, until released, the deregistration
/// procedure. Release extracts the procedure under a lock, so under any
/// interleaving exactly one caller (explicit or the drop safety net)
/// performs the actual deregistration. The slot is cleared *before* the
/// procedure runs, so a procedure that panics still counts as consumed.
pub struct Registration<T> {
    handler: Handler<T>,
    deregister: Mutex<Option<Deregister<T>>>,
}

impl<T: 'static> Registration<T> {
    /// Wire `circuit` to a push source given as raw register/deregister
    /// procedures.
    ///
    /// Builds a handler that, on every occurrence, runs the circuit against
    /// the occurrence payload and delivers into `out`; registers that
    /// handler; returns the release handle.
    pub fn subscribe<O, R, D>(
        circuit: &Circuit<T, O>,
        out: Output<O>,
        register: R,
        deregister: D,
    ) -> Self
    where
        O: 'static,
        R: FnOnce(Handler<T>),
        D: FnOnce(Handler<T>) + Send + 'static,
    {
        let wired = circuit.clone();
        let handler: Handler<T> = Arc::new(move |occurrence| wired.run(occurrence, &out));
        register(handler.clone());
        debug!("registered circuit handler with push source");
        Self {
            handler,
            deregister: Mutex::new(Some(Box::new(deregister))),
        }
    }

    /// Wire `circuit` to a [`PushSource`], moving the source into the handle
    /// so it can deregister later.
    pub fn from_source<O, S>(circuit: &Circuit<T, O>, out: Output<O>, source: S) -> Self
    where
        O: 'static,
        S: PushSource<T> + Send + 'static,
    {
        let wired = circuit.clone();
        let handler: Handler<T> = Arc::new(move |occurrence| wired.run(occurrence, &out));
        source.register(handler.clone());
        debug!("registered circuit handler with push source");
        Self {
            handler,
            deregister: Mutex::new(Some(Box::new(move |handler| source.deregister(handler)))),
        }
    }

    /// Release the registration, reporting whether this call performed it.
    ///
    /// Returns [`CircuitError::AlreadyReleased`] when another caller (or the
    /// drop safety net) already consumed the deregistration procedure.
    pub fn try_release(&self) -> CircuitResult<()> {
        let deregister = lock(&self.deregister).take();
        match deregister {
            Some(deregister) => {
                deregister(self.handler.clone());
                debug!("deregistered circuit handler");
                Ok(())
            }
            None => Err(CircuitError::AlreadyReleased),
        }
    }

    /// Release the registration; idempotent.
    pub fn release(&self) {
        let _ = self.try_release();
    }

    /// Whether the deregistration procedure has already been consumed.
    pub fn is_released(&self) -> bool {
        lock(&self.deregister).is_none()
    }
}

impl<T> Drop for Registration<T> {
    fn drop(&mut self) {
        // safety net only: observes a cleared slot after any explicit release
        if let Some(deregister) = lock(&self.deregister).take() {
            debug!("registration dropped without explicit release");
            deregister(self.handler.clone());
        }
    }
}

/// Minimal in-memory push source: a handler registry with synchronous
/// fan-out.
///
/// Handlers are removed by identity, so the handler a [`Registration`] holds
/// is exactly the one its release deregisters. `notify` snapshots the
/// registry before invoking, so a handler may deregister during dispatch
/// without deadlocking.
pub struct Notifier<T> {
    handlers: Mutex<Vec<Handler<T>>>,
}

impl<T> Notifier<T> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Number of currently registered handlers.
    pub fn handler_count(&self) -> usize {
        lock(&self.handlers).len()
    }

    /// Push one occurrence to every registered handler.
    pub fn notify(&self, occurrence: T)
    where
        T: Clone,
    {
        let snapshot: Vec<Handler<T>> = lock(&self.handlers).clone();
        for handler in snapshot {
            (*handler)(occurrence.clone());
        }
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PushSource<T> for Arc<Notifier<T>> {
    fn register(&self, handler: Handler<T>) {
        lock(&self.handlers).push(handler);
    }

    fn deregister(&self, handler: Handler<T>) {
        lock(&self.handlers).retain(|existing| !Arc::ptr_eq(existing, &handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::output;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_wires_circuit_to_source() {
        let notifier = Arc::new(Notifier::new());
        let sink = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&sink);

        let circuit = Circuit::from_fn(|x: i32| x * 2);
        let registration = Registration::from_source(
            &circuit,
            output(move |v| captured.lock().unwrap().push(v)),
            Arc::clone(&notifier),
        );

        notifier.notify(1);
        notifier.notify(2);
        assert_eq!(*sink.lock().unwrap(), vec![2, 4]);
        drop(registration);
    }

    #[test]
    fn test_release_stops_delivery() {
        let notifier = Arc::new(Notifier::new());
        let sink = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&sink);

        let circuit = Circuit::from_fn(|x: i32| x);
        let registration = Registration::from_source(
            &circuit,
            output(move |v| captured.lock().unwrap().push(v)),
            Arc::clone(&notifier),
        );

        notifier.notify(1);
        registration.release();
        notifier.notify(2);

        assert_eq!(*sink.lock().unwrap(), vec![1]);
        assert_eq!(notifier.handler_count(), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let circuit = Circuit::from_fn(|x: i32| x);
        let registration = Registration::subscribe(
            &circuit,
            output(|_| {}),
            |_| {},
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert!(!registration.is_released());
        assert_eq!(registration.try_release(), Ok(()));
        assert!(registration.is_released());
        assert_eq!(
            registration.try_release(),
            Err(CircuitError::AlreadyReleased)
        );
        registration.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_is_a_noop_after_explicit_release() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let circuit = Circuit::from_fn(|x: i32| x);
        let registration = Registration::subscribe(
            &circuit,
            output(|_| {}),
            |_| {},
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        registration.release();
        drop(registration);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_as_safety_net() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let circuit = Circuit::from_fn(|x: i32| x);
        let registration = Registration::subscribe(
            &circuit,
            output(|_| {}),
            |_| {},
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        drop(registration);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_notifier_deregisters_by_identity() {
        let notifier = Arc::new(Notifier::new());
        let first: Handler<i32> = Arc::new(|_| {});
        let second: Handler<i32> = Arc::new(|_| {});

        PushSource::register(&notifier, first.clone());
        PushSource::register(&notifier, second.clone());
        assert_eq!(notifier.handler_count(), 2);

        PushSource::deregister(&notifier, first);
        assert_eq!(notifier.handler_count(), 1);
    }
}

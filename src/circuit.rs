// Copyright (c) 2025 - Cowboy AI, Inc.
//! Circuit - Push-Driven Signal Transformers
//!
//! A `Circuit<I, O>` is a composable, push-driven transformer from an input
//! value to zero or more delivered output values, written in
//! continuation-passing style: invoking a circuit hands it an input and an
//! output continuation, and the circuit synchronously calls that continuation
//! for every value it produces before the invocation returns.
//!
//! ```text
//! occurrence ──> run(input, out) ──┬──> combinator frame
//!                                  │         │
//!                                  │         ▼ continuation
//!                                  │    combinator frame
//!                                  │         │
//!                                  │         ▼ continuation
//!                                  └──────> out(value)
//! ```
//!
//! There is no scheduler and no queue: "the network" is nested closure
//! composition, built once at composition time and reused across invocations.
//!
//! # Invocation Convention
//!
//! Most circuits call their continuation exactly once per invocation
//! ([`Circuit::from_fn`] guarantees it). Filtering circuits may call it zero
//! times. Combinators that select over two sub-circuits call it once per
//! combined pair of upstream deliveries, so a misbehaving sub-circuit can
//! produce more than one.
//!
//! # Laws
//!
//! ```text
//! (a.then(b)).then(c)  ==  a.then(b.then(c))          (associativity)
//! c.map(f).map(g)      ==  c.map(|x| g(f(x)))         (functor composition)
//! c.map(|x| x)         ==  c                          (functor identity)
//! ```
//!
//! # Values and Sharing
//!
//! A `Circuit` is an immutable value; composition always yields a new value.
//! Cloning is cheap and yields a handle onto the *same* underlying combinator
//! instance, including any private state that instance captured (a delay
//! buffer, a dedup set). Two circuits produced by separate composition calls
//! never share state, even when built from identical combinators and
//! arguments.
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_circuits::{output, Circuit};
//!
//! let doubled_plus_one = Circuit::from_fn(|x: i32| x * 2)
//!     .then(Circuit::from_fn(|x| x + 1));
//!
//! doubled_plus_one.run(5, &output(|v| println!("{v}"))); // prints 11
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

/// Continuation receiving the values a circuit delivers.
///
/// Continuations are shared, immutable callbacks; combinators that must hold
/// one across invocations (the delay buffer) clone the `Arc`.
pub type Output<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Handler accepted by an external push source.
///
/// Structurally identical to [`Output`]; the separate alias marks the
/// direction of the boundary (occurrences flowing in, not values flowing out).
pub type Handler<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Wrap a closure as an [`Output`] continuation.
pub fn output<T, F>(f: F) -> Output<T>
where
    F: Fn(T) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Zero-information input for source circuits that need no external data,
/// such as [`constant`](crate::combinators::constant) and
/// [`sample`](crate::combinators::sample).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pulse;

/// Lock a state mutex, recovering from poisoning.
///
/// User functions run outside our locks, but a panic elsewhere in the chain
/// must not wedge combinator state for later invocations.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Step<I, O> = Arc<dyn Fn(I, &Output<O>) + Send + Sync>;

/// Push-driven transformer from `I` to zero or more `O` deliveries.
///
/// The wrapped procedure is `(input, continuation) -> ()`. The default value
/// wraps no procedure at all; [`Circuit::run`] on it is a safe no-op.
pub struct Circuit<I, O> {
    step: Option<Step<I, O>>,
}

impl<I, O> Clone for Circuit<I, O> {
    fn clone(&self) -> Self {
        Self {
            step: self.step.clone(),
        }
    }
}

impl<I, O> Default for Circuit<I, O> {
    /// The uninitialized circuit: running it delivers nothing.
    fn default() -> Self {
        Self { step: None }
    }
}

impl<I, O> fmt::Debug for Circuit<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circuit<{}, {}>", type_name::<I>(), type_name::<O>())
    }
}

impl<I: 'static, O: 'static> Circuit<I, O> {
    /// Wrap a raw continuation-passing procedure as a circuit.
    ///
    /// The procedure may call the continuation any number of times, but the
    /// conventions in the module docs apply: combinators built from this crate
    /// assume at most one call unless documented otherwise.
    pub fn new<F>(step: F) -> Self
    where
        F: Fn(I, &Output<O>) + Send + Sync + 'static,
    {
        Self {
            step: Some(Arc::new(step)),
        }
    }

    /// Lift a pure mapping into a circuit that calls its continuation exactly
    /// once per invocation with the mapped value.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let double = Circuit::from_fn(|x: i32| x * 2);
    /// double.run(21, &output(|v| assert_eq!(v, 42)));
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        Self::new(move |input, out| (**out)(f(input)))
    }

    /// Synchronously drive the circuit with one input.
    ///
    /// Every composed combinator frame runs to completion before this call
    /// returns. Running the uninitialized (default) circuit is a no-op, not
    /// an error.
    pub fn run(&self, input: I, out: &Output<O>) {
        match &self.step {
            Some(step) => (**step)(input, out),
            None => trace!("run on an uninitialized circuit; ignoring"),
        }
    }

    /// Sequence two circuits: `self`'s deliveries become `next`'s inputs.
    ///
    /// Associative: `(a.then(b)).then(c)` and `a.then(b.then(c))` deliver
    /// identical outputs for identical inputs.
    pub fn then<P: 'static>(self, next: Circuit<O, P>) -> Circuit<I, P> {
        Circuit::new(move |input, out: &Output<P>| {
            let next = next.clone();
            let out = out.clone();
            self.run(input, &output(move |mid| next.run(mid, &out)));
        })
    }

    /// Transform the circuit's output with a pure function.
    ///
    /// This is the Functor operation of the algebra:
    /// `c.map(f).map(g) == c.map(|x| g(f(x)))`.
    pub fn map<P, F>(self, f: F) -> Circuit<I, P>
    where
        P: 'static,
        F: Fn(O) -> P + Send + Sync + 'static,
    {
        self.then(Circuit::from_fn(f))
    }

    /// Run two circuits over the same input and combine their deliveries with
    /// a binary function.
    ///
    /// Evaluation order is part of the contract, not an implementation detail:
    /// the *argument* circuit (`other`) runs first and the receiver second,
    /// because combinator chains may carry observable side effects (a dedup
    /// set recording an observation, a sampled counter). The receiver runs
    /// once per delivery of `other`, and `combine` once per delivery of the
    /// receiver.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let sum = Circuit::from_fn(|x: i32| x + 1)
    ///     .apply2(Circuit::from_fn(|x: i32| x * 10), |a, b| a + b);
    /// sum.run(2, &output(|v| assert_eq!(v, 23)));
    /// ```
    pub fn apply2<U, V, G>(self, other: Circuit<I, U>, combine: G) -> Circuit<I, V>
    where
        I: Clone + Send + Sync,
        U: Clone + Send + Sync + 'static,
        V: 'static,
        G: Fn(O, U) -> V + Send + Sync + 'static,
    {
        let combine = Arc::new(combine);
        Circuit::new(move |input: I, out: &Output<V>| {
            let receiver = self.clone();
            let combine = Arc::clone(&combine);
            let out = out.clone();
            let receiver_input = input.clone();
            other.run(
                input,
                &output(move |argument: U| {
                    let combine = Arc::clone(&combine);
                    let out = out.clone();
                    receiver.run(
                        receiver_input.clone(),
                        &output(move |value| (*out)((*combine)(value, argument.clone()))),
                    );
                }),
            );
        })
    }

    /// Run two circuits over the same input and deliver their outputs as a
    /// pair, in [`apply2`](Circuit::apply2)'s evaluation order.
    pub fn pair<U>(self, other: Circuit<I, U>) -> Circuit<I, (O, U)>
    where
        I: Clone + Send + Sync,
        U: Clone + Send + Sync + 'static,
    {
        self.apply2(other, |value, argument| (value, argument))
    }

    /// Delay the circuit by one invocation cycle.
    ///
    /// A single slot buffers the most recent `(input, continuation)` pair.
    /// Each call first drains the slot, running the wrapped circuit on the
    /// *previous* input and delivering to the continuation that accompanied
    /// that input; the slot is then overwritten with the current pair. The
    /// very first call finds the slot empty and delivers nothing.
    ///
    /// Every continuation handed to a given call is thus paired, exactly
    /// once, with the output computed from the input it arrived with; the
    /// pairing is merely deferred by one invocation.
    pub fn delay(self) -> Circuit<I, O>
    where
        I: Send,
    {
        let slot: Arc<Mutex<Option<(I, Output<O>)>>> = Arc::new(Mutex::new(None));
        Circuit::new(move |input, out: &Output<O>| {
            let buffered = lock(&slot).take();
            if let Some((buffered_input, buffered_out)) = buffered {
                self.run(buffered_input, &buffered_out);
            }
            *lock(&slot) = Some((input, out.clone()));
        })
    }

    /// Lift the circuit over the first component of a pair, passing the
    /// second component through unchanged and re-pairing it with each
    /// delivery.
    ///
    /// Used to compose feedback and auxiliary-channel circuits without
    /// disturbing unrelated data.
    pub fn first<A>(self) -> Circuit<(I, A), (O, A)>
    where
        A: Clone + Send + Sync + 'static,
    {
        Circuit::new(move |(input, passthrough): (I, A), out: &Output<(O, A)>| {
            let out = out.clone();
            self.run(
                input,
                &output(move |value| (*out)((value, passthrough.clone()))),
            );
        })
    }

    /// Permanently wire this circuit to an external push source.
    ///
    /// Builds a handler that, on every occurrence, runs the circuit against
    /// the occurrence payload and delivers into `out`, then hands the handler
    /// to the source's `register` procedure. No deregistration path is
    /// offered here; use [`Registration`](crate::bridge::Registration) when
    /// the subscription must be releasable.
    pub fn register<R>(&self, out: Output<O>, register: R)
    where
        R: FnOnce(Handler<I>),
    {
        let circuit = self.clone();
        let handler: Handler<I> = Arc::new(move |input| circuit.run(input, &out));
        debug!("registering permanent circuit handler");
        register(handler);
    }
}

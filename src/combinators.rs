// Copyright (c) 2025 - Cowboy AI, Inc.
//! Circuit Combinators
//!
//! Free functions that build or compose circuits. Sources (`constant`,
//! `sample`) produce values from a [`Pulse`] input; the rest wrap an existing
//! circuit and reshape what it delivers.
//!
//! Combinators that carry private state (`distinct`, `switch`, `feedback`)
//! create that state once per call to the combinator: two circuits built by
//! separate calls never share a dedup set, an active switch target, or a
//! feedback value.
//!
//! # Available Combinators
//!
//! - `constant` - source delivering one fixed value per pulse
//! - `sample` - source reading an external value per pulse
//! - `filter` - deliver only values matching a predicate
//! - `distinct` - deliver each value the first time it is ever seen
//! - `merge_events` - prefer the first of two event-valued circuits
//! - `switch` - replace the live sub-circuit when an occurrence arrives
//! - `feedback` - thread a state value from each cycle into the next
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_circuits::{output, Circuit, combinators::{distinct, filter}};
//!
//! let readings = Circuit::from_fn(|raw: i32| raw / 10);
//! let alerts = filter(distinct(readings), |v| *v > 3);
//! alerts.run(48, &output(|v| println!("alert level {v}")));
//! ```

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::circuit::{lock, output, Circuit, Output, Pulse};
use crate::event::Event;

/// Source circuit ignoring its pulse input and always delivering one fixed
/// value.
pub fn constant<T>(value: T) -> Circuit<Pulse, T>
where
    T: Clone + Send + Sync + 'static,
{
    Circuit::new(move |_: Pulse, out: &Output<T>| (**out)(value.clone()))
}

/// Source circuit invoking a zero-argument reader on every pulse and
/// delivering its current result.
///
/// # Examples
///
/// ```rust,ignore
/// let ticks = AtomicUsize::new(0);
/// let counter = sample(move || ticks.fetch_add(1, Ordering::SeqCst));
/// ```
pub fn sample<T, F>(read: F) -> Circuit<Pulse, T>
where
    T: 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Circuit::new(move |_: Pulse, out: &Output<T>| (**out)(read()))
}

/// Deliver only the values for which `predicate` holds; other invocations
/// produce no output at all.
pub fn filter<I, O, P>(circuit: Circuit<I, O>, predicate: P) -> Circuit<I, O>
where
    I: 'static,
    O: 'static,
    P: Fn(&O) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    Circuit::new(move |input, out: &Output<O>| {
        let predicate = Arc::clone(&predicate);
        let out = out.clone();
        circuit.run(
            input,
            &output(move |value| {
                if (*predicate)(&value) {
                    (*out)(value);
                } else {
                    trace!("filter suppressed a value");
                }
            }),
        );
    })
}

/// Deliver a value only the first time this circuit instance ever observes
/// it; repeats are suppressed forever after.
///
/// The set of observed values grows for the life of the circuit and is never
/// pruned; unbounded memory growth is the accepted cost of the contract.
pub fn distinct<I, O>(circuit: Circuit<I, O>) -> Circuit<I, O>
where
    I: 'static,
    O: Clone + Eq + Hash + Send + 'static,
{
    let seen: Arc<Mutex<HashSet<O>>> = Arc::new(Mutex::new(HashSet::new()));
    Circuit::new(move |input, out: &Output<O>| {
        let seen = Arc::clone(&seen);
        let out = out.clone();
        circuit.run(
            input,
            &output(move |value: O| {
                if lock(&seen).insert(value.clone()) {
                    (*out)(value);
                } else {
                    trace!("distinct suppressed a previously observed value");
                }
            }),
        );
    })
}

/// Merge two event-valued circuits over the same input: the first circuit's
/// event is delivered when it carries a value, otherwise the second's.
///
/// Both circuits run on every call regardless of whose event is chosen; per
/// the [`apply2`](Circuit::apply2) order contract, `b` runs before `a`.
pub fn merge_events<I, T>(a: Circuit<I, Event<T>>, b: Circuit<I, Event<T>>) -> Circuit<I, Event<T>>
where
    I: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    a.apply2(b, |preferred, fallback| {
        if preferred.has_value() {
            preferred
        } else {
            fallback
        }
    })
}

/// Dynamic behavior switching.
///
/// `source` yields `(value, Event<selector>)` pairs. While no occurrence has
/// ever arrived, the value component passes through unchanged. When an
/// occurrence carries a selector, `build` constructs a new active
/// sub-circuit; from that call on the value component is ignored and the
/// external input is routed through the active sub-circuit, until a later
/// occurrence replaces it. The active reference persists across calls.
pub fn switch<I, T, S, B>(source: Circuit<I, (T, Event<S>)>, build: B) -> Circuit<I, T>
where
    I: Clone + Send + Sync + 'static,
    T: 'static,
    S: 'static,
    B: Fn(S) -> Circuit<I, T> + Send + Sync + 'static,
{
    let active: Arc<Mutex<Option<Circuit<I, T>>>> = Arc::new(Mutex::new(None));
    let build = Arc::new(build);
    Circuit::new(move |input: I, out: &Output<T>| {
        let active = Arc::clone(&active);
        let build = Arc::clone(&build);
        let out = out.clone();
        let routed_input = input.clone();
        source.run(
            input,
            &output(move |(value, event): (T, Event<S>)| {
                if let Some(selector) = event.into_value() {
                    debug!("switch replacing active sub-circuit");
                    *lock(&active) = Some((*build)(selector));
                }
                let current = lock(&active).clone();
                match current {
                    Some(sub) => sub.run(routed_input.clone(), &out),
                    None => (*out)(value),
                }
            }),
        );
    })
}

/// Feedback loop.
///
/// Wraps a circuit of signature `(input, state) -> (output, next_state)`.
/// Each call pairs the new external input with the retained state (initially
/// `initial`), runs the wrapped circuit, delivers only the output component,
/// and retains the next-state component for the following call.
///
/// # Examples
///
/// ```rust,ignore
/// // running sum: f(i, s) = (s + i, s + i)
/// let sum = feedback(
///     Circuit::from_fn(|(i, s): (i32, i32)| (s + i, s + i)),
///     0,
/// );
/// // inputs [1, 2, 3] deliver [1, 3, 6]
/// ```
pub fn feedback<I, O, S>(circuit: Circuit<(I, S), (O, S)>, initial: S) -> Circuit<I, O>
where
    I: 'static,
    O: 'static,
    S: Clone + Send + 'static,
{
    let state = Arc::new(Mutex::new(initial));
    Circuit::new(move |input: I, out: &Output<O>| {
        let state = Arc::clone(&state);
        let out = out.clone();
        let current = lock(&state).clone();
        circuit.run(
            (input, current),
            &output(move |(value, next): (O, S)| {
                *lock(&state) = next;
                (*out)(value);
            }),
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn collect<T: Send + 'static>() -> (Output<T>, Arc<Mutex<Vec<T>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&sink);
        (
            output(move |value| captured.lock().unwrap().push(value)),
            sink,
        )
    }

    #[test]
    fn test_constant_ignores_pulse() {
        let circuit = constant(42);
        let (out, sink) = collect();
        circuit.run(Pulse, &out);
        circuit.run(Pulse, &out);
        assert_eq!(*sink.lock().unwrap(), vec![42, 42]);
    }

    #[test]
    fn test_sample_reads_on_every_pulse() {
        let counter = Arc::new(AtomicI32::new(0));
        let reader = Arc::clone(&counter);
        let circuit = sample(move || reader.fetch_add(1, Ordering::SeqCst));

        let (out, sink) = collect();
        circuit.run(Pulse, &out);
        circuit.run(Pulse, &out);
        circuit.run(Pulse, &out);
        assert_eq!(*sink.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_filter_suppresses_non_matching_values() {
        let evens = filter(Circuit::from_fn(|x: i32| x), |v| v % 2 == 0);
        let (out, sink) = collect();
        for input in [1, 2, 3, 4] {
            evens.run(input, &out);
        }
        assert_eq!(*sink.lock().unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_distinct_delivers_first_occurrences_only() {
        let circuit = distinct(Circuit::from_fn(|x: i32| x));
        let (out, sink) = collect();
        for input in [1, 1, 2, 2, 1] {
            circuit.run(input, &out);
        }
        // the trailing 1 stays suppressed; 1 was observed at the start
        assert_eq!(*sink.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_merge_events_prefers_first_circuit() {
        let both = merge_events(
            Circuit::from_fn(|x: i32| {
                if x > 0 {
                    Event::some("first")
                } else {
                    Event::none()
                }
            }),
            Circuit::from_fn(|_: i32| Event::some("second")),
        );

        let (out, sink) = collect();
        both.run(1, &out);
        both.run(-1, &out);
        assert_eq!(
            *sink.lock().unwrap(),
            vec![Event::some("first"), Event::some("second")]
        );
    }

    #[test]
    fn test_merge_events_runs_both_circuits() {
        let runs = Arc::new(AtomicI32::new(0));

        let a_runs = Arc::clone(&runs);
        let a = Circuit::new(move |_: i32, out: &Output<Event<i32>>| {
            a_runs.fetch_add(1, Ordering::SeqCst);
            (**out)(Event::some(1));
        });
        let b_runs = Arc::clone(&runs);
        let b = Circuit::new(move |_: i32, out: &Output<Event<i32>>| {
            b_runs.fetch_add(1, Ordering::SeqCst);
            (**out)(Event::none());
        });

        let merged = merge_events(a, b);
        let (out, _sink) = collect();
        merged.run(0, &out);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_switch_passes_through_until_occurrence() {
        // selector n builds a sub-circuit multiplying by n
        let source = Circuit::from_fn(|x: i32| {
            let event = if x == 0 { Event::some(10) } else { Event::none() };
            (x, event)
        });
        let switched = switch(source, |n: i32| Circuit::from_fn(move |x: i32| x * n));

        let (out, sink) = collect();
        switched.run(1, &out);
        switched.run(2, &out);
        switched.run(0, &out); // occurrence: selector 10
        switched.run(3, &out);
        switched.run(4, &out);

        assert_eq!(*sink.lock().unwrap(), vec![1, 2, 0, 30, 40]);
    }

    #[test]
    fn test_switch_replaces_active_sub_circuit() {
        let source = Circuit::from_fn(|x: i32| {
            let event = if x < 0 { Event::some(-x) } else { Event::none() };
            (x, event)
        });
        let switched = switch(source, |n: i32| Circuit::from_fn(move |x: i32| x + n));

        let (out, sink) = collect();
        switched.run(5, &out); // pass-through
        switched.run(-100, &out); // selector 100
        switched.run(1, &out);
        switched.run(-200, &out); // selector 200 replaces 100
        switched.run(1, &out);

        assert_eq!(*sink.lock().unwrap(), vec![5, 0, 101, 0, 201]);
    }

    #[test]
    fn test_feedback_running_sum() {
        let sum = feedback(Circuit::from_fn(|(i, s): (i32, i32)| (s + i, s + i)), 0);
        let (out, sink) = collect();
        for input in [1, 2, 3] {
            sum.run(input, &out);
        }
        assert_eq!(*sink.lock().unwrap(), vec![1, 3, 6]);
    }

    #[test]
    fn test_feedback_state_starts_from_initial() {
        let sum = feedback(Circuit::from_fn(|(i, s): (i32, i32)| (s + i, s)), 7);
        let (out, sink) = collect();
        sum.run(1, &out);
        assert_eq!(*sink.lock().unwrap(), vec![8]);
    }
}

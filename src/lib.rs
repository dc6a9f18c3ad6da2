//! Push-driven circuit combinators for the Composable Information Machine
//!
//! This crate provides a continuation-passing-style reactive combinator
//! algebra: **circuits** are composable, push-driven transformers that
//! connect an external, synchronous push source (a property-change
//! notification, a message callback) to application logic.
//!
//! # Core Concepts
//!
//! ## Circuit<I, O>
//!
//! A transformer from an input value to zero or more delivered output
//! values. Invoking a circuit hands it the input and an output continuation;
//! every composed combinator frame runs synchronously before the invocation
//! returns.
//!
//! ```text
//! Occurrence: ────●────────●────●────→
//!                 │        │    │
//!                 ▼        ▼    ▼
//!               run()    run()  run()   each call threads the whole chain
//! ```
//!
//! ## Event<T>
//!
//! A tagged optional: "did an occurrence happen this cycle, and with what
//! value." Carried through the switching and merging combinators.
//!
//! ## Registration
//!
//! A disposal-safe handle adapting an external register/deregister push API
//! into repeated circuit invocation, with exactly-once release semantics.
//!
//! # Laws
//!
//! Circuits satisfy the sequencing and functor laws:
//!
//! ```text
//! (a.then(b)).then(c) == a.then(b.then(c))
//! c.map(f).map(g)     == c.map(|x| g(f(x)))
//! c.map(|x| x)        == c
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_circuits::{output, Circuit, Notifier, Registration};
//! use std::sync::Arc;
//!
//! let pipeline = Circuit::from_fn(|x: i32| x * 2)
//!     .then(Circuit::from_fn(|x| x + 1));
//!
//! let notifier = Arc::new(Notifier::new());
//! let registration = Registration::from_source(
//!     &pipeline,
//!     output(|v| println!("delivered {v}")),
//!     Arc::clone(&notifier),
//! );
//!
//! notifier.notify(5); // prints "delivered 11"
//! registration.release();
//! ```
//!
//! There is no scheduler, no queue, and no cross-thread dispatch: the system
//! assumes one synchronous invocation per externally observed occurrence and
//! performs all composed work before returning. The only concurrency concern
//! is releasing a [`Registration`], which is race-safe.

pub mod bridge;
pub mod circuit;
pub mod combinators;
pub mod errors;
pub mod event;

// Re-export commonly used types
pub use bridge::{Notifier, PushSource, Registration};
pub use circuit::{output, Circuit, Handler, Output, Pulse};
pub use combinators::*;
pub use errors::{CircuitError, CircuitResult};
pub use event::Event;

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event - Tagged Optional Occurrences
//!
//! An `Event<T>` answers "did an occurrence happen this cycle, and with what
//! value." It is the value type threaded through the switching and merging
//! combinators: a cycle either carries a payload or it does not.
//!
//! ```text
//! Cycle:  1      2      3      4      5
//! Event:  ●42    ∅      ∅      ●7     ∅
//! ```
//!
//! # Equality and Hashing
//!
//! Equality compares payloads when both sides carry one; two absent events
//! are equal; a present event never equals an absent one.
//!
//! Hashing writes a type tag and then the payload; the presence flag itself
//! is not hashed, so an absent event hashes to the bare type tag. The usual
//! `Eq`/`Hash` contract still holds: equal events feed the hasher identical
//! input, because the absent case has no payload to contribute. The only
//! consequence is that an absent event may collide with a present one, which
//! hashing permits.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{CircuitError, CircuitResult};

/// A tagged optional payload: "no occurrence" or "occurrence with value `T`."
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event<T> {
    value: Option<T>,
}

impl<T> Event<T> {
    /// An occurrence carrying `payload`.
    pub fn some(payload: T) -> Self {
        Self {
            value: Some(payload),
        }
    }

    /// No occurrence this cycle.
    pub fn none() -> Self {
        Self { value: None }
    }

    /// Whether an occurrence happened.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Borrow the payload, if present.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Consume the event, yielding the payload if present.
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Consume the event, yielding the payload or
    /// [`CircuitError::NoOccurrence`].
    pub fn try_into_value(self) -> CircuitResult<T> {
        self.value.ok_or(CircuitError::NoOccurrence)
    }

    /// Transform the payload, preserving absence.
    pub fn map<U, F>(self, f: F) -> Event<U>
    where
        F: FnOnce(T) -> U,
    {
        Event {
            value: self.value.map(f),
        }
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> From<Option<T>> for Event<T> {
    fn from(value: Option<T>) -> Self {
        Self { value }
    }
}

impl<T> From<Event<T>> for Option<T> {
    fn from(event: Event<T>) -> Self {
        event.value
    }
}

impl<T: PartialEq> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Eq> Eq for Event<T> {}

impl<T: Hash + 'static> Hash for Event<T> {
    // Type tag plus payload; the presence flag is not hashed. See the module
    // docs for the contract.
    fn hash<H: Hasher>(&self, state: &mut H) {
        TypeId::of::<T>().hash(state);
        if let Some(payload) = &self.value {
            payload.hash(state);
        }
    }
}

//! Events consumed by the event loop
//!
//! Producers talk to the renderer only by sending [`Event`] values through
//! the bounded queue. Foreign producers that can only pass flat records
//! (for example through a C ABI) use [`RawEvent`], which always decodes:
//! unknown kinds become [`Event::Unrecognized`] and are skipped by the loop.

use derive_more::Display;

/// Identifier of a progress bar. Unique among live bars only.
pub type BarId = i64;

/// One producer-originated instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Create a bar, optionally under a parent
    Create {
        id: BarId,
        total: i64,
        label: String,
        parent: Option<BarId>,
    },
    /// Add `delta` to the current count of a bar
    Advance { id: BarId, delta: i64 },
    /// Remove a bar and all of its descendants
    Remove { id: BarId },
    /// A raw event with a kind code this version does not know
    Unrecognized { kind: i32 },
}

impl Event {
    /// Create a root bar
    pub fn create(id: BarId, total: i64, label: impl Into<String>) -> Self {
        Self::Create {
            id,
            total,
            label: label.into(),
            parent: None,
        }
    }

    /// Create a bar under `parent`
    pub fn create_child(id: BarId, total: i64, label: impl Into<String>, parent: BarId) -> Self {
        Self::Create {
            id,
            total,
            label: label.into(),
            parent: Some(parent),
        }
    }
}

/// Kind code of a create event in [`RawEvent`]
pub const KIND_CREATE: i32 = 0;
/// Kind code of an advance event in [`RawEvent`]
pub const KIND_ADVANCE: i32 = 1;
/// Kind code of a remove event in [`RawEvent`]
pub const KIND_REMOVE: i32 = 2;

/// Flat event record as emitted across a foreign boundary.
///
/// `value` is the total for create and the delta for advance.
/// A negative `parent` means the bar has no parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: i32,
    pub id: BarId,
    pub value: i64,
    pub label: String,
    pub parent: BarId,
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        match raw.kind {
            KIND_CREATE => Event::Create {
                id: raw.id,
                total: raw.value,
                label: raw.label,
                parent: (raw.parent >= 0).then_some(raw.parent),
            },
            KIND_ADVANCE => Event::Advance {
                id: raw.id,
                delta: raw.value,
            },
            KIND_REMOVE => Event::Remove { id: raw.id },
            kind => Event::Unrecognized { kind },
        }
    }
}

/// Something about an event that did not match the live tree.
///
/// None of these are errors for the producer. The tree applies its
/// tolerance policy and the loop only logs them.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Anomaly {
    /// Create with an id that is already live. The event is ignored.
    #[display("bar {_0} already exists")]
    DuplicateId(BarId),
    /// Advance or remove of an id that is not live. The event is ignored.
    #[display("bar {_0} does not exist")]
    UnknownId(BarId),
    /// Create under a parent that is not live. The bar becomes a root.
    #[display("parent {parent} of bar {id} does not exist, created as root")]
    DanglingParent { id: BarId, parent: BarId },
    /// Event kind not understood. The event is ignored.
    #[display("unrecognized event kind {_0}")]
    UnrecognizedKind(i32),
}

impl std::error::Error for Anomaly {}

#![forbid(unsafe_code)]

//! The panel capability interface.

use std::fmt;
use std::sync::mpsc::Sender;

use blade_core::{BladeId, BladeType};
use serde_json::{Map, Value};

/// Opaque property bag forwarded to a panel on mount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BladeProps(Map<String, Value>);

impl BladeProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for BladeProps {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One-shot "my data is loaded" signal handed to a panel on mount.
///
/// `notify` consumes the signal, so a panel can report readiness at most once.
/// The signal is `Send`: a panel may move it to a worker thread and notify from
/// there; the stack picks it up on its next [`drain_ready`].
///
/// Dropping the signal without notifying leaves the blade hidden until the
/// ready timeout removes it.
///
/// [`drain_ready`]: crate::BladeStack::drain_ready
pub struct ReadySignal {
    id: BladeId,
    tx: Sender<BladeId>,
}

impl ReadySignal {
    pub(crate) fn new(id: BladeId, tx: Sender<BladeId>) -> Self {
        Self { id, tx }
    }

    /// The blade this signal belongs to.
    #[must_use]
    pub fn id(&self) -> BladeId {
        self.id
    }

    /// Report that the panel finished loading.
    pub fn notify(self) {
        // The stack may already be gone; nothing to report to then.
        let _ = self.tx.send(self.id);
    }
}

impl fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySignal").field("id", &self.id).finish()
    }
}

/// A panel hosted by the blade stack.
///
/// The engine never knows the concrete type; it only mounts the panel and
/// waits for the ready signal.
pub trait BladePanel {
    /// Start the panel's own data fetch. Call `ready.notify()` once done.
    fn mount(&mut self, props: &BladeProps, ready: ReadySignal);

    /// Family of the panel, used for its width.
    fn blade_type(&self) -> BladeType {
        BladeType::View
    }

    /// Short name for diagnostics.
    fn name(&self) -> &str {
        "blade"
    }
}

//! Downstream enrichment stream.
//!
//! The runner emits newly-actionable `(target, entity)` pairs to
//! subscribers over a bounded channel. Delivery is best-effort: sends never
//! block a check cycle, and a slow subscriber loses events (counted, not
//! retried). Guaranteeing delivery is the consumer's responsibility.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::entity::{ObservedEntity, TargetKey};

/// One newly-discovered or newly-changed entity, ready for enrichment
/// (summarization, mail) by a consumer.
#[derive(Debug, Clone)]
pub struct NewEntity {
    /// The target that produced the entity.
    pub target_key: TargetKey,

    /// The entity itself.
    pub entity: ObservedEntity,
}

/// A subscription handle for newly-actionable entities.
///
/// Dropping the stream disconnects it; the runner prunes disconnected
/// subscribers on the next forward.
#[derive(Debug)]
pub struct EnrichmentStream {
    rx: Receiver<NewEntity>,
}

impl EnrichmentStream {
    pub(crate) fn new(rx: Receiver<NewEntity>) -> Self {
        Self { rx }
    }

    /// Receives the next entity, blocking until one arrives or every
    /// runner handle is gone.
    pub fn recv(&self) -> Option<NewEntity> {
        self.rx.recv().ok()
    }

    /// Receives the next entity, giving up after `timeout` or on
    /// disconnection.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<NewEntity> {
        match self.rx.recv_timeout(timeout) {
            Ok(entity) => Some(entity),
            Err(RecvTimeoutError::Disconnected | RecvTimeoutError::Timeout) => None,
        }
    }

    /// Drains every entity currently buffered, without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<NewEntity> {
        self.rx.try_iter().collect()
    }
}

/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Resource events handed to external producers after a committed write.
//!
//! Delivery and acknowledgement belong to the producer. The ledger only stages an outbox row in
//! the writing transaction and, after commit, passes the event to whichever producer is registered
//! for the resource type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use inventory_models::models::outbox_events::{NewOutboxEvent, RESOURCE_AGGREGATE_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOperation {
    Created,
    Updated,
    Deleted,
}

impl EventOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOperation::Created => "created",
            EventOperation::Updated => "updated",
            EventOperation::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EventOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identity of the caller that triggered a write. Used only for attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub principal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl Identity {
    pub fn new(principal: impl Into<String>) -> Self {
        Identity {
            principal: principal.into(),
            tenant: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEvent {
    pub resource_type: String,
    pub resource_id: Uuid,
    pub operation: EventOperation,
    pub identity: Option<Identity>,
    pub transaction_id: Option<String>,
    pub payload: Value,
}

impl ResourceEvent {
    /// The outbox row that records this event.
    pub fn to_outbox_event(&self) -> Result<NewOutboxEvent, LedgerError> {
        NewOutboxEvent::new(
            RESOURCE_AGGREGATE_TYPE.to_string(),
            self.resource_id.to_string(),
            self.operation.as_str().to_string(),
            self.transaction_id.clone(),
            json!({
                "resource_type": self.resource_type,
                "resource_id": self.resource_id,
                "identity": self.identity,
                "payload": self.payload,
            }),
        )
        .map_err(LedgerError::InvalidArgument)
    }
}

/// Receives events after the write they describe has committed.
pub trait EventProducer: Send + Sync {
    fn produce(&self, event: &ResourceEvent) -> Result<(), LedgerError>;
}

/// Maps resource types to producers, with an optional fallback.
#[derive(Clone, Default)]
pub struct ProducerRegistry {
    producers: HashMap<String, Arc<dyn EventProducer>>,
    default_producer: Option<Arc<dyn EventProducer>>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource_type: impl Into<String>, producer: Arc<dyn EventProducer>) {
        self.producers.insert(resource_type.into(), producer);
    }

    pub fn set_default(&mut self, producer: Arc<dyn EventProducer>) {
        self.default_producer = Some(producer);
    }

    /// The producer for `resource_type`, else the default, else `None` (no emission).
    pub fn lookup(&self, resource_type: &str) -> Option<Arc<dyn EventProducer>> {
        let producer = self
            .producers
            .get(resource_type)
            .cloned()
            .or_else(|| self.default_producer.clone());
        if producer.is_none() {
            debug!(resource_type, "No event producer registered");
        }
        producer
    }
}

impl fmt::Debug for ProducerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.producers.keys().collect();
        types.sort();
        f.debug_struct("ProducerRegistry")
            .field("resource_types", &types)
            .field("has_default", &self.default_producer.is_some())
            .finish()
    }
}

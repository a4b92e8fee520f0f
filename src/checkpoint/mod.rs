//! Checkpoint and resume functionality for state machines.
//!
//! A checkpoint captures what a machine needs to carry on after a process
//! restart: the active configuration and the extended state. Tables hold
//! closures and are never serialized; a checkpoint is restored onto a
//! machine built from the same table with
//! [`Machine::restore`](crate::machine::Machine::restore).

use crate::core::{State, Variables};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of a running machine.
/// Does NOT include guards or actions (not serializable), nor pending
/// deferred events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Active states in declaration order
    pub active_states: Vec<S>,

    /// Extended state of the machine
    pub variables: Variables,
}

impl<S: State> Checkpoint<S> {
    pub(crate) fn new(active_states: Vec<S>, variables: Variables) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            active_states,
            variables,
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, rejecting unknown format versions.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Serialize to a compact binary form.
    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        // bincode cannot encode `serde_json::Value` directly; the extended
        // state travels as a JSON string inside the binary envelope.
        let envelope = BinaryEnvelope {
            version: self.version,
            id: self.id.clone(),
            timestamp: self.timestamp,
            active_states: self.active_states.clone(),
            variables: serde_json::to_string(&self.variables)
                .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?,
        };
        bincode::serialize(&envelope).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from the binary form produced by [`to_binary`](Self::to_binary).
    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let envelope: BinaryEnvelope<S> = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        let checkpoint = Self {
            version: envelope.version,
            id: envelope.id,
            timestamp: envelope.timestamp,
            active_states: envelope.active_states,
            variables: serde_json::from_str(&envelope.variables)
                .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?,
        };
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub(crate) fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
struct BinaryEnvelope<S: State> {
    version: u32,
    id: String,
    timestamp: DateTime<Utc>,
    active_states: Vec<S>,
    variables: String,
}

//! models/sequencer_model.rs
//! Estados y eventos del secuenciador de envíos.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    Idle,
    Running,
    Paused,
    /// Esperando el backoff corto después de un fallo
    DrainingOnError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SequencerEvent {
    Progress {
        remaining: usize,
        next_delay_seconds: u64,
    },
    Failed {
        recipient: String,
        error_message: String,
    },
    Paused {
        remaining: usize,
    },
    Finished,
}

/// GET /api/campaign/status
#[derive(Debug, Clone, Serialize)]
pub struct SequencerStatus {
    pub state: SequencerState,
    pub remaining: usize,
    pub pause_requested: bool,
    pub last_event: Option<SequencerEvent>,
}

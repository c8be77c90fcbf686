#![forbid(unsafe_code)]

//! Deterministic transition trace.
//!
//! Records what the controller did and when, on the host-supplied clock, so
//! two runs fed the same inputs and timestamps can be compared by checksum.
//! Lines are JSONL:
//!
//! ```text
//! {"at_ms":0,"event":"begin"}
//! {"at_ms":250,"event":"fired","seq":0,"action":"hide"}
//! ```

use core::time::Duration;

use serde::Serialize;

use crate::timing::FadeAction;

const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0100_0000_01b3;
const TRACE_HASH_ALGO: &str = "fnv1a64";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceKind {
    InputRejected,
    Begin,
    Complete { outcome: String },
    Fired { seq: u64, action: FadeAction },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: TraceKind,
}

#[derive(Debug, Clone, Default)]
pub struct TransitionTrace {
    events: Vec<TraceEvent>,
}

#[must_use]
fn fnv1a64_extend(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

impl TransitionTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, at: Duration, kind: TraceKind) {
        let at_ms = u64::try_from(at.as_millis()).unwrap_or(u64::MAX);
        self.events.push(TraceEvent { at_ms, kind });
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// One JSON object per line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            if let Ok(line) = serde_json::to_string(event) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// FNV-1a over the event stream, e.g. `fnv1a64:0123456789abcdef`.
    #[must_use]
    pub fn checksum(&self) -> String {
        let mut hash = FNV64_OFFSET_BASIS;
        let count = u64::try_from(self.events.len()).unwrap_or(u64::MAX);
        hash = fnv1a64_extend(hash, &count.to_le_bytes());
        for event in &self.events {
            hash = fnv1a64_extend(hash, &event.at_ms.to_le_bytes());
            match &event.kind {
                TraceKind::InputRejected => hash = fnv1a64_extend(hash, &[0]),
                TraceKind::Begin => hash = fnv1a64_extend(hash, &[1]),
                TraceKind::Complete { outcome } => {
                    hash = fnv1a64_extend(hash, &[2]);
                    hash = fnv1a64_extend(hash, outcome.as_bytes());
                }
                TraceKind::Fired { seq, action } => {
                    hash = fnv1a64_extend(hash, &[3]);
                    hash = fnv1a64_extend(hash, &seq.to_le_bytes());
                    hash = fnv1a64_extend(hash, action.as_str().as_bytes());
                }
            }
        }
        format!("{TRACE_HASH_ALGO}:{hash:016x}")
    }
}

//! Send job: one message to one destination with one credential.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RunId;

/// A single unit of outbound work.
///
/// Jobs are created by [`crate::ValidatedBatch::fan_out`] and never change
/// after being enqueued.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendJob {
    /// The run this job belongs to.
    pub run_id: RunId,
    /// Target conversation, group or feed.
    pub destination_id: String,
    /// Opaque access token used for the outbound call.
    pub credential: String,
    /// Message body.
    pub message_text: String,
    /// Seconds the worker sleeps after finishing this job.
    pub pacing_interval_secs: u64,
}

impl SendJob {
    /// Pacing delay as a `Duration`.
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_secs(self.pacing_interval_secs)
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for SendJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendJob")
            .field("run_id", &self.run_id)
            .field("destination_id", &self.destination_id)
            .field("credential", &"<redacted>")
            .field("message_text", &self.message_text)
            .field("pacing_interval_secs", &self.pacing_interval_secs)
            .finish()
    }
}

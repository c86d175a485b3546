//! Batch submission: validation and fan-out into send jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RunId, SendJob};

pub const MIN_PACING_INTERVAL_SECS: i64 = 1;
pub const MAX_PACING_INTERVAL_SECS: i64 = 7200;

/// Input rejected before any job is queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Conversation ID cannot be empty")]
    EmptyDestination,

    #[error("Invalid time interval")]
    InvalidInterval(String),

    #[error(
        "Time interval must be between {MIN_PACING_INTERVAL_SECS} and {MAX_PACING_INTERVAL_SECS} seconds"
    )]
    IntervalOutOfRange(i64),

    #[error("Credential list cannot be empty")]
    NoCredentials,

    #[error("Message list cannot be empty")]
    NoMessages,
}

/// Split uploaded text into trimmed, non-blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the pacing interval field of the submission form.
pub fn parse_interval(raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidInterval(raw.to_string()))
}

/// A batch as submitted by the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub destination_id: String,
    pub credentials: Vec<String>,
    pub messages: Vec<String>,
    pub pacing_interval_secs: i64,
}

impl BatchRequest {
    /// Build a request from raw form fields (one credential or message per line).
    pub fn from_form(
        destination_id: &str,
        credentials: &str,
        messages: &str,
        pacing_interval: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            destination_id: destination_id.to_string(),
            credentials: split_lines(credentials),
            messages: split_lines(messages),
            pacing_interval_secs: parse_interval(pacing_interval)?,
        })
    }

    /// Check the shape and range of every field.
    pub fn validate(&self) -> Result<ValidatedBatch, ValidationError> {
        let destination_id = self.destination_id.trim();
        if destination_id.is_empty() {
            return Err(ValidationError::EmptyDestination);
        }

        let interval = self.pacing_interval_secs;
        if !(MIN_PACING_INTERVAL_SECS..=MAX_PACING_INTERVAL_SECS).contains(&interval) {
            return Err(ValidationError::IntervalOutOfRange(interval));
        }

        let credentials = trimmed_non_blank(&self.credentials);
        if credentials.is_empty() {
            return Err(ValidationError::NoCredentials);
        }

        let messages = trimmed_non_blank(&self.messages);
        if messages.is_empty() {
            return Err(ValidationError::NoMessages);
        }

        Ok(ValidatedBatch {
            destination_id: destination_id.to_string(),
            credentials,
            messages,
            pacing_interval_secs: interval as u64,
        })
    }
}

fn trimmed_non_blank(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A batch that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub destination_id: String,
    pub credentials: Vec<String>,
    pub messages: Vec<String>,
    pub pacing_interval_secs: u64,
}

impl ValidatedBatch {
    /// Number of jobs the batch expands to.
    pub fn total(&self) -> u64 {
        self.messages.len() as u64
    }

    /// Expand into one job per message, assigning credentials round-robin.
    pub fn fan_out(&self, run_id: RunId) -> Vec<SendJob> {
        self.messages
            .iter()
            .enumerate()
            .map(|(i, message)| SendJob {
                run_id,
                destination_id: self.destination_id.clone(),
                credential: self.credentials[i % self.credentials.len()].clone(),
                message_text: message.clone(),
                pacing_interval_secs: self.pacing_interval_secs,
            })
            .collect()
    }

    /// Configuration snapshot kept alongside the archived inputs.
    pub fn snapshot(&self, run_id: RunId) -> BatchSnapshot {
        BatchSnapshot {
            run_id,
            destination_id: self.destination_id.clone(),
            pacing_interval_secs: self.pacing_interval_secs,
            total_messages: self.total(),
            credential_count: self.credentials.len(),
            start_time: Utc::now(),
        }
    }
}

/// JSON snapshot of a batch, written for human inspection only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub run_id: RunId,
    pub destination_id: String,
    pub pacing_interval_secs: u64,
    pub total_messages: u64,
    pub credential_count: usize,
    pub start_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(interval: i64) -> BatchRequest {
        BatchRequest {
            destination_id: "grp1".into(),
            credentials: vec!["t1".into(), "t2".into()],
            messages: vec!["hi".into(), "yo".into(), "sup".into()],
            pacing_interval_secs: interval,
        }
    }

    #[test]
    fn fan_out_assigns_credentials_round_robin() -> Result<(), ValidationError> {
        let batch = request(2).validate()?;
        let jobs = batch.fan_out(RunId::new());

        let credentials: Vec<&str> = jobs.iter().map(|j| j.credential.as_str()).collect();
        assert_eq!(credentials, ["t1", "t2", "t1"]);
        let texts: Vec<&str> = jobs.iter().map(|j| j.message_text.as_str()).collect();
        assert_eq!(texts, ["hi", "yo", "sup"]);
        assert!(jobs.iter().all(|j| j.pacing_interval_secs == 2));
        assert_eq!(batch.total(), 3);
        Ok(())
    }

    #[test]
    fn fan_out_cycles_many_messages() -> Result<(), ValidationError> {
        let mut req = request(1);
        req.credentials = vec!["a".into(), "b".into(), "c".into()];
        req.messages = (0..10).map(|i| format!("m{i}")).collect();
        let batch = req.validate()?;

        for (i, job) in batch.fan_out(RunId::new()).iter().enumerate() {
            assert_eq!(job.credential, batch.credentials[i % 3]);
        }
        Ok(())
    }

    #[test]
    fn rejects_blank_destination() {
        let mut req = request(5);
        req.destination_id = "   ".into();
        assert_eq!(req.validate(), Err(ValidationError::EmptyDestination));
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        assert!(request(1).validate().is_ok());
        assert!(request(7200).validate().is_ok());
        assert_eq!(
            request(0).validate(),
            Err(ValidationError::IntervalOutOfRange(0))
        );
        assert_eq!(
            request(7201).validate(),
            Err(ValidationError::IntervalOutOfRange(7201))
        );
    }

    #[test]
    fn blank_lines_are_trimmed_before_the_empty_check() {
        let mut req = request(5);
        req.credentials = vec!["".into(), "  ".into()];
        assert_eq!(req.validate(), Err(ValidationError::NoCredentials));

        let mut req = request(5);
        req.messages = vec!["\t".into()];
        assert_eq!(req.validate(), Err(ValidationError::NoMessages));
    }

    #[test]
    fn form_fields_are_split_and_parsed() -> Result<(), ValidationError> {
        let req = BatchRequest::from_form(" grp1 ", "t1\n\n t2 \n", "hi\r\nyo\n\n", " 30 ")?;
        assert_eq!(req.credentials, ["t1", "t2"]);
        assert_eq!(req.messages, ["hi", "yo"]);
        assert_eq!(req.pacing_interval_secs, 30);
        assert_eq!(req.validate()?.destination_id, "grp1");
        Ok(())
    }

    #[test]
    fn non_numeric_interval_is_invalid() {
        let err = BatchRequest::from_form("grp1", "t1", "hi", "soon").unwrap_err();
        assert_eq!(err, ValidationError::InvalidInterval("soon".into()));
        assert_eq!(err.to_string(), "Invalid time interval");
    }

    #[test]
    fn snapshot_records_counts_without_credentials() -> Result<(), Box<dyn std::error::Error>> {
        let run_id = RunId::new();
        let snapshot = request(2).validate()?.snapshot(run_id);
        assert_eq!(snapshot.total_messages, 3);
        assert_eq!(snapshot.credential_count, 2);

        let json = serde_json::to_string(&snapshot)?;
        assert!(!json.contains("t1"));
        Ok(())
    }
}

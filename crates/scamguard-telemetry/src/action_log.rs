//! Action log
//!
//! Append-only JSON-lines record of what the pipeline did: adopted
//! examples, deletions, alerts, corrections and classifier failures.
//! Recording never blocks the caller; a background thread owns the file.

use chrono::{DateTime, Utc};
use scamguard_core::{Label, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Something the pipeline did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEvent {
    /// An example was written to the learned partition
    Adopt {
        message_id: Option<String>,
        label: Label,
        weight: f64,
        correction: bool,
    },

    /// A message was deleted
    Delete {
        channel_id: String,
        message_id: String,
        author_id: String,
    },

    /// Deletion was attempted and failed
    DeleteFailed {
        channel_id: String,
        message_id: String,
        error: String,
    },

    /// A moderator alert was posted
    Alert {
        channel_id: String,
        message_id: String,
        confidence: f64,
    },

    /// A moderator corrected a decision
    Correction {
        action: String,
        channel_id: String,
        message_id: String,
        moderator_id: String,
    },

    /// The classifier failed and the fallback heuristic was used
    ClassifierError {
        message_id: String,
        backend: String,
        error: String,
    },
}

impl ActionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Adopt { .. } => "adopt",
            Self::Delete { .. } => "delete",
            Self::DeleteFailed { .. } => "delete_failed",
            Self::Alert { .. } => "alert",
            Self::Correction { .. } => "correction",
            Self::ClassifierError { .. } => "classifier_error",
        }
    }
}

/// One persisted line of the action log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique event ID
    pub id: String,

    /// When the action happened
    pub t: DateTime<Utc>,

    #[serde(flatten)]
    pub event: ActionEvent,
}

impl ActionRecord {
    pub fn new(event: ActionEvent) -> Self {
        Self {
            id: format!("act_{}", uuid::Uuid::new_v4()),
            t: Utc::now(),
            event,
        }
    }
}

/// Commands sent to the background writer
enum LogCommand {
    Record(Box<ActionRecord>),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the action log
pub struct ActionLog {
    sender: Option<mpsc::UnboundedSender<LogCommand>>,
    path: Option<PathBuf>,
}

impl ActionLog {
    /// Open (creating if needed) the log file and start the writer thread
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("scamguard-action-log".into())
            .spawn(move || run_writer(BufWriter::new(file), receiver))?;

        info!(path = %path.display(), "Action log started");

        Ok(Self {
            sender: Some(sender),
            path: Some(path),
        })
    }

    /// A log that discards every event
    pub fn disabled() -> Self {
        Self {
            sender: None,
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an event without waiting for it to hit the disk
    pub fn record(&self, event: ActionEvent) {
        let Some(sender) = &self.sender else {
            return;
        };

        debug!(kind = event.kind(), "Recording action");
        if let Err(e) = sender.send(LogCommand::Record(Box::new(ActionRecord::new(event)))) {
            warn!("Failed to send action log event: {}", e);
        }
    }

    /// Wait until every event recorded so far is written out
    pub async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };

        let (ack, done) = oneshot::channel();
        if sender.send(LogCommand::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Read every well-formed record from a log file
    pub fn read(path: impl AsRef<Path>) -> Result<Vec<ActionRecord>> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => debug!("Failed to parse action record: {}", e),
            }
        }

        Ok(records)
    }
}

impl Drop for ActionLog {
    fn drop(&mut self) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(LogCommand::Shutdown);
        }
    }
}

/// Background writer loop
fn run_writer(mut writer: BufWriter<File>, mut receiver: mpsc::UnboundedReceiver<LogCommand>) {
    while let Some(cmd) = receiver.blocking_recv() {
        match cmd {
            LogCommand::Record(record) => {
                let written = serde_json::to_string(record.as_ref())
                    .map_err(std::io::Error::from)
                    .and_then(|line| writeln!(writer, "{}", line))
                    .and_then(|_| writer.flush());
                if let Err(e) = written {
                    error!("Failed to write action record: {}", e);
                }
            }
            LogCommand::Flush(ack) => {
                if let Err(e) = writer.flush() {
                    error!("Failed to flush action log: {}", e);
                }
                let _ = ack.send(());
            }
            LogCommand::Shutdown => {
                debug!("Action log writer shutting down");
                let _ = writer.flush();
                break;
            }
        }
    }
}

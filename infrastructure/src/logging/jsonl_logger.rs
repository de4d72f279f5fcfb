//! JSONL transcripts of council conversations.
//!
//! One file per [`Conversation`], opened for append so every turn of the
//! conversation lands in the same transcript. The file starts with a
//! `transcript_start` header; every later line is one deliberation event:
//!
//! ```text
//! {"type":"transcript_start","conversation_id":"...","created_at":"...","seq":0,...}
//! {"type":"round_start","round":1,"phase":"divergent","conversation_id":"...","seq":1,...}
//! ```
//!
//! Lines are buffered and flushed at checkpoints (a completed round or the
//! end of a turn), so an interrupted turn loses at most its open round.

use council_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use council_domain::Conversation;
use serde_json::{Map, Value, json};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Writer state guarded by the logger's mutex
struct Transcript {
    out: BufWriter<File>,
    /// Sequence number of the next record
    seq: u64,
}

impl Transcript {
    fn write_record(&mut self, record: Value) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.seq += 1;
        Ok(())
    }
}

/// JSONL transcript for one conversation.
pub struct JsonlConversationLogger {
    conversation_id: Uuid,
    transcript: Mutex<Transcript>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open the transcript of `conversation` inside `dir`.
    ///
    /// The file is named `<created_at>-<conversation id>.jsonl`, so reopening
    /// the same conversation appends to its existing transcript. Returns
    /// `None` when the directory or file cannot be created.
    pub fn for_conversation(dir: impl AsRef<Path>, conversation: &Conversation) -> Option<Self> {
        let name = format!(
            "{}-{}.jsonl",
            conversation.created_at.format("%Y%m%dT%H%M%SZ"),
            conversation.id
        );
        let path = dir.as_ref().join(name);

        match Self::open(&path, conversation) {
            Ok(logger) => Some(logger),
            Err(e) => {
                warn!("Could not open transcript {}: {}", path.display(), e);
                None
            }
        }
    }

    fn open(path: &Path, conversation: &Conversation) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let existing = existing_records(path);
        let mut transcript = Transcript {
            out: BufWriter::new(file),
            seq: existing,
        };

        if existing == 0 {
            transcript.write_record(json!({
                "type": "transcript_start",
                "timestamp": now(),
                "conversation_id": conversation.id,
                "created_at": conversation.created_at,
                "seq": 0,
            }))?;
            transcript.out.flush()?;
        } else {
            debug!(
                "Appending to transcript {} after {} records",
                path.display(),
                existing
            );
        }

        Ok(Self {
            conversation_id: conversation.id,
            transcript: Mutex::new(transcript),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: ConversationEvent, seq: u64) -> Value {
        let mut record = match event.payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        record.insert("type".to_string(), Value::from(event.event_type));
        record.insert("timestamp".to_string(), Value::from(now()));
        record.insert(
            "conversation_id".to_string(),
            Value::from(self.conversation_id.to_string()),
        );
        record.insert("seq".to_string(), Value::from(seq));
        Value::Object(record)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Ok(mut transcript) = self.transcript.lock() else {
            return;
        };

        let checkpoint = event.checkpoint;
        let record = self.record(event, transcript.seq);
        if let Err(e) = transcript.write_record(record) {
            warn!("Transcript write failed for {}: {}", self.path.display(), e);
            return;
        }
        if checkpoint && let Err(e) = transcript.out.flush() {
            warn!("Transcript flush failed for {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut transcript) = self.transcript.lock() {
            let _ = transcript.out.flush();
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Number of lines already in the transcript (0 for a new file).
fn existing_records(path: &Path) -> u64 {
    std::fs::read_to_string(path)
        .map(|text| text.lines().filter(|l| !l.trim().is_empty()).count() as u64)
        .unwrap_or(0)
}

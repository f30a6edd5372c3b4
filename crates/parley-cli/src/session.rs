//! Session persistence: saving and loading conversations

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use parley_ai::{Message, Role};

/// Current persisted schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Persisted form of one session. `messages` is authoritative;
/// `rendered_transcript` is a display cache and is never read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub schema_version: u32,
    /// RFC 3339 save timestamp
    pub saved_at: String,
    pub model: String,
    pub web_search_enabled: bool,
    pub session_name: Option<String>,
    pub rendered_transcript: String,
    pub messages: Vec<Message>,
}

impl SessionRecord {
    /// Build a record from live state, regenerating the transcript cache
    pub fn new(
        messages: Vec<Message>,
        model: impl Into<String>,
        web_search_enabled: bool,
        session_name: Option<String>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            model: model.into(),
            web_search_enabled,
            session_name,
            rendered_transcript: render_transcript(&messages),
            messages,
        }
    }
}

/// Errors when loading a session. Distinguishes a missing record from a
/// found-but-corrupt one; the caller decides what to do about either.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a saved session for listings
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub saved_at: String,
    pub model: String,
    pub session_name: Option<String>,
    pub message_count: usize,
}

impl SessionInfo {
    /// Format the save timestamp for display
    pub fn saved_at_display(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.saved_at)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

/// Stores session records as one JSON file each
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at the platform data directory
    pub fn new() -> Self {
        Self {
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("parley")
                .join("sessions"),
        }
    }

    /// Store rooted at an explicit directory (used by tests)
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Generate a fresh session id
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persist a record under `id`
    pub fn save(&self, id: &str, record: &SessionRecord) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.path_for(id), json)
    }

    /// Load a record. `NotFound` and `Corrupt` are distinct outcomes; the
    /// store never substitutes a fresh session on its own.
    pub fn load(&self, id: &str) -> Result<SessionRecord, LoadError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(LoadError::NotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let record: SessionRecord = serde_json::from_str(&content)?;
        Ok(record)
    }

    /// List saved sessions, newest first
    pub fn list(&self) -> std::io::Result<Vec<SessionInfo>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Unreadable or corrupt files are skipped in listings; load()
            // is where corruption is surfaced.
            if let Ok(record) = self.load(id) {
                sessions.push(SessionInfo {
                    id: id.to_string(),
                    saved_at: record.saved_at,
                    model: record.model,
                    session_name: record.session_name,
                    message_count: record.messages.len(),
                });
            }
        }

        sessions.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(sessions)
    }

    /// Delete a saved session
    pub fn delete(&self, id: &str) -> std::io::Result<()> {
        fs::remove_file(self.path_for(id))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the display-cache transcript in `You:`/`Bot:` form
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        let label = match msg.role {
            Role::System => continue,
            Role::User => "You",
            Role::Assistant => "Bot",
        };
        out.push_str(label);
        out.push_str(": ");
        out.push_str(&msg.text());
        out.push_str("\n\n");
    }
    out
}

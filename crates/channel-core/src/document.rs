//! Multi-session documents
//!
//! Channel documents (update pushes and persisted registries alike) are
//! session descriptions concatenated with `--` boundary lines. Lines
//! starting with `#` are comments.

use chrono::{DateTime, Utc};

use crate::registry::ChannelRegistry;
use crate::render::render_channel;

/// Marker line written between sessions
pub const SESSION_BOUNDARY: &str = "--";

/// Split a document into session texts. CRLF and LF endings are both
/// accepted; sessions that are empty after dropping comments are skipped.
pub fn split_sessions(document: &str) -> Vec<String> {
    let mut sessions = Vec::new();
    let mut current = String::new();

    for line in document.lines() {
        if line.starts_with(SESSION_BOUNDARY) {
            flush(&mut current, &mut sessions);
        } else if !line.starts_with('#') {
            current.push_str(line);
            current.push('\n');
        }
    }
    flush(&mut current, &mut sessions);
    sessions
}

fn flush(current: &mut String, sessions: &mut Vec<String>) {
    if !current.trim().is_empty() {
        sessions.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Render every resident channel of a registry as one document
pub fn render_document(registry: &ChannelRegistry, generated: DateTime<Utc>) -> String {
    let mut out = format!(
        "# channel configuration generated {} ({} channels)\n",
        generated.to_rfc3339(),
        registry.len()
    );
    for (index, (_, channel)) in registry.channels().enumerate() {
        if index > 0 {
            out.push_str(SESSION_BOUNDARY);
            out.push('\n');
        }
        out.push_str(&render_channel(channel).replace("\r\n", "\n"));
    }
    out
}

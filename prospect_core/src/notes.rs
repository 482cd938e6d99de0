//! Agency-shared notes, keyed by address.
//!
//! Building-level knowledge survives agent handoffs, so notes are scoped to
//! the agency, not the author. Append-only: pinned entries carry durable
//! information (access codes, concierge hours), the rest is a chronological
//! log.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AgencyId, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub agency: AgencyId,
    pub target: Option<TargetId>,
    pub address: String,
    pub content: String,
    pub tags: Option<String>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

/// What a caller supplies when adding a note.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub address: String,
    pub content: String,
    pub target: Option<TargetId>,
    pub tags: Option<String>,
    pub pinned: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("note content is empty")]
    EmptyContent,
}

/// Append-only note storage across all agencies a process has loaded.
#[derive(Debug, Default)]
pub struct NoteBook {
    notes: Vec<Note>,
    next_id: u64,
}

impl NoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        agency: AgencyId,
        draft: NoteDraft,
        now: DateTime<Utc>,
    ) -> Result<&Note, NoteError> {
        let content = draft.content.trim().to_string();
        if content.is_empty() {
            return Err(NoteError::EmptyContent);
        }
        self.next_id += 1;
        self.notes.push(Note {
            id: NoteId(self.next_id),
            agency,
            target: draft.target,
            address: draft.address.trim().to_string(),
            content,
            tags: draft.tags,
            pinned: draft.pinned,
            created_at: now,
        });
        // just pushed, cannot be empty
        Ok(self.notes.last().expect("note was just appended"))
    }

    /// Notes for one address within one agency: pinned first, then newest
    /// first within each group.
    pub fn for_address(&self, agency: AgencyId, address: &str) -> Vec<&Note> {
        let wanted = address.trim();
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| n.agency == agency && n.address == wanted)
            .collect();
        notes.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.created_at.cmp(&a.created_at))
        });
        notes
    }

    pub fn for_target(&self, agency: AgencyId, target: TargetId) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| n.agency == agency && n.target == Some(target))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-03-01T09:00:00Z".parse().unwrap()
    }

    fn draft(address: &str, content: &str, pinned: bool) -> NoteDraft {
        NoteDraft {
            address: address.to_string(),
            content: content.to_string(),
            target: None,
            tags: None,
            pinned,
        }
    }

    #[test]
    fn empty_content_is_rejected() {
        let mut book = NoteBook::new();
        assert_eq!(
            book.add(AgencyId(1), draft("12 rue des Lilas", "   ", false), now()),
            Err(NoteError::EmptyContent)
        );
        assert!(book.is_empty());
    }

    #[test]
    fn pinned_notes_come_first_then_newest() {
        let mut book = NoteBook::new();
        let address = "12 rue des Lilas";
        book.add(AgencyId(1), draft(address, "old log", false), now())
            .unwrap();
        book.add(
            AgencyId(1),
            draft(address, "new log", false),
            now() + Duration::hours(2),
        )
        .unwrap();
        book.add(
            AgencyId(1),
            draft(address, "code 4512B", true),
            now() + Duration::hours(1),
        )
        .unwrap();

        let contents: Vec<&str> = book
            .for_address(AgencyId(1), address)
            .iter()
            .map(|n| n.content.as_str())
            .collect();
        assert_eq!(contents, vec!["code 4512B", "new log", "old log"]);
    }

    #[test]
    fn notes_are_scoped_per_agency() {
        let mut book = NoteBook::new();
        let address = "12 rue des Lilas";
        book.add(AgencyId(1), draft(address, "ours", false), now())
            .unwrap();
        book.add(AgencyId(2), draft(address, "theirs", false), now())
            .unwrap();

        assert_eq!(book.for_address(AgencyId(1), address).len(), 1);
        assert_eq!(book.for_address(AgencyId(2), address).len(), 1);
    }

    #[test]
    fn address_matching_trims_whitespace() {
        let mut book = NoteBook::new();
        book.add(AgencyId(1), draft("  12 rue des Lilas ", "note", false), now())
            .unwrap();
        assert_eq!(book.for_address(AgencyId(1), "12 rue des Lilas").len(), 1);
    }

    #[test]
    fn target_link_is_optional() {
        let mut book = NoteBook::new();
        let mut linked = draft("12 rue des Lilas", "door on the left", false);
        linked.target = Some(TargetId(7));
        book.add(AgencyId(1), linked, now()).unwrap();
        book.add(AgencyId(1), draft("12 rue des Lilas", "unlinked", false), now())
            .unwrap();

        assert_eq!(book.for_target(AgencyId(1), TargetId(7)).len(), 1);
    }
}

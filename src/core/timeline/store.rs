use super::note::{Note, NoteId};

/// Notes older than this (relative to now) are dropped on every tick.
pub const RETENTION_MS: i64 = 5_000;

/// Result of feeding an authoritative note into the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// No optimistic counterpart; inserted fresh.
    Inserted,
    /// Replaced the optimistic entry `retired`, carrying its played flag.
    Merged { retired: NoteId, played: bool },
    /// The id was already known; fields updated, played flag kept.
    Refreshed,
}

/// Reconciled collection of optimistic and confirmed notes.
///
/// Kept in insertion order; lookups are linear, which stays cheap because
/// [`NoteStore::prune`] bounds the store to the retention window. Not
/// synchronized: drive it from one execution context.
#[derive(Debug, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        self.notes.iter_mut()
    }

    fn position(&self, id: &NoteId) -> Option<usize> {
        self.notes.iter().position(|n| &n.id == id)
    }

    /// Insert a locally created note. Only provisional ids are accepted.
    pub fn upsert_local(&mut self, note: Note) -> bool {
        if !note.is_optimistic() {
            log::warn!("refusing local insert of confirmed note {}", note.id);
            return false;
        }
        match self.position(&note.id) {
            Some(idx) => self.notes[idx] = note,
            None => self.notes.push(note),
        }
        true
    }

    /// Insert an authoritative note, retiring the first optimistic entry with
    /// the same timestamp.
    ///
    /// Matching is by equal `x` alone, so two distinct local notes placed in
    /// the same millisecond can be merged into one. This mirrors the
    /// collaboration layer's echo, which carries no local correlation id.
    pub fn upsert_remote(&mut self, mut note: Note) -> Upsert {
        if note.is_optimistic() {
            log::warn!("remote note {} carries a provisional id, storing locally", note.id);
            self.upsert_local(note);
            return Upsert::Inserted;
        }

        if let Some(idx) = self.position(&note.id) {
            let existing = &mut self.notes[idx];
            existing.x = note.x;
            existing.y = note.y;
            existing.waveform = note.waveform;
            return Upsert::Refreshed;
        }

        let matched = self
            .notes
            .iter()
            .position(|n| n.is_optimistic() && n.x == note.x);

        match matched {
            Some(idx) => {
                let optimistic = self.notes.remove(idx);
                note.inherit_played(optimistic.played());
                if note.color.is_none() {
                    note.color = optimistic.color;
                }
                let played = note.played();
                log::debug!("reconciled {} -> {} (played: {})", optimistic.id, note.id, played);
                self.notes.push(note);
                Upsert::Merged { retired: optimistic.id, played }
            },
            None => {
                self.notes.push(note);
                Upsert::Inserted
            },
        }
    }

    /// Drop every note with `x < now - RETENTION_MS`. Returns how many went.
    pub fn prune(&mut self, now: i64) -> usize {
        let cutoff = now - RETENTION_MS;
        let before = self.notes.len();
        self.notes.retain(|n| n.x >= cutoff);
        before - self.notes.len()
    }

    /// Ids of optimistic entries still waiting for their confirmation.
    pub fn pending_optimistic(&self) -> Vec<NoteId> {
        self.notes
            .iter()
            .filter(|n| n.is_optimistic())
            .map(|n| n.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::oscillator::Waveform;

    fn local(seq: u64, x: i64) -> Note {
        Note::optimistic(seq, x, 0.0, Waveform::Sine, "#ccc")
    }

    #[test]
    fn remote_echo_replaces_optimistic_entry() {
        let mut store = NoteStore::new();
        store.upsert_local(local(0, 10_000));
        assert_eq!(store.len(), 1);

        let outcome = store.upsert_remote(Note::confirmed("7", 10_000, 3.0, Waveform::Square));
        assert_eq!(
            outcome,
            Upsert::Merged { retired: NoteId::Provisional { x: 10_000, seq: 0 }, played: false }
        );
        assert_eq!(store.len(), 1);
        let note = store.get(&NoteId::Confirmed("7".into())).unwrap();
        assert!(!note.is_optimistic());
        assert_eq!(note.color.as_deref(), Some("#ccc"));
    }

    #[test]
    fn merge_carries_played_flag() {
        let mut store = NoteStore::new();
        let mut note = local(0, 500);
        note.mark_played();
        store.upsert_local(note);

        store.upsert_remote(Note::confirmed("a", 500, 0.0, Waveform::Sine));
        assert!(store.get(&NoteId::Confirmed("a".into())).unwrap().played());
    }

    #[test]
    fn unmatched_remote_is_inserted() {
        let mut store = NoteStore::new();
        store.upsert_local(local(0, 500));
        assert_eq!(store.upsert_remote(Note::confirmed("b", 501, 0.0, Waveform::Sine)), Upsert::Inserted);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn repeated_remote_keeps_played() {
        let mut store = NoteStore::new();
        store.upsert_remote(Note::confirmed("c", 100, 0.0, Waveform::Sine));
        for note in store.iter_mut() {
            note.mark_played();
        }
        assert_eq!(store.upsert_remote(Note::confirmed("c", 100, 1.0, Waveform::Sine)), Upsert::Refreshed);
        assert_eq!(store.len(), 1);
        assert!(store.iter().all(|n| n.played()));
    }

    #[test]
    fn same_millisecond_notes_merge_into_one() {
        // Known limitation: two local notes at the same x are indistinguishable.
        let mut store = NoteStore::new();
        store.upsert_local(local(0, 900));
        store.upsert_local(local(1, 900));
        store.upsert_remote(Note::confirmed("d", 900, 0.0, Waveform::Sine));
        assert_eq!(store.len(), 2);
        assert_eq!(store.pending_optimistic(), vec![NoteId::Provisional { x: 900, seq: 1 }]);
    }

    #[test]
    fn local_insert_rejects_confirmed_ids() {
        let mut store = NoteStore::new();
        assert!(!store.upsert_local(Note::confirmed("e", 0, 0.0, Waveform::Sine)));
        assert!(store.is_empty());
    }

    #[test]
    fn prune_ignores_state_and_origin() {
        let now = 100_000;
        let mut store = NoteStore::new();
        let mut played = Note::confirmed("old-played", now - 5_001, 0.0, Waveform::Sine);
        played.mark_played();
        store.upsert_remote(played);
        store.upsert_remote(Note::confirmed("old", now - 6_000, 0.0, Waveform::Sine));
        store.upsert_local(local(0, now - 5_500));
        store.upsert_remote(Note::confirmed("edge", now - 5_000, 0.0, Waveform::Sine));
        store.upsert_local(local(1, now + 200));

        assert_eq!(store.prune(now), 3);
        let left: Vec<String> = store.iter().map(|n| n.id.to_string()).collect();
        assert_eq!(left, vec!["edge".to_string(), format!("temp-{}-1", now + 200)]);
    }
}

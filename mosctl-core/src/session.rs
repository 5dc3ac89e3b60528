//! Per-participant rating session
//!
//! Accumulates one participant's ratings while they work through the form,
//! then hands the result to [`crate::Store::submit`] as a single document.
//! Each form session owns its own `RatingSession`; nothing is shared.

use std::collections::HashMap;

use crate::models::{EvaluationDocument, RatingEntry, SampleCategory};

/// Identifies one rating slot: a model's rendition of one reference sample
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RatingKey {
    pub sample_type: SampleCategory,
    pub sample_index: u32,
    pub model_id: String,
}

impl RatingKey {
    pub fn of(entry: &RatingEntry) -> Self {
        Self {
            sample_type: entry.sample_type,
            sample_index: entry.sample_index,
            model_id: entry.model_id.clone(),
        }
    }
}

/// In-progress ratings for one participant, in first-rated order.
#[derive(Debug, Default, Clone)]
pub struct RatingSession {
    entries: Vec<RatingEntry>,
    positions: HashMap<RatingKey, usize>,
}

impl RatingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rating. Re-rating a slot replaces the earlier entry in place.
    ///
    /// Returns the replaced entry, if any.
    pub fn record(&mut self, entry: RatingEntry) -> Option<RatingEntry> {
        let key = RatingKey::of(&entry);
        match self.positions.get(&key) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx], entry)),
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, key: &RatingKey) -> Option<&RatingEntry> {
        self.positions.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RatingEntry] {
        &self.entries
    }

    /// Finish the session and produce the document to persist.
    pub fn into_document(self) -> EvaluationDocument {
        EvaluationDocument::new(self.entries)
    }
}

impl FromIterator<RatingEntry> for RatingSession {
    fn from_iter<I: IntoIterator<Item = RatingEntry>>(iter: I) -> Self {
        let mut session = Self::new();
        for entry in iter {
            session.record(entry);
        }
        session
    }
}

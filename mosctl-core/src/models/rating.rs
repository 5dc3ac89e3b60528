//! Rating entries and the evaluation document that embeds them
//!
//! The document is stored as a single JSONB value per participant:
//! `{ "ratings": [ { "sample_type": ..., "rating": 4, ... }, ... ] }`.
//! Entry order is meaningful and preserved through storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Longest model code the legacy schema accepted (`VARCHAR(10)`)
const MAX_MODEL_ID_LEN: usize = 10;

/// Opinion score on the 1-5 absolute category rating scale.
///
/// Out-of-range values are rejected on construction and on deserialization,
/// so a stored document can only ever hold valid scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::OutOfRange {
                field: "rating",
                value,
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
            })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Label shown next to the score on the rating scale.
    pub fn label(self) -> &'static str {
        match self.0 {
            5 => "Excellent",
            4 => "Good",
            3 => "Fair",
            2 => "Poor",
            _ => "Bad",
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        i64::from(rating.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Language cohort a reference sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleCategory {
    Sunda,
    Indonesian,
}

impl SampleCategory {
    pub const ALL: [SampleCategory; 2] = [SampleCategory::Sunda, SampleCategory::Indonesian];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunda => "sunda",
            Self::Indonesian => "indonesian",
        }
    }
}

impl fmt::Display for SampleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunda" => Ok(Self::Sunda),
            "indonesian" => Ok(Self::Indonesian),
            other => Err(ValidationError::InvalidVariant {
                field: "sample_type",
                value: other.to_owned(),
            }),
        }
    }
}

/// One (sample, model) score embedded in an evaluation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub sample_type: SampleCategory,
    /// Position within the category's fixed sample list
    pub sample_index: u32,
    pub model_id: String,
    pub model_name: String,
    pub rating: Rating,
    /// Audio artifact that was rated (not owned by this system)
    pub audio_path: Option<String>,
    /// Reference transcript, copied at rating time
    pub original_text: Option<String>,
}

impl RatingEntry {
    /// Check the fields the type system cannot.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model_id.trim().is_empty() {
            return Err(ValidationError::Empty { field: "model_id" });
        }
        if self.model_id.chars().count() > MAX_MODEL_ID_LEN {
            return Err(ValidationError::TooLong {
                field: "model_id",
                max: MAX_MODEL_ID_LEN,
            });
        }
        if self.model_name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "model_name" });
        }
        Ok(())
    }
}

/// All ratings one participant submitted, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationDocument {
    pub ratings: Vec<RatingEntry>,
}

impl EvaluationDocument {
    pub fn new(ratings: Vec<RatingEntry>) -> Self {
        Self { ratings }
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// A submitted document must carry at least one valid entry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ratings.is_empty() {
            return Err(ValidationError::Empty { field: "ratings" });
        }
        self.ratings.iter().try_for_each(RatingEntry::validate)
    }
}

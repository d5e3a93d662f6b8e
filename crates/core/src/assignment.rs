//! Assignment model - one subject the user is currently studying.

use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::id::ItemId;
use crate::Time;

/// Kind of subject an assignment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Radical
    Radical,
    /// Kanji
    Kanji,
    /// Vocabulary
    Vocabulary,
    /// Kana-only vocabulary
    KanaVocabulary,
}

/// Position of an item in the spaced-repetition ladder.
///
/// The discriminants match the stage numbers used by the learning API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SrsStage {
    /// Unlocked, lesson not taken yet
    #[default]
    Initiate = 0,
    /// Apprentice I
    Apprentice1 = 1,
    /// Apprentice II
    Apprentice2 = 2,
    /// Apprentice III
    Apprentice3 = 3,
    /// Apprentice IV
    Apprentice4 = 4,
    /// Guru I
    Guru1 = 5,
    /// Guru II
    Guru2 = 6,
    /// Master
    Master = 7,
    /// Enlightened
    Enlightened = 8,
    /// Burned
    Burned = 9,
}

impl SrsStage {
    /// Look up a stage by its API number.
    pub fn from_index(index: u8) -> Option<Self> {
        Some(match index {
            0 => Self::Initiate,
            1 => Self::Apprentice1,
            2 => Self::Apprentice2,
            3 => Self::Apprentice3,
            4 => Self::Apprentice4,
            5 => Self::Guru1,
            6 => Self::Guru2,
            7 => Self::Master,
            8 => Self::Enlightened,
            9 => Self::Burned,
            _ => return None,
        })
    }

    /// API stage number.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The stage a correct answer moves the item to. Burned stays burned.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(Self::Burned)
    }

    /// Whether the item counts as passed (Guru or above).
    pub fn is_passed(self) -> bool {
        self >= Self::Guru1
    }
}

/// A subject the user is studying, as cached from the learning API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Subject this assignment tracks
    pub subject_id: ItemId,

    /// Subject kind
    pub kind: SubjectKind,

    /// Curriculum level the subject belongs to
    pub level: u32,

    /// Current SRS stage
    #[serde(default)]
    pub srs_stage: SrsStage,

    /// When the subject was unlocked; `None` while still locked
    #[serde(default)]
    pub unlocked_at: Option<Time>,

    /// When the next review becomes available
    #[serde(default)]
    pub available_at: Option<Time>,

    /// When the subject reached the target stage
    #[serde(default)]
    pub completed_at: Option<Time>,
}

impl Assignment {
    /// Create a locked assignment.
    pub fn new(subject_id: impl Into<ItemId>, kind: SubjectKind, level: u32) -> Self {
        Self {
            subject_id: subject_id.into(),
            kind,
            level,
            srs_stage: SrsStage::Initiate,
            unlocked_at: None,
            available_at: None,
            completed_at: None,
        }
    }

    /// Set the SRS stage.
    pub fn with_stage(mut self, stage: SrsStage) -> Self {
        self.srs_stage = stage;
        self
    }

    /// Mark as unlocked at `at`.
    pub fn with_unlocked_at(mut self, at: Time) -> Self {
        self.unlocked_at = Some(at);
        self
    }

    /// Set the next review time.
    pub fn with_available_at(mut self, at: Time) -> Self {
        self.available_at = Some(at);
        self
    }

    /// Mark as completed at `at`.
    pub fn with_completed_at(mut self, at: Time) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Whether the subject is still locked.
    pub fn is_locked(&self) -> bool {
        self.unlocked_at.is_none()
    }

    /// Whether the subject is unlocked but its lesson has not been taken.
    pub fn is_lesson_stage(&self) -> bool {
        !self.is_locked() && self.srs_stage == SrsStage::Initiate
    }

    /// Check the date invariants: a completion time requires an unlock time
    /// no later than it.
    pub fn validate(&self) -> Result<()> {
        match (self.unlocked_at, self.completed_at) {
            (None, Some(_)) => Err(CoreError::MalformedAssignment {
                subject_id: self.subject_id,
                reason: "completed but never unlocked".to_string(),
            }),
            (Some(unlocked), Some(completed)) if completed < unlocked => {
                Err(CoreError::MalformedAssignment {
                    subject_id: self.subject_id,
                    reason: format!("completed at {completed} before unlock at {unlocked}"),
                })
            }
            _ => Ok(()),
        }
    }
}

//! Completion time estimation.

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shiori_core::{Assignment, CoreError, SrsStage, SubjectKind, Time};
use tracing::debug;
use crate::schedule::{review_date, GuruDateProjector, MinimumLevelDuration, PassDateProjector};

/// Share of the slowest projected items ignored when picking the cohort's
/// completion date.
pub const OUTLIER_FRACTION: f64 = 0.1;

/// When the cohort is projected to reach the target stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectedCompletion {
    /// Derived from every item's own dates.
    Known(Time),
    /// Derived from the historical level pace because part of the cohort is
    /// still locked.
    Estimated(Time),
}

impl ProjectedCompletion {
    /// The projected date.
    pub fn date(&self) -> Time {
        match self {
            Self::Known(date) | Self::Estimated(date) => *date,
        }
    }

    /// Whether the date is a heuristic estimate.
    pub fn is_estimate(&self) -> bool {
        matches!(self, Self::Estimated(_))
    }
}

type Eligibility = Arc<dyn Fn(&Assignment) -> bool + Send + Sync>;

/// Completion time estimator.
///
/// Stateless apart from its configuration; share it freely between threads.
#[derive(Clone)]
pub struct TimeEstimator {
    eligible: Eligibility,
    projector: Arc<dyn PassDateProjector>,
}

impl TimeEstimator {
    /// Estimator counting kanji only, projecting Guru dates.
    pub fn new() -> Self {
        Self {
            eligible: Arc::new(|a: &Assignment| a.kind == SubjectKind::Kanji),
            projector: Arc::new(GuruDateProjector),
        }
    }

    /// Replace the eligibility predicate.
    pub fn with_filter(mut self, eligible: impl Fn(&Assignment) -> bool + Send + Sync + 'static) -> Self {
        self.eligible = Arc::new(eligible);
        self
    }

    /// Count only assignments of `kind`.
    pub fn with_kind(self, kind: SubjectKind) -> Self {
        self.with_filter(move |a| a.kind == kind)
    }

    /// Replace the per-item projection.
    pub fn with_projector(mut self, projector: impl PassDateProjector + 'static) -> Self {
        self.projector = Arc::new(projector);
        self
    }

    /// Project when the eligible assignments will all have reached the
    /// target stage.
    ///
    /// A single locked assignment makes the cohort's date unknowable, so the
    /// result becomes `now + max(average_level_duration, minimum)` where
    /// `minimum` is the fastest a fresh item on that level could get there.
    /// Otherwise each item is projected, the most distant 10% (by count,
    /// rounded down) are dropped and the latest remaining date is returned.
    ///
    /// Returns `None` when no eligible assignment could be projected. Input
    /// is trusted; see [`TimeEstimator::estimate_checked`].
    pub fn estimate<'a, I, M>(
        &self,
        assignments: I,
        average_level_duration: Duration,
        minimum: &M,
        now: Time,
    ) -> Option<ProjectedCompletion>
    where
        I: IntoIterator<Item = &'a Assignment>,
        M: MinimumLevelDuration + ?Sized,
    {
        let mut dates = Vec::new();

        for assignment in assignments {
            if !(self.eligible)(assignment) {
                continue;
            }

            if assignment.is_locked() {
                let floor = minimum.minimum_duration(assignment.level, SrsStage::Apprentice1);
                let remaining = average_level_duration.max(floor);
                debug!(
                    subject_id = %assignment.subject_id,
                    remaining_secs = remaining.num_seconds(),
                    "locked item in cohort, using level pace"
                );
                return Some(ProjectedCompletion::Estimated(now + remaining));
            }

            match self.projector.project(assignment, now) {
                Some(date) => dates.push(date),
                None => debug!(subject_id = %assignment.subject_id, "no projection for item"),
            }
        }

        trim_outliers(&mut dates);
        dates.last().copied().map(ProjectedCompletion::Known)
    }

    /// Earliest upcoming review that can move the level forward.
    ///
    /// Eligible assignments count once their lesson is done. Radicals count
    /// as well while a locked eligible item survives the outlier trim, since
    /// passing them is what unlocks it. Returns `None` when no such review is
    /// scheduled.
    pub fn next_level_up_review<'a, I>(&self, assignments: I, now: Time) -> Option<Time>
    where
        I: IntoIterator<Item = &'a Assignment>,
    {
        let assignments: Vec<&Assignment> = assignments.into_iter().collect();

        let mut dates: Vec<Time> = assignments
            .iter()
            .copied()
            .filter(|a| (self.eligible)(*a))
            .filter_map(|a| {
                if a.is_locked() {
                    Some(DateTime::<Utc>::MAX_UTC)
                } else {
                    self.projector.project(a, now)
                }
            })
            .collect();
        trim_outliers(&mut dates);
        let cohort_unlocked = dates.last().map_or(true, |d| *d != DateTime::<Utc>::MAX_UTC);

        let next = assignments
            .iter()
            .copied()
            .filter(|a| (self.eligible)(*a) || (!cohort_unlocked && a.kind == SubjectKind::Radical))
            .filter(|a| !a.is_lesson_stage())
            .filter_map(|a| review_date(a, now))
            .min();
        debug!(cohort_unlocked, next = ?next, "next level-up review");
        next
    }

    /// Like [`TimeEstimator::estimate`], but rejects eligible assignments
    /// whose dates contradict each other.
    pub fn estimate_checked<'a, I, M>(
        &self,
        assignments: I,
        average_level_duration: Duration,
        minimum: &M,
        now: Time,
    ) -> Result<Option<ProjectedCompletion>, CoreError>
    where
        I: IntoIterator<Item = &'a Assignment>,
        M: MinimumLevelDuration + ?Sized,
    {
        let cohort: Vec<&Assignment> = assignments
            .into_iter()
            .filter(|a| (self.eligible)(*a))
            .collect();
        for assignment in &cohort {
            assignment.validate()?;
        }
        Ok(self.estimate(cohort, average_level_duration, minimum, now))
    }
}

/// Sort `dates` and drop the most distant 10% (by count, rounded down).
fn trim_outliers(dates: &mut Vec<Time>) {
    dates.sort();
    let outliers = (dates.len() as f64 * OUTLIER_FRACTION) as usize;
    dates.truncate(dates.len() - outliers);
}

impl Default for TimeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimeEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeEstimator").finish_non_exhaustive()
    }
}

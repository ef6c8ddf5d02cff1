use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{VocabStatus, VocabularyItem};

// Review spacing in days, indexed by the consecutive-correct streak.
pub const REVIEW_INTERVALS_DAYS: [i64; 5] = [1, 3, 7, 14, 30];

const PROMOTE_MIN_SEEN: u32 = 5;
const PROMOTE_MIN_CORRECT: u32 = 3;
const PROMOTE_MIN_IN_CONTEXT: u32 = 2;
const DEMOTE_AFTER_FAILURES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: VocabStatus,
    pub to: VocabStatus,
}

// One graded interaction with a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub correct: bool,
    // Answered while reading the passage the word appeared in.
    pub in_context: bool,
}

pub fn review_interval(streak: u32) -> Duration {
    let index = (streak as usize).min(REVIEW_INTERVALS_DAYS.len() - 1);
    Duration::days(REVIEW_INTERVALS_DAYS[index])
}

// The word showed up again in a new passage. Status is left alone.
pub fn record_sighting(item: &mut VocabularyItem, now: DateTime<Utc>) {
    item.seen_count += 1;
    item.last_seen_at = now;
}

pub fn ready_for_known(item: &VocabularyItem) -> bool {
    item.seen_count >= PROMOTE_MIN_SEEN
        && item.tested_correct_count >= PROMOTE_MIN_CORRECT
        && item.correct_in_context_count >= PROMOTE_MIN_IN_CONTEXT
}

// Applies a test result and returns the status change it caused, if any.
pub fn record_test(
    item: &mut VocabularyItem,
    outcome: ReviewOutcome,
    now: DateTime<Utc>,
) -> Option<Transition> {
    let from = item.status;
    item.tested_count += 1;
    item.last_tested_at = Some(now);

    if item.status == VocabStatus::New {
        item.status = VocabStatus::Learning;
    }

    if outcome.correct {
        item.tested_correct_count += 1;
        if outcome.in_context {
            item.correct_in_context_count += 1;
        }
        item.streak += 1;
        item.consecutive_failures = 0;
        apply_success(item, now);
    } else {
        item.streak = 0;
        item.consecutive_failures += 1;
        apply_failure(item, now);
    }

    (item.status != from).then_some(Transition {
        from,
        to: item.status,
    })
}

fn apply_success(item: &mut VocabularyItem, now: DateTime<Utc>) {
    match item.status {
        VocabStatus::New | VocabStatus::Learning => {
            if ready_for_known(item) {
                item.status = VocabStatus::Known;
                // spaced reviews count from the promotion onwards
                item.streak = 0;
                item.next_review_at = Some(now + review_interval(0));
            }
        }
        VocabStatus::Known => {
            if item.streak as usize >= REVIEW_INTERVALS_DAYS.len() {
                item.status = VocabStatus::Mastered;
                item.next_review_at = None;
            } else {
                item.next_review_at = Some(now + review_interval(item.streak));
            }
        }
        VocabStatus::Mastered => {}
    }
}

fn apply_failure(item: &mut VocabularyItem, now: DateTime<Utc>) {
    match item.status {
        VocabStatus::New | VocabStatus::Learning => {}
        VocabStatus::Known => {
            if item.consecutive_failures >= DEMOTE_AFTER_FAILURES {
                item.status = VocabStatus::Learning;
                item.consecutive_failures = 0;
                item.next_review_at = None;
            } else {
                item.next_review_at = Some(now + review_interval(0));
            }
        }
        VocabStatus::Mastered => {
            item.status = VocabStatus::Known;
            item.consecutive_failures = 0;
            item.next_review_at = Some(now + review_interval(0));
        }
    }
}

// Manual status change requested by the learner.
pub fn set_status(
    item: &mut VocabularyItem,
    status: VocabStatus,
    now: DateTime<Utc>,
) -> Option<Transition> {
    let from = item.status;
    if from == status {
        return None;
    }

    item.status = status;
    item.streak = 0;
    item.consecutive_failures = 0;
    item.next_review_at = match status {
        VocabStatus::Known => Some(now + review_interval(0)),
        VocabStatus::New | VocabStatus::Learning | VocabStatus::Mastered => None,
    };

    Some(Transition { from, to: status })
}

//! Surveys: a question, at least two options and one vote row per
//! `(survey, user, option)`.
//!
//! Which of a voter's requested options become new votes is decided by
//! [`plan_votes`], which backends call inside the same unit of work that
//! inserts the rows and bumps the counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  idea::normalize_text,
};

pub const MAX_QUESTION_LEN: usize = 500;
pub const MAX_OPTION_LEN: usize = 200;
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
  pub survey_id:            Uuid,
  pub creator_id:           Uuid,
  pub question:             String,
  pub description:          Option<String>,
  /// Closed surveys accept no further votes.
  pub is_active:            bool,
  pub is_anonymous:         bool,
  pub allow_multiple_votes: bool,
  /// Always equal to the number of vote rows for this survey.
  pub total_votes:          u32,
  pub created_at:           DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyOption {
  pub option_id:     Uuid,
  pub survey_id:     Uuid,
  pub option_text:   String,
  /// Always equal to the number of vote rows for this option.
  pub vote_count:    u32,
  pub display_order: u32,
}

/// Input to [`crate::store::EngagementStore::create_survey`]; already
/// validated.
#[derive(Debug, Clone)]
pub struct NewSurvey {
  pub creator_id:           Uuid,
  pub question:             String,
  pub description:          Option<String>,
  pub options:              Vec<String>,
  pub is_anonymous:         bool,
  pub allow_multiple_votes: bool,
}

/// A survey as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyView {
  pub survey:           Survey,
  /// Ordered by `display_order`.
  pub options:          Vec<SurveyOption>,
  pub voted_option_ids: Vec<Uuid>,
}

/// Why a vote was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRejection {
  Closed,
  /// A single-choice survey the voter has already voted on.
  AlreadyVoted,
  /// More than one option requested on a single-choice survey.
  SingleChoice,
  /// The option does not belong to the survey.
  UnknownOption(Uuid),
}

/// Trim and bound the option texts of a new survey.
pub fn normalize_options(options: &[String]) -> Result<Vec<String>> {
  if options.len() < MIN_OPTIONS {
    return Err(Error::Validation(format!(
      "a survey needs at least {MIN_OPTIONS} options"
    )));
  }
  options
    .iter()
    .map(|o| normalize_text("option", o, MAX_OPTION_LEN))
    .collect()
}

/// The options from `requested` that must be inserted as new votes.
///
/// `options` are the survey's option ids and `existing` the ones the voter
/// already voted for. Options already voted for are skipped, so repeating a
/// vote on a multiple-choice survey is a no-op.
pub fn plan_votes(
  survey: &Survey,
  options: &[Uuid],
  existing: &[Uuid],
  requested: &[Uuid],
) -> Result<Vec<Uuid>, VoteRejection> {
  if !survey.is_active {
    return Err(VoteRejection::Closed);
  }

  let mut fresh: Vec<Uuid> = Vec::with_capacity(requested.len());
  for id in requested {
    if !options.contains(id) {
      return Err(VoteRejection::UnknownOption(*id));
    }
    if !fresh.contains(id) {
      fresh.push(*id);
    }
  }

  if !survey.allow_multiple_votes {
    if !existing.is_empty() {
      return Err(VoteRejection::AlreadyVoted);
    }
    if fresh.len() > 1 {
      return Err(VoteRejection::SingleChoice);
    }
  }

  fresh.retain(|id| !existing.contains(id));
  Ok(fresh)
}

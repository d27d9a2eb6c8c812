//! Picks the search result that most likely is the requested song.
//!
//! Each candidate gets an integer score from cheap lexical checks on its title,
//! channel and description, plus a bonus or penalty for how close its running
//! time is to the expected one. The highest score wins and ties go to the
//! candidate the search provider ranked first.

use serde::{Deserialize, Serialize};

use super::types::{Candidate, SongQuery};

/// Score contributions. Defaults are the empirically tuned values the service
/// has always shipped with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub title_and_artist: i32,
    pub title_only: i32,
    pub artist_only: i32,
    pub official: i32,
    pub audio: i32,
    pub live_penalty: i32,
    pub remix_penalty: i32,
    pub cover_penalty: i32,
    pub duration_close: i32,
    pub duration_near: i32,
    pub duration_far_penalty: i32,
    pub channel_is_artist: i32,
    /// Differences strictly below this many seconds count as close.
    pub close_within_secs: u64,
    /// Differences strictly below this many seconds count as near.
    pub near_within_secs: u64,
    /// Differences strictly above this many seconds are penalized.
    pub far_beyond_secs: u64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title_and_artist: 10,
            title_only: 5,
            artist_only: 3,
            official: 3,
            audio: 2,
            live_penalty: -5,
            remix_penalty: -3,
            cover_penalty: -3,
            duration_close: 5,
            duration_near: 3,
            duration_far_penalty: -5,
            channel_is_artist: 5,
            close_within_secs: 10,
            near_within_secs: 30,
            far_beyond_secs: 120,
        }
    }
}

/// A candidate together with the score it received.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub score: i32,
    pub candidate: &'a Candidate,
}

/// Terms that mark an alternate version of a song. They are penalized unless
/// the requested title asks for them.
const VERSION_MARKERS: &[&str] = &["live", "remix", "cover"];

/// Parse `M:SS` or `H:MM:SS` into seconds.
///
/// Any other shape, or a component that is not a non-negative integer,
/// yields `None`.
pub fn parse_timecode(text: &str) -> Option<u64> {
    let parts = text
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [minutes, seconds] => minutes.checked_mul(60)?.checked_add(*seconds),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(*seconds),
        _ => None,
    }
}

/// The forms in which callers may express an expected duration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

impl DurationInput {
    /// Normalize to whole seconds. Zero, negative and unparseable values mean
    /// there is no target duration.
    pub fn to_seconds(&self) -> Option<u64> {
        let seconds = match self {
            DurationInput::Seconds(secs) => u64::try_from(*secs).ok()?,
            DurationInput::Fractional(secs) if secs.is_finite() && *secs >= 1.0 => {
                secs.trunc() as u64
            }
            DurationInput::Fractional(_) => return None,
            DurationInput::Text(text) if text.contains(':') => parse_timecode(text)?,
            DurationInput::Text(text) => text.trim().parse::<u64>().ok()?,
        };
        (seconds > 0).then_some(seconds)
    }

    /// Lenient conversion from an arbitrary JSON value; anything that isn't a
    /// number or string is treated as absent rather than as an error.
    pub fn from_json(value: &serde_json::Value) -> Option<u64> {
        DurationInput::deserialize(value)
            .ok()
            .and_then(|input| input.to_seconds())
    }
}

/// Lower-cased query terms, computed once per scoring call.
struct NormalizedQuery<'q> {
    title: String,
    artist: String,
    duration_secs: Option<u64>,
    weights: &'q ScoringWeights,
}

impl<'q> NormalizedQuery<'q> {
    fn new(query: &SongQuery, weights: &'q ScoringWeights) -> Self {
        Self {
            title: query.title.to_lowercase(),
            artist: query.artist.to_lowercase(),
            duration_secs: query.duration_secs,
            weights,
        }
    }

    fn score(&self, candidate: &Candidate) -> i32 {
        let w = self.weights;
        let title = candidate.title.to_lowercase();
        let mut score = 0;

        let has_title = title.contains(&self.title);
        let has_artist = title.contains(&self.artist);
        score += match (has_title, has_artist) {
            (true, true) => w.title_and_artist,
            (true, false) => w.title_only,
            (false, true) => w.artist_only,
            (false, false) => 0,
        };

        let description_official = candidate
            .description_snippet
            .as_deref()
            .is_some_and(|snippet| snippet.to_lowercase().contains("official"));
        if title.contains("official") || description_official {
            score += w.official;
        }

        if title.contains("audio") {
            score += w.audio;
        }

        for marker in VERSION_MARKERS {
            if title.contains(marker) && !self.title.contains(marker) {
                score += match *marker {
                    "live" => w.live_penalty,
                    "remix" => w.remix_penalty,
                    _ => w.cover_penalty,
                };
            }
        }

        if let Some(target) = self.duration_secs
            && let Some(actual) = candidate.duration_text.as_deref().and_then(parse_timecode)
        {
            let diff = actual.abs_diff(target);
            if diff < w.close_within_secs {
                score += w.duration_close;
            } else if diff < w.near_within_secs {
                score += w.duration_near;
            } else if diff > w.far_beyond_secs {
                score += w.duration_far_penalty;
            }
        }

        if candidate
            .channel_name
            .as_deref()
            .is_some_and(|channel| channel.to_lowercase() == self.artist)
        {
            score += w.channel_is_artist;
        }

        score
    }
}

/// Score a single candidate against the query.
pub fn score_candidate(query: &SongQuery, candidate: &Candidate, weights: &ScoringWeights) -> i32 {
    NormalizedQuery::new(query, weights).score(candidate)
}

/// Score every candidate, best first. Equal scores keep their input order.
pub fn rank_candidates<'a>(
    query: &SongQuery,
    candidates: &'a [Candidate],
    weights: &ScoringWeights,
) -> Vec<ScoredCandidate<'a>> {
    let mut scored: Vec<ScoredCandidate<'a>> = candidates
        .iter()
        .map(|candidate| ScoredCandidate {
            score: score_candidate(query, candidate, weights),
            candidate,
        })
        .collect();

    // `sort_by` is stable, so the provider's order decides ties.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Return the highest scoring candidate, or `None` when there are none.
pub fn select_best_match<'a>(
    query: &SongQuery,
    candidates: &'a [Candidate],
    weights: &ScoringWeights,
) -> Option<&'a Candidate> {
    let ranked = rank_candidates(query, candidates, weights);
    if tracing::enabled!(tracing::Level::DEBUG) {
        let top: Vec<(&str, i32)> = ranked
            .iter()
            .take(3)
            .map(|scored| (scored.candidate.id.as_str(), scored.score))
            .collect();
        tracing::debug!(
            "Top scores of {} candidates for '{}' by '{}': {:?}",
            ranked.len(),
            query.title,
            query.artist,
            top
        );
    }
    ranked.into_iter().next().map(|scored| scored.candidate)
}

//! Score normalization for raw vision-model output
//!
//! The external model is asked for a JSON object with an overall score,
//! a five-category breakdown, and per-category suggestions — but what
//! actually comes back may be partial, mistyped, or out of band. This
//! module turns any such blob into a well-formed [`AnalysisResult`]:
//! every sub-score clamped into its category band, every suggestion
//! non-empty, and the breakdown reconciled to sum exactly to the total.
//!
//! [`normalize`] is a pure function: identical input always yields
//! identical output, and it never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scoring categories, in the fixed order used for reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreCategory {
    /// Face harmony: symmetry, features, expressions (0-25 points)
    Face,
    /// Hair & beard: style, grooming, suitability (0-25 points)
    Hair,
    /// Skin: complexion, texture, care (0-20 points)
    Skin,
    /// Style: clothing choices, fit, coordination (0-20 points)
    Style,
    /// Body: posture, proportions, presentation (0-20 points)
    Body,
}

impl ScoreCategory {
    /// All categories in reconciliation order
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Face,
        ScoreCategory::Hair,
        ScoreCategory::Skin,
        ScoreCategory::Style,
        ScoreCategory::Body,
    ];

    /// Upper bound of the category's score band (lower bound is 0)
    pub fn band_max(self) -> u32 {
        match self {
            ScoreCategory::Face | ScoreCategory::Hair => 25,
            ScoreCategory::Skin | ScoreCategory::Style | ScoreCategory::Body => 20,
        }
    }

    /// Default sub-score substituted when the model omits the category
    pub fn default_mid(self) -> u32 {
        match self {
            ScoreCategory::Face | ScoreCategory::Hair => 15,
            ScoreCategory::Skin | ScoreCategory::Style | ScoreCategory::Body => 12,
        }
    }

    /// Suggestion text substituted when the model omits the category
    pub fn fallback_suggestion(self) -> &'static str {
        match self {
            ScoreCategory::Face => {
                "Consider different angles and lighting to showcase your features."
            }
            ScoreCategory::Hair => "A fresh haircut or beard trim could enhance your look.",
            ScoreCategory::Skin => "A basic skincare routine could improve your complexion.",
            ScoreCategory::Style => "Experiment with different clothing styles and fits.",
            ScoreCategory::Body => "Good posture can significantly improve your appearance.",
        }
    }

    /// JSON field name for this category
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreCategory::Face => "face",
            ScoreCategory::Hair => "hair",
            ScoreCategory::Skin => "skin",
            ScoreCategory::Style => "style",
            ScoreCategory::Body => "body",
        }
    }
}

/// Default overall score substituted when the model omits it
pub const DEFAULT_SCORE: u32 = 70;

/// Loosely-typed analysis data plucked from the model's JSON output
///
/// Every field is optional; extraction never fails. Missing, mistyped,
/// or empty fields are simply absent and get defaulted by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnalysis {
    /// Overall score, if the model supplied a numeric one
    pub score: Option<f64>,
    /// Per-category sub-scores, in [`ScoreCategory::ALL`] order
    pub breakdown: [Option<f64>; 5],
    /// Per-category suggestions, in [`ScoreCategory::ALL`] order
    pub suggestions: [Option<String>; 5],
}

impl RawAnalysis {
    /// Pluck analysis fields out of an arbitrary JSON value
    ///
    /// Accepts anything: `{}`, `null`, arrays, or a well-formed response.
    /// Only numeric sub-scores and non-blank string suggestions are kept.
    pub fn from_value(value: &Value) -> Self {
        let mut raw = RawAnalysis {
            score: value.get("score").and_then(Value::as_f64),
            ..Default::default()
        };

        for (slot, category) in ScoreCategory::ALL.iter().enumerate() {
            raw.breakdown[slot] = value
                .get("breakdown")
                .and_then(|b| b.get(category.as_str()))
                .and_then(Value::as_f64);

            raw.suggestions[slot] = value
                .get("suggestions")
                .and_then(|s| s.get(category.as_str()))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }

        raw
    }

    /// Sub-score for one category, if present
    pub fn sub_score(&self, category: ScoreCategory) -> Option<f64> {
        self.breakdown[category as usize]
    }

    /// Suggestion for one category, if present and non-blank
    pub fn suggestion(&self, category: ScoreCategory) -> Option<&str> {
        self.suggestions[category as usize].as_deref()
    }
}

/// Per-category sub-scores; serializes to the client wire shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub face: u32,
    pub hair: u32,
    pub skin: u32,
    pub style: u32,
    pub body: u32,
}

impl ScoreBreakdown {
    /// Sub-score for one category
    pub fn get(&self, category: ScoreCategory) -> u32 {
        match category {
            ScoreCategory::Face => self.face,
            ScoreCategory::Hair => self.hair,
            ScoreCategory::Skin => self.skin,
            ScoreCategory::Style => self.style,
            ScoreCategory::Body => self.body,
        }
    }

    fn get_mut(&mut self, category: ScoreCategory) -> &mut u32 {
        match category {
            ScoreCategory::Face => &mut self.face,
            ScoreCategory::Hair => &mut self.hair,
            ScoreCategory::Skin => &mut self.skin,
            ScoreCategory::Style => &mut self.style,
            ScoreCategory::Body => &mut self.body,
        }
    }

    /// Sum of all sub-scores
    pub fn total(&self) -> u32 {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Per-category suggestion texts; always non-empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub face: String,
    pub hair: String,
    pub skin: String,
    pub style: String,
    pub body: String,
}

impl Suggestions {
    /// Suggestion for one category
    pub fn get(&self, category: ScoreCategory) -> &str {
        match category {
            ScoreCategory::Face => &self.face,
            ScoreCategory::Hair => &self.hair,
            ScoreCategory::Skin => &self.skin,
            ScoreCategory::Style => &self.style,
            ScoreCategory::Body => &self.body,
        }
    }
}

/// A fully-normalized analysis result
///
/// Invariants: `0 <= score <= 100`, every sub-score within its category
/// band, and `breakdown.total() == score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub suggestions: Suggestions,
}

/// Normalize raw model output into a well-formed [`AnalysisResult`]
///
/// 1. Clamp the overall score into 0..=100 (default 70).
/// 2. Clamp each sub-score into its band, defaulting missing ones.
/// 3. Substitute fallback text for missing suggestions.
/// 4. Reconcile: walk categories in fixed order, wrapping past the end,
///    moving one point at a time until the breakdown sums to the score.
///    Categories pinned at a band edge are skipped; since the bands
///    jointly span 0..=110, every score in 0..=100 reconciles exactly.
pub fn normalize(raw: &RawAnalysis) -> AnalysisResult {
    let score = clamp_round(raw.score, DEFAULT_SCORE, 100);

    let mut breakdown = ScoreBreakdown {
        face: 0,
        hair: 0,
        skin: 0,
        style: 0,
        body: 0,
    };
    for category in ScoreCategory::ALL {
        *breakdown.get_mut(category) = clamp_round(
            raw.sub_score(category),
            category.default_mid(),
            category.band_max(),
        );
    }

    reconcile(&mut breakdown, score);

    let suggestions = Suggestions {
        face: owned_suggestion(raw, ScoreCategory::Face),
        hair: owned_suggestion(raw, ScoreCategory::Hair),
        skin: owned_suggestion(raw, ScoreCategory::Skin),
        style: owned_suggestion(raw, ScoreCategory::Style),
        body: owned_suggestion(raw, ScoreCategory::Body),
    };

    AnalysisResult {
        score,
        breakdown,
        suggestions,
    }
}

/// Round a raw value and clamp into 0..=max, substituting a default when absent
fn clamp_round(value: Option<f64>, default: u32, max: u32) -> u32 {
    match value {
        Some(v) if v.is_finite() => (v.round() as i64).clamp(0, max as i64) as u32,
        _ => default,
    }
}

fn owned_suggestion(raw: &RawAnalysis, category: ScoreCategory) -> String {
    raw.suggestion(category)
        .unwrap_or_else(|| category.fallback_suggestion())
        .to_string()
}

/// Adjust sub-scores one point at a time until they sum to `score`
fn reconcile(breakdown: &mut ScoreBreakdown, score: u32) {
    let mut delta = score as i64 - breakdown.total() as i64;
    let mut idx = 0usize;
    // Stops after a full fruitless cycle; unreachable for score <= 100
    // since the bands jointly span 0..=110, but guards the loop anyway.
    let mut stalled = 0usize;

    while delta != 0 && stalled < ScoreCategory::ALL.len() {
        let category = ScoreCategory::ALL[idx % ScoreCategory::ALL.len()];
        let value = breakdown.get_mut(category);

        if delta > 0 && *value < category.band_max() {
            *value += 1;
            delta -= 1;
            stalled = 0;
        } else if delta < 0 && *value > 0 {
            *value -= 1;
            delta += 1;
            stalled = 0;
        } else {
            stalled += 1;
        }

        idx += 1;
    }
}

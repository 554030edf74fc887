//! Request and response types

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    /// Period format accepted by every endpoint.
    static ref PERIOD_RE: Regex = Regex::new(r"^\d{4}-\d{2}$").unwrap();
}

/// Largest ranking that can be requested.
pub const MAX_TOP_N: usize = 2000;

fn default_top_n() -> usize {
    10
}

/// Query string of the ranking endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct RankingQuery {
    /// Period in `YYYY-MM` format
    #[validate(regex(path = "PERIOD_RE", message = "periodo must have the format YYYY-MM"))]
    pub periodo: String,
    /// Number of products to return
    #[serde(default = "default_top_n")]
    #[validate(range(min = 1, max = 2000, message = "top_n must be between 1 and 2000"))]
    pub top_n: usize,
}

/// Query string of the cause map endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct PeriodQuery {
    /// Period in `YYYY-MM` format
    #[validate(regex(path = "PERIOD_RE", message = "periodo must have the format YYYY-MM"))]
    pub periodo: String,
}

/// Query string of the evidence endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct EvidenceQuery {
    /// Period in `YYYY-MM` format
    #[validate(regex(path = "PERIOD_RE", message = "periodo must have the format YYYY-MM"))]
    pub periodo: String,
    /// Cause label to filter on
    #[validate(length(min = 1, message = "causa must not be empty"))]
    pub causa: String,
}

/// Cause labels known to the cause map, in canonical order.
#[derive(Clone, Debug, PartialEq)]
pub struct CauseLabels(Vec<String>);

impl CauseLabels {
    /// Create the label set. Empty and duplicate labels are dropped.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for label in labels.into_iter().map(Into::into) {
            let label = label.trim().to_string();
            if !label.is_empty() && !unique.contains(&label) {
                unique.push(label);
            }
        }
        Self(unique)
    }

    /// Returns true if the label is known.
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|known| known == label)
    }

    /// Labels in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// One product of the monthly risk ranking
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RankingItem {
    pub asin: String,
    pub dt: String,
    pub risk_rank: i64,
    pub n_reviews: i64,
    pub n_neg: i64,
    pub pct_neg: f64,
    /// Absent when the product has no negative reviews
    pub avg_prob_neg: Option<f64>,
}

/// Count of negative reviews for one cause
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CauseCount {
    pub causa: String,
    pub conteo: i64,
}

/// Causes of negative reviews for a product and period, most frequent first
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CauseMap {
    pub asin: String,
    pub periodo: String,
    pub mapa_causas: Vec<CauseCount>,
}

/// A negative review backing a cause
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EvidenceItem {
    pub review_id: String,
    #[serde(rename = "overall")]
    pub rating: i64,
    #[serde(rename = "reviewText")]
    pub review_text: String,
}

/// Liveness response
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct Status {
    pub status: String,
    pub message: String,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            message: "API de Riesgo de Devoluciones V1".to_string(),
        }
    }
}

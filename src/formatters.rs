//! Conversion of dataset rows into API records.

use crate::error::DatasetError;
use crate::models::{CauseCount, CauseLabels, EvidenceItem, RankingItem};
use crate::storage::PARTITION_KEY;
use crate::table::Row;
use crate::types::Value;

pub const ASIN: &str = "asin";
pub const CAUSE: &str = "cause";
pub const RATING: &str = "overall";
pub const REVIEW_ID: &str = "review_id";
pub const REVIEW_TEXT: &str = "reviewText";
pub const RISK_RANK: &str = "risk_rank";

impl TryFrom<&Row> for RankingItem {
    type Error = DatasetError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(RankingItem {
            asin: row.get(ASIN)?,
            dt: row.get(PARTITION_KEY)?,
            risk_rank: row.get(RISK_RANK)?,
            n_reviews: row.get("n_reviews")?,
            n_neg: row.get("n_neg")?,
            pct_neg: row.get("pct_neg")?,
            avg_prob_neg: row.get_opt("avg_prob_neg")?,
        })
    }
}

impl TryFrom<&Row> for EvidenceItem {
    type Error = DatasetError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(EvidenceItem {
            review_id: row.get(REVIEW_ID)?,
            rating: row.get(RATING)?,
            review_text: row.get(REVIEW_TEXT)?,
        })
    }
}

/// Read a cause count. Missing, null and NaN counts are zero; float counts are truncated.
fn cause_count(row: &Row, label: &str) -> Result<i64, DatasetError> {
    match row.value(label) {
        None => Ok(0),
        Some(value) if value.is_null() => Ok(0),
        Some(Value::Int(count)) => Ok(*count),
        Some(Value::Float(count)) => Ok(count.trunc() as i64),
        Some(_) => Err(DatasetError::ColumnType {
            column: label.to_string(),
            expected: "number",
        }),
    }
}

/// Pivot a wide cause row (one count column per label) into positive counts, largest first.
///
/// Equal counts keep the canonical label order.
///
/// # Arguments
///
/// * `row`: Row holding one count column per label
/// * `labels`: Known cause labels in canonical order
pub fn pivot_causes(row: &Row, labels: &CauseLabels) -> Result<Vec<CauseCount>, DatasetError> {
    let mut counts = Vec::new();
    for label in labels.iter() {
        let count = cause_count(row, label)?;
        if count > 0 {
            counts.push(CauseCount {
                causa: label.to_string(),
                conteo: count,
            });
        }
    }
    counts.sort_by(|a, b| b.conteo.cmp(&a.conteo));
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> CauseLabels {
        CauseLabels::new(["no_funciona", "no_compatible", "baja_calidad"])
    }

    fn row(values: Vec<(&str, Value)>) -> Row {
        values.into_iter().collect()
    }

    fn count(causa: &str, conteo: i64) -> CauseCount {
        CauseCount {
            causa: causa.to_string(),
            conteo,
        }
    }

    #[test]
    fn pivot_drops_zero_and_sorts() {
        let row = row(vec![
            ("asin", Value::from("B001")),
            ("no_funciona", Value::Int(5)),
            ("no_compatible", Value::Int(0)),
            ("baja_calidad", Value::Int(2)),
        ]);
        assert_eq!(
            vec![count("no_funciona", 5), count("baja_calidad", 2)],
            pivot_causes(&row, &labels()).unwrap()
        );
    }

    #[test]
    fn pivot_ties_keep_canonical_order() {
        let row = row(vec![
            ("no_funciona", Value::Int(1)),
            ("no_compatible", Value::Int(3)),
            ("baja_calidad", Value::Int(3)),
        ]);
        assert_eq!(
            vec![
                count("no_compatible", 3),
                count("baja_calidad", 3),
                count("no_funciona", 1)
            ],
            pivot_causes(&row, &labels()).unwrap()
        );
    }

    #[test]
    fn pivot_missing_null_and_float_counts() {
        let row = row(vec![
            ("no_funciona", Value::Float(f64::NAN)),
            ("baja_calidad", Value::Float(4.0)),
        ]);
        assert_eq!(
            vec![count("baja_calidad", 4)],
            pivot_causes(&row, &labels()).unwrap()
        );
    }

    #[test]
    fn pivot_negative_counts_excluded() {
        let row = row(vec![("no_funciona", Value::Int(-1))]);
        assert!(pivot_causes(&row, &labels()).unwrap().is_empty());
    }

    #[test]
    fn pivot_non_numeric_count() {
        let row = row(vec![("no_funciona", Value::from("many"))]);
        assert!(matches!(
            pivot_causes(&row, &labels()),
            Err(DatasetError::ColumnType { .. })
        ));
    }

    #[test]
    fn pivot_uses_injected_labels() {
        let row = row(vec![("no_funciona", Value::Int(5)), ("ruido", Value::Int(9))]);
        let labels = CauseLabels::new(["ruido"]);
        assert_eq!(vec![count("ruido", 9)], pivot_causes(&row, &labels).unwrap());
    }

    #[test]
    fn ranking_item_from_row() {
        let row = row(vec![
            ("asin", Value::from("B001")),
            ("dt", Value::from("2023-09")),
            ("risk_rank", Value::Int(1)),
            ("n_reviews", Value::Int(40)),
            ("n_neg", Value::Int(0)),
            ("pct_neg", Value::Float(0.0)),
            ("avg_prob_neg", Value::Float(f64::NAN)),
        ]);
        let item = RankingItem::try_from(&row).unwrap();
        assert_eq!("B001", item.asin);
        assert_eq!("2023-09", item.dt);
        assert_eq!(1, item.risk_rank);
        assert_eq!(None, item.avg_prob_neg);
    }

    #[test]
    fn ranking_item_missing_column() {
        let row = row(vec![("asin", Value::from("B001"))]);
        assert!(matches!(
            RankingItem::try_from(&row),
            Err(DatasetError::MissingColumn { .. })
        ));
    }

    #[test]
    fn evidence_item_from_row() {
        let row = row(vec![
            ("review_id", Value::from("r1")),
            ("asin", Value::from("B001")),
            ("cause", Value::from("no_funciona")),
            ("overall", Value::Float(1.0)),
            ("reviewText", Value::from("broke after a day")),
        ]);
        assert_eq!(
            EvidenceItem {
                review_id: "r1".to_string(),
                rating: 1,
                review_text: "broke after a day".to_string(),
            },
            EvidenceItem::try_from(&row).unwrap()
        );
    }
}

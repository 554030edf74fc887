//! KPI query functions.
//!
//! Each query reads one dataset partition and filters, sorts and caps its rows in memory. Faults
//! other than an unreachable storage backend are logged and downgraded to an empty result.

use crate::error::DatasetError;
use crate::formatters::{self, ASIN, CAUSE, RATING};
use crate::metrics;
use crate::models::{CauseLabels, CauseMap, EvidenceItem, RankingItem};
use crate::reader::{self, DatasetReader};
use crate::storage::DatasetPaths;
use crate::table::{Row, Table};

/// Most evidence items returned for one request.
pub const MAX_EVIDENCE: usize = 5;

/// Answers the three KPI queries from the configured datasets.
#[derive(Clone, Debug)]
pub struct KpiService {
    reader: DatasetReader,
    paths: DatasetPaths,
    cause_labels: CauseLabels,
}

impl KpiService {
    /// Create a service reading the given dataset paths.
    pub fn new(reader: DatasetReader, paths: DatasetPaths, cause_labels: CauseLabels) -> Self {
        Self {
            reader,
            paths,
            cause_labels,
        }
    }

    /// Cause labels known to this service.
    pub fn cause_labels(&self) -> &CauseLabels {
        &self.cause_labels
    }

    /// The `top_n` riskiest products of a period, by ascending risk rank.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub async fn ranking(
        &self,
        period: &str,
        top_n: usize,
    ) -> Result<Vec<RankingItem>, DatasetError> {
        let result = self
            .read("ranking", &self.paths.ranking, period)
            .await
            .and_then(|table| top_ranked(&table, top_n));
        let ranking = downgrade("ranking", result)?;
        if ranking.is_empty() {
            tracing::warn!("No ranking data for period {}", period);
        }
        Ok(ranking)
    }

    /// The cause map of a product for a period.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub async fn cause_map(
        &self,
        period: &str,
        asin: &str,
    ) -> Result<Option<CauseMap>, DatasetError> {
        let result = self
            .read("causes", &self.paths.causes, period)
            .await
            .and_then(|table| find_cause_map(&table, period, asin, &self.cause_labels));
        let cause_map = downgrade("causes", result)?;
        if cause_map.is_none() {
            tracing::warn!("No causes for asin {} in period {}", asin, period);
        }
        Ok(cause_map)
    }

    /// Up to [MAX_EVIDENCE] negative reviews of a product for a cause and period.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub async fn evidence(
        &self,
        period: &str,
        asin: &str,
        cause: &str,
    ) -> Result<Vec<EvidenceItem>, DatasetError> {
        let result = self
            .read("evidence", &self.paths.evidence, period)
            .await
            .and_then(|table| select_evidence(&table, asin, cause));
        let evidence = downgrade("evidence", result)?;
        if evidence.is_empty() {
            tracing::warn!("No evidence for asin {} and cause {}", asin, cause);
        }
        Ok(evidence)
    }

    /// Read a dataset partition, counting the outcome.
    async fn read(&self, dataset: &str, base: &str, period: &str) -> Result<Table, DatasetError> {
        let result = self.reader.read(base, Some(period)).await;
        let outcome = match &result {
            Ok(table) if table.is_empty() => "empty",
            Ok(_) => "ok",
            Err(_) => "error",
        };
        metrics::record_dataset_read(dataset, outcome);
        result
    }
}

/// Log a fault and replace it by an empty result, unless storage is unreachable.
fn downgrade<T: Default>(dataset: &str, result: Result<T, DatasetError>) -> Result<T, DatasetError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_unavailable() => Err(err),
        Err(err) => {
            reader::log_read_error(dataset, &err);
            Ok(T::default())
        }
    }
}

/// Returns true if a string column of the row equals the expected value.
fn str_eq(row: &Row, column: &str, expected: &str) -> Result<bool, DatasetError> {
    let value = row.value(column).ok_or_else(|| DatasetError::MissingColumn {
        column: column.to_string(),
    })?;
    Ok(value.as_str() == Some(expected))
}

/// Returns true for reviews rated 1 or 2.
fn is_negative(row: &Row) -> Result<bool, DatasetError> {
    let value = row.value(RATING).ok_or_else(|| DatasetError::MissingColumn {
        column: RATING.to_string(),
    })?;
    Ok(matches!(value.as_i64(), Some(1) | Some(2)))
}

/// Sort ranking rows by ascending risk rank and keep the first `top_n`.
pub fn top_ranked(table: &Table, top_n: usize) -> Result<Vec<RankingItem>, DatasetError> {
    let mut items = table
        .rows()
        .iter()
        .map(RankingItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    items.sort_by_key(|item| item.risk_rank);
    items.truncate(top_n);
    Ok(items)
}

/// Find the cause row of a product and pivot it into a [CauseMap].
///
/// At most one row per product is expected; if there are more, the first one wins.
pub fn find_cause_map(
    table: &Table,
    period: &str,
    asin: &str,
    labels: &CauseLabels,
) -> Result<Option<CauseMap>, DatasetError> {
    let mut matches = Vec::new();
    for row in table.rows() {
        if str_eq(row, ASIN, asin)? {
            matches.push(row);
        }
    }
    let Some(row) = matches.first() else {
        return Ok(None);
    };
    if matches.len() > 1 {
        tracing::warn!(
            "{} cause rows for asin {} in period {}, using the first",
            matches.len(),
            asin,
            period
        );
    }
    Ok(Some(CauseMap {
        asin: asin.to_string(),
        periodo: period.to_string(),
        mapa_causas: formatters::pivot_causes(row, labels)?,
    }))
}

/// Select the first [MAX_EVIDENCE] negative reviews of a product for a cause, in table order.
pub fn select_evidence(
    table: &Table,
    asin: &str,
    cause: &str,
) -> Result<Vec<EvidenceItem>, DatasetError> {
    let mut evidence = Vec::new();
    for row in table.rows() {
        if evidence.len() == MAX_EVIDENCE {
            break;
        }
        if str_eq(row, ASIN, asin)? && str_eq(row, CAUSE, cause)? && is_negative(row)? {
            evidence.push(EvidenceItem::try_from(row)?);
        }
    }
    Ok(evidence)
}

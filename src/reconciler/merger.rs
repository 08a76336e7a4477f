// src/reconciler/merger.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::types::candidate::STATUS_SELECTED;
use crate::types::CandidateRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Selected,
    Rejected,
}

impl StatusFilter {
    /// `Rejected` keeps everything that is not selected, pending rows included
    pub fn accepts(&self, row: &CandidateRow) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Selected => row.effective_status() == STATUS_SELECTED,
            StatusFilter::Rejected => row.effective_status() != STATUS_SELECTED,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "selected" => Ok(StatusFilter::Selected),
            "rejected" => Ok(StatusFilter::Rejected),
            other => anyhow::bail!("Unknown status filter: {}. Use all, selected or rejected", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CandidateId,
    JobId,
    Title,
    PostedOn,
    Status,
    Timestamp,
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "candidateid" | "candidate" => Ok(SortField::CandidateId),
            "jobid" | "job" => Ok(SortField::JobId),
            "title" => Ok(SortField::Title),
            "postedon" | "posted" => Ok(SortField::PostedOn),
            "status" => Ok(SortField::Status),
            "timestamp" => Ok(SortField::Timestamp),
            _ => anyhow::bail!("Unknown sort field: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => anyhow::bail!("Unknown sort direction: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort: Option<SortSpec>,
}

/// Updated rows first, then pending ones. The refresher already keeps the
/// two partitions disjoint, so nothing is deduplicated here.
pub fn merge_rows(updated: &[CandidateRow], pending: &[CandidateRow]) -> Vec<CandidateRow> {
    updated.iter().chain(pending.iter()).cloned().collect()
}

pub fn matches_search(row: &CandidateRow, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    row.candidate_id.to_lowercase().contains(needle)
        || row.job_id.to_string().contains(needle)
        || row.title.to_lowercase().contains(needle)
}

pub fn apply_query(rows: Vec<CandidateRow>, query: &RowQuery) -> Vec<CandidateRow> {
    let needle = query.search.trim().to_lowercase();
    let mut rows: Vec<CandidateRow> = rows
        .into_iter()
        .filter(|row| matches_search(row, &needle) && query.status.accepts(row))
        .collect();

    if let Some(spec) = query.sort {
        sort_rows(&mut rows, spec);
    }
    rows
}

/// Stable in both directions: equal keys keep their prior relative order
pub fn sort_rows(rows: &mut [CandidateRow], spec: SortSpec) {
    rows.sort_by(|a, b| {
        let ordering = compare_field(a, b, spec.field);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_field(a: &CandidateRow, b: &CandidateRow, field: SortField) -> Ordering {
    match field {
        SortField::CandidateId => a.candidate_id.cmp(&b.candidate_id),
        SortField::JobId => a.job_id.cmp(&b.job_id),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::PostedOn => compare_dates(&a.posted_on, &b.posted_on),
        SortField::Status => a.effective_status().cmp(&b.effective_status()),
        SortField::Timestamp => compare_dates(
            a.timestamp.as_deref().unwrap_or_default(),
            b.timestamp.as_deref().unwrap_or_default(),
        ),
    }
}

/// Dates compare chronologically; anything unparseable (such as "N/A")
/// sorts before every real date.
fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::candidate::STATUS_REJECTED;

    fn row(candidate_id: &str, job_id: i64, title: &str, posted_on: &str, ai_status: i64) -> CandidateRow {
        CandidateRow::baseline(
            candidate_id,
            job_id,
            ai_status,
            Some(title.to_string()),
            Some(posted_on.to_string()),
        )
    }

    fn ids(rows: &[CandidateRow]) -> Vec<&str> {
        rows.iter().map(|r| r.candidate_id.as_str()).collect()
    }

    #[test]
    fn test_merge_puts_updated_first() {
        let mut updated = row("u1", 1, "A", "2024-01-01", 0);
        updated.manual_status = Some(STATUS_REJECTED);
        updated.updated = true;
        let merged = merge_rows(&[updated], &[row("p1", 1, "A", "2024-01-01", 0)]);
        assert_eq!(ids(&merged), vec!["u1", "p1"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let rows = vec![
            row("c1", 1, "Backend Engineer", "2024-01-01", 0),
            row("c2", 2, "Frontend Dev", "2024-01-02", 0),
        ];
        let query = RowQuery {
            search: "back".to_string(),
            ..RowQuery::default()
        };
        assert_eq!(ids(&apply_query(rows.clone(), &query)), vec!["c1"]);

        let by_job = RowQuery {
            search: "2".to_string(),
            ..RowQuery::default()
        };
        assert_eq!(ids(&apply_query(rows.clone(), &by_job)), vec!["c2"]);

        let by_candidate = RowQuery {
            search: "C1".to_string(),
            ..RowQuery::default()
        };
        assert_eq!(ids(&apply_query(rows, &by_candidate)), vec!["c1"]);
    }

    #[test]
    fn test_status_filter_uses_effective_status() {
        let mut overridden = row("c1", 1, "A", "2024-01-01", STATUS_SELECTED);
        overridden.manual_status = Some(STATUS_REJECTED);
        let rows = vec![
            overridden,
            row("c2", 1, "A", "2024-01-01", STATUS_SELECTED),
            row("c3", 1, "A", "2024-01-01", 0),
        ];

        let selected = RowQuery {
            status: StatusFilter::Selected,
            ..RowQuery::default()
        };
        assert_eq!(ids(&apply_query(rows.clone(), &selected)), vec!["c2"]);

        let rejected = RowQuery {
            status: StatusFilter::Rejected,
            ..RowQuery::default()
        };
        assert_eq!(ids(&apply_query(rows.clone(), &rejected)), vec!["c1", "c3"]);

        assert_eq!(apply_query(rows, &RowQuery::default()).len(), 3);
    }

    #[test]
    fn test_posted_on_descending_is_stable() {
        let rows = vec![
            row("old", 1, "A", "2023-12-01", 0),
            row("tie-a", 2, "A", "2024-03-01", 0),
            row("none", 3, "A", "N/A", 0),
            row("newest", 4, "A", "2024-05-20", 0),
            row("tie-b", 5, "A", "2024-03-01", 0),
        ];
        let query = RowQuery {
            sort: Some(SortSpec {
                field: SortField::PostedOn,
                direction: SortDirection::Desc,
            }),
            ..RowQuery::default()
        };
        assert_eq!(
            ids(&apply_query(rows, &query)),
            vec!["newest", "tie-a", "tie-b", "old", "none"]
        );
    }

    #[test]
    fn test_sort_by_status_prefers_manual() {
        let mut manual = row("c1", 1, "A", "2024-01-01", 0);
        manual.manual_status = Some(STATUS_SELECTED);
        let mut rows = vec![manual, row("c2", 1, "A", "2024-01-01", STATUS_REJECTED)];
        sort_rows(
            &mut rows,
            SortSpec {
                field: SortField::Status,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(ids(&rows), vec!["c2", "c1"]);
    }

    #[test]
    fn test_query_parsing() {
        assert_eq!("".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("Selected".parse::<StatusFilter>().unwrap(), StatusFilter::Selected);
        assert!("maybe".parse::<StatusFilter>().is_err());
        assert_eq!("posted_on".parse::<SortField>().unwrap(), SortField::PostedOn);
        assert_eq!("postedOn".parse::<SortField>().unwrap(), SortField::PostedOn);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    }
}

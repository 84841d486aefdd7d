//! Bodies for the variant record endpoints.

use crate::timestamp;
use clinrec_core::repositories::documents::{RecordSummary, SearchHit, SearchOutcome};
use clinrec_core::search::HighlightedField;
use clinrec_core::stats::{StatsSummary, VariantShare};
use clinrec_core::{FieldMap, StoredDocument, VariantTag};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// One labelled value of a summary or highlight map, in display order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldEntry {
    pub label: String,
    pub value: String,
}

impl FieldEntry {
    pub fn from_map(map: FieldMap) -> Vec<Self> {
        map.into_iter()
            .map(|(label, value)| Self { label, value })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordSummaryRes {
    pub id: String,
    pub inserted_at: String,
    pub tag: String,
    pub title: String,
    pub summary: Vec<FieldEntry>,
    #[schema(value_type = Object)]
    pub record: Value,
}

impl From<RecordSummary> for RecordSummaryRes {
    fn from(summary: RecordSummary) -> Self {
        Self {
            id: summary.id,
            inserted_at: timestamp(summary.inserted_at),
            tag: summary.tag.to_string(),
            title: summary.title,
            summary: FieldEntry::from_map(summary.summary),
            record: summary.record,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsRes {
    pub tag: String,
    pub count: usize,
    pub records: Vec<RecordSummaryRes>,
}

impl ListRecordsRes {
    pub fn new(tag: VariantTag, records: Vec<RecordSummary>) -> Self {
        let records: Vec<RecordSummaryRes> = records.into_iter().map(Into::into).collect();
        Self {
            tag: tag.to_string(),
            count: records.len(),
            records,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InsertRecordRes {
    pub success: bool,
    pub id: String,
    pub inserted_at: String,
}

impl From<StoredDocument> for InsertRecordRes {
    fn from(doc: StoredDocument) -> Self {
        Self {
            success: true,
            id: doc.id,
            inserted_at: timestamp(doc.inserted_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HighlightEntry {
    pub label: String,
    pub value: String,
    pub is_hit: bool,
}

impl From<HighlightedField> for HighlightEntry {
    fn from(field: HighlightedField) -> Self {
        Self {
            label: field.label,
            value: field.value,
            is_hit: field.is_hit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHitRes {
    pub id: String,
    pub title: String,
    pub highlights: Vec<HighlightEntry>,
    #[schema(value_type = Object)]
    pub record: Value,
}

impl From<SearchHit> for SearchHitRes {
    fn from(hit: SearchHit) -> Self {
        Self {
            id: hit.id,
            title: hit.title,
            highlights: hit.highlights.into_iter().map(Into::into).collect(),
            record: hit.record,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchRes {
    pub tag: String,
    /// Criteria applied after blank values were dropped.
    pub criteria: BTreeMap<String, String>,
    pub total_matches: usize,
    pub count: usize,
    pub results: Vec<SearchHitRes>,
}

impl From<SearchOutcome> for SearchRes {
    fn from(outcome: SearchOutcome) -> Self {
        let results: Vec<SearchHitRes> = outcome.results.into_iter().map(Into::into).collect();
        Self {
            tag: outcome.tag.to_string(),
            criteria: outcome.criteria.into_iter().collect(),
            total_matches: outcome.total_matches,
            count: results.len(),
            results,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VariantShareRes {
    pub collection_name: String,
    pub document_count: u64,
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<VariantShare> for VariantShareRes {
    fn from(share: VariantShare) -> Self {
        Self {
            collection_name: share.collection_name,
            document_count: share.document_count,
            percentage: share.percentage,
            error: share.error,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsRes {
    pub total_documents: u64,
    /// Keyed by variant tag (`MDM`, `OUL`, `ORU`).
    pub per_variant: BTreeMap<String, VariantShareRes>,
}

impl From<StatsSummary> for StatsRes {
    fn from(summary: StatsSummary) -> Self {
        Self {
            total_documents: summary.total_documents,
            per_variant: summary
                .per_variant
                .into_iter()
                .map(|(tag, share)| (tag.to_string(), share.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinrec_core::stats::{aggregate, CollectionCount};

    #[test]
    fn field_entries_keep_display_order() {
        let mut map = FieldMap::new();
        map.push("Sex", Some("F".into()));
        map.push("Date of Birth", None);
        let entries = FieldEntry::from_map(map);
        assert_eq!(entries[0].label, "Sex");
        assert_eq!(entries[1].value, "N/A");
    }

    #[test]
    fn stats_are_keyed_by_tag() {
        let counts = BTreeMap::from([
            (VariantTag::Mdm, CollectionCount::counted("mdm_documents", 1)),
            (VariantTag::Oru, CollectionCount::failed("oru_patient_monitoring", "down")),
        ]);
        let res = StatsRes::from(aggregate(&counts));
        assert_eq!(res.per_variant["MDM"].percentage, 100.0);
        assert_eq!(res.per_variant["ORU"].error.as_deref(), Some("down"));

        let json = serde_json::to_value(&res).unwrap();
        assert!(json["per_variant"]["MDM"].get("error").is_none());
    }
}

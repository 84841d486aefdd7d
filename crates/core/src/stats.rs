//! Per-variant document counts and proportions.

use crate::variant::VariantTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count reported for one variant collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionCount {
    pub collection_name: String,
    /// Absent counts are treated as zero.
    #[serde(default)]
    pub document_count: Option<u64>,
    /// Why the count could not be fetched, if it could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionCount {
    pub fn counted(collection_name: impl Into<String>, document_count: u64) -> Self {
        Self {
            collection_name: collection_name.into(),
            document_count: Some(document_count),
            error: None,
        }
    }

    /// A failed count: zero documents, with the failure carried alongside.
    pub fn failed(collection_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            document_count: Some(0),
            error: Some(error.into()),
        }
    }
}

/// One variant's share of the total.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariantShare {
    pub collection_name: String,
    pub document_count: u64,
    /// `document_count / total * 100`, or exactly 0 when the total is 0.
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_documents: u64,
    pub per_variant: BTreeMap<VariantTag, VariantShare>,
}

impl StatsSummary {
    pub fn percentage(&self, tag: VariantTag) -> Option<f64> {
        self.per_variant.get(&tag).map(|s| s.percentage)
    }
}

/// Fold per-variant counts into a total and per-variant percentages.
pub fn aggregate(counts: &BTreeMap<VariantTag, CollectionCount>) -> StatsSummary {
    let total_documents: u64 = counts
        .values()
        .map(|c| c.document_count.unwrap_or(0))
        .sum();

    let per_variant = counts
        .iter()
        .map(|(tag, count)| {
            let document_count = count.document_count.unwrap_or(0);
            let percentage = if total_documents == 0 {
                0.0
            } else {
                document_count as f64 * 100.0 / total_documents as f64
            };
            (
                *tag,
                VariantShare {
                    collection_name: count.collection_name.clone(),
                    document_count,
                    percentage,
                    error: count.error.clone(),
                },
            )
        })
        .collect();

    StatsSummary {
        total_documents,
        per_variant,
    }
}

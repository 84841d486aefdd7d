//! Criteria-based search over converted records.
//!
//! Two distinct checks live here:
//! - [`matches`] decides membership: every criterion must be a case-insensitive substring of
//!   the highlight field it maps to. Absent fields never match.
//! - [`highlight`] decides emphasis: a displayed value is a hit if *any* criterion value occurs
//!   in it, regardless of which field the criterion was aimed at.

use crate::projection::{
    ClinicalRecord, LABEL_DOCUMENT_TYPE, LABEL_FIRST_OBSERVATION, LABEL_FIRST_TEST,
    LABEL_PATIENT_ID,
};
use crate::variant::VariantTag;
use crate::{RecordError, RecordResult};
use clinrec_types::NonEmptyText;
use serde::Serialize;
use serde_json::{Map, Value};

/// Criteria key carrying the page size rather than a search term.
pub const LIMIT_KEY: &str = "limit";

/// Criterion keys accepted for `tag`, in display order.
pub fn supported_fields(tag: VariantTag) -> &'static [&'static str] {
    match tag {
        VariantTag::Mdm => &["patient_id", "document_type"],
        VariantTag::Oul => &["patient_id", "test_name"],
        VariantTag::Oru => &["patient_id", "observation_type"],
    }
}

/// Highlight label a criterion key is matched against.
fn field_label(tag: VariantTag, key: &str) -> Option<&'static str> {
    match (tag, key) {
        (_, "patient_id") => Some(LABEL_PATIENT_ID),
        (VariantTag::Mdm, "document_type") => Some(LABEL_DOCUMENT_TYPE),
        (VariantTag::Oul, "test_name") => Some(LABEL_FIRST_TEST),
        (VariantTag::Oru, "observation_type") => Some(LABEL_FIRST_OBSERVATION),
        _ => None,
    }
}

/// One non-blank search term bound to the field it targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Criterion {
    pub field: String,
    pub label: &'static str,
    pub value: NonEmptyText,
}

/// Validated, non-empty search criteria for one variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCriteria {
    tag: VariantTag,
    terms: Vec<Criterion>,
    limit: Option<usize>,
}

impl SearchCriteria {
    /// Build criteria from `(field, value)` pairs.
    ///
    /// Blank values are dropped before anything else is checked.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`] if a non-blank criterion names a field `tag` does
    /// not support, or if no criterion is left after dropping blanks.
    pub fn from_pairs<K, V>(
        tag: VariantTag,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> RecordResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut terms = Vec::new();
        for (field, value) in pairs {
            let Ok(value) = NonEmptyText::new(value) else {
                continue;
            };
            let field = field.as_ref().trim();
            let label = field_label(tag, field).ok_or_else(|| {
                RecordError::InvalidInput(format!(
                    "unsupported search field '{field}' for {tag} (supported: {})",
                    supported_fields(tag).join(", ")
                ))
            })?;
            terms.push(Criterion {
                field: field.to_string(),
                label,
                value,
            });
        }

        if terms.is_empty() {
            return Err(RecordError::InvalidInput(
                "at least one search criterion is required".into(),
            ));
        }

        Ok(Self {
            tag,
            terms,
            limit: None,
        })
    }

    /// Build criteria from a JSON request body.
    ///
    /// String and number values are search terms, `null` counts as blank, and a `limit` key
    /// sets the page size instead of adding a term.
    ///
    /// # Errors
    ///
    /// As [`SearchCriteria::from_pairs`], plus [`RecordError::InvalidInput`] for values of any
    /// other JSON type and for a `limit` that is not a positive integer.
    pub fn from_json(tag: VariantTag, body: &Map<String, Value>) -> RecordResult<Self> {
        let mut limit = None;
        let mut pairs = Vec::with_capacity(body.len());

        for (key, value) in body {
            if key == LIMIT_KEY {
                limit = Some(parse_limit(value)?);
                continue;
            }
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(RecordError::InvalidInput(format!(
                        "search criterion '{key}' must be a string"
                    )))
                }
            };
            pairs.push((key.clone(), text));
        }

        Ok(Self::from_pairs(tag, pairs)?.with_limit(limit))
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn tag(&self) -> VariantTag {
        self.tag
    }

    pub fn terms(&self) -> &[Criterion] {
        &self.terms
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Criterion values as `field -> value`, for echoing back to callers.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.terms
            .iter()
            .map(|c| (c.field.clone(), c.value.to_string()))
            .collect()
    }
}

fn parse_limit(value: &Value) -> RecordResult<usize> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    parsed.filter(|l| *l > 0).ok_or_else(|| {
        RecordError::InvalidInput(format!("limit must be a positive integer, got {value}"))
    })
}

/// A highlight field annotated for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HighlightedField {
    pub label: String,
    pub value: String,
    pub is_hit: bool,
}

/// Whether `record` satisfies every criterion.
pub fn matches(record: &Value, criteria: &SearchCriteria) -> bool {
    let view = ClinicalRecord::new(Some(criteria.tag), record);
    criteria.terms.iter().all(|criterion| {
        view.highlight_value(criterion.label)
            .is_some_and(|value| criterion.value.is_contained_in(&value))
    })
}

/// Highlight fields of `record`, each flagged if any criterion value occurs in it.
///
/// Placeholder values are compared as displayed, so searching for `"n/a"` lights up missing
/// fields.
pub fn highlight(record: &Value, criteria: &SearchCriteria) -> Vec<HighlightedField> {
    let view = ClinicalRecord::new(Some(criteria.tag), record);
    view.highlight_fields()
        .into_iter()
        .map(|(label, value)| {
            let is_hit = criteria
                .terms
                .iter()
                .any(|c| c.value.is_contained_in(&value));
            HighlightedField {
                label,
                value,
                is_hit,
            }
        })
        .collect()
}

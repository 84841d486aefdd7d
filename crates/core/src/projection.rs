//! Display projections of converted clinical records.
//!
//! The three record variants share no schema, so each gets its own title, summary and
//! highlight rules, selected by an explicit match on the variant. Every projection is a pure
//! function of the record: nothing is cached and the record is never modified.
//!
//! Missing values render as [`NOT_AVAILABLE`]; an unrecognised variant renders a generic title
//! and empty maps, so any record the converter produced can be displayed.

use crate::constants::{NOT_AVAILABLE, UNKNOWN_VARIANT_TITLE};
use crate::value::{first_text_at, len_at, text_at};
use crate::variant::VariantTag;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

pub const LABEL_PATIENT_ID: &str = "Patient ID";
pub const LABEL_DOCUMENT_TYPE: &str = "Document Type";
pub const LABEL_ACTIVITY_DATE: &str = "Activity Date";
pub const LABEL_DOCUMENT_DATE: &str = "Document Date";
pub const LABEL_FILE_NAME: &str = "File Name";
pub const LABEL_PATIENT_CLASS: &str = "Patient Class";
pub const LABEL_SEX: &str = "Sex";
pub const LABEL_DATE_OF_BIRTH: &str = "Date of Birth";
pub const LABEL_SPECIMEN_COUNT: &str = "Specimen Count";
pub const LABEL_FIRST_SPECIMEN_TYPE: &str = "First Specimen Type";
pub const LABEL_SPECIMEN_TYPE: &str = "Specimen Type";
pub const LABEL_FIRST_TEST: &str = "First Test";
pub const LABEL_COLLECTION_DATE: &str = "Collection Date";
pub const LABEL_OBSERVATION_COUNT: &str = "Observation Count";
pub const LABEL_FIRST_OBSERVATION: &str = "First Observation";
pub const LABEL_VALUE: &str = "Value";
pub const LABEL_UNITS: &str = "Units";

const FIRST_IDENTIFIER: &str = "/patient_identification/identifiers/0/id_number";
const FAMILY_NAME: [&str; 2] = [
    "/patient_identification/name/family_name",
    "/patient_identification/name/family",
];
const GIVEN_NAME: [&str; 2] = [
    "/patient_identification/name/given_name",
    "/patient_identification/name/given",
];
const SEX: &str = "/patient_identification/administrative_sex";
const DATE_OF_BIRTH: &str = "/patient_identification/date_of_birth";
const PATIENT_CLASS: &str = "/patient_visit/patient_class";

/// Ordered label -> value mapping.
///
/// Insertion order is display order, and serialises as a JSON object in that order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `label`, rendering a missing value as [`NOT_AVAILABLE`].
    pub fn push(&mut self, label: impl Into<String>, value: Option<String>) {
        self.0
            .push((label.into(), value.unwrap_or_else(|| NOT_AVAILABLE.to_string())));
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for FieldMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// A converted record together with the variant that governs how it is read.
#[derive(Clone, Copy, Debug)]
pub enum ClinicalRecord<'a> {
    MedicalDocument(&'a Value),
    LabResult(&'a Value),
    Observation(&'a Value),
    Unrecognised(&'a Value),
}

impl<'a> ClinicalRecord<'a> {
    pub fn new(tag: Option<VariantTag>, body: &'a Value) -> Self {
        match tag {
            Some(VariantTag::Mdm) => ClinicalRecord::MedicalDocument(body),
            Some(VariantTag::Oul) => ClinicalRecord::LabResult(body),
            Some(VariantTag::Oru) => ClinicalRecord::Observation(body),
            None => ClinicalRecord::Unrecognised(body),
        }
    }

    /// Wrap `body` using a textual tag; unrecognised tags are kept displayable.
    pub fn tagged(tag: &str, body: &'a Value) -> Self {
        Self::new(VariantTag::from_message_type(tag), body)
    }

    pub fn tag(&self) -> Option<VariantTag> {
        match self {
            ClinicalRecord::MedicalDocument(_) => Some(VariantTag::Mdm),
            ClinicalRecord::LabResult(_) => Some(VariantTag::Oul),
            ClinicalRecord::Observation(_) => Some(VariantTag::Oru),
            ClinicalRecord::Unrecognised(_) => None,
        }
    }

    pub fn body(&self) -> &'a Value {
        match *self {
            ClinicalRecord::MedicalDocument(b)
            | ClinicalRecord::LabResult(b)
            | ClinicalRecord::Observation(b)
            | ClinicalRecord::Unrecognised(b) => b,
        }
    }

    /// Display title.
    pub fn title(&self) -> String {
        match *self {
            ClinicalRecord::MedicalDocument(r) | ClinicalRecord::LabResult(r) => format!(
                "{}, {}",
                or_placeholder(first_text_at(r, &FAMILY_NAME)),
                or_placeholder(first_text_at(r, &GIVEN_NAME))
            ),
            ClinicalRecord::Observation(r) => {
                format!("Patient: {}", or_placeholder(text_at(r, FIRST_IDENTIFIER)))
            }
            ClinicalRecord::Unrecognised(_) => UNKNOWN_VARIANT_TITLE.to_string(),
        }
    }

    /// Four-entry summary for listing views.
    pub fn summary(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        match *self {
            ClinicalRecord::MedicalDocument(r) => {
                fields.push(LABEL_DOCUMENT_TYPE, text_at(r, "/document_header/document_type"));
                fields.push(
                    LABEL_ACTIVITY_DATE,
                    text_at(r, "/document_header/activity_datetime"),
                );
                fields.push(LABEL_PATIENT_CLASS, text_at(r, PATIENT_CLASS));
                fields.push(LABEL_SEX, text_at(r, SEX));
            }
            ClinicalRecord::LabResult(r) => {
                fields.push(
                    LABEL_SPECIMEN_COUNT,
                    Some(len_at(r, "/specimens").to_string()),
                );
                fields.push(
                    LABEL_FIRST_SPECIMEN_TYPE,
                    text_at(r, "/specimens/0/specimen_type/text"),
                );
                fields.push(
                    LABEL_COLLECTION_DATE,
                    text_at(r, "/specimens/0/collection_datetime"),
                );
                fields.push(LABEL_SEX, text_at(r, SEX));
            }
            ClinicalRecord::Observation(r) => {
                fields.push(
                    LABEL_OBSERVATION_COUNT,
                    Some(len_at(r, "/observation_report/0/observations").to_string()),
                );
                fields.push(LABEL_PATIENT_CLASS, text_at(r, PATIENT_CLASS));
                fields.push(LABEL_SEX, text_at(r, SEX));
                fields.push(LABEL_DATE_OF_BIRTH, text_at(r, DATE_OF_BIRTH));
            }
            ClinicalRecord::Unrecognised(_) => {}
        }
        fields
    }

    /// The values users search by, rendered for display.
    pub fn highlight_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        for (label, value) in self.highlight_values() {
            fields.push(label, value);
        }
        fields
    }

    /// Highlight values before placeholder rendering; `None` means absent.
    pub(crate) fn highlight_values(&self) -> Vec<(&'static str, Option<String>)> {
        match *self {
            ClinicalRecord::MedicalDocument(r) => vec![
                (LABEL_PATIENT_ID, text_at(r, FIRST_IDENTIFIER)),
                (LABEL_DOCUMENT_TYPE, text_at(r, "/document_header/document_type")),
                (
                    LABEL_DOCUMENT_DATE,
                    text_at(r, "/document_header/activity_datetime"),
                ),
                (
                    LABEL_FILE_NAME,
                    text_at(r, "/document_header/unique_document_filename"),
                ),
            ],
            ClinicalRecord::LabResult(r) => vec![
                (LABEL_PATIENT_ID, text_at(r, FIRST_IDENTIFIER)),
                (
                    LABEL_SPECIMEN_TYPE,
                    text_at(r, "/specimens/0/specimen_type/text"),
                ),
                (
                    LABEL_FIRST_TEST,
                    text_at(
                        r,
                        "/specimens/0/observation_requests/0/universal_service_identifier/text",
                    ),
                ),
                (
                    LABEL_COLLECTION_DATE,
                    text_at(r, "/specimens/0/collection_datetime"),
                ),
            ],
            ClinicalRecord::Observation(r) => vec![
                (LABEL_PATIENT_ID, text_at(r, FIRST_IDENTIFIER)),
                (
                    LABEL_FIRST_OBSERVATION,
                    text_at(
                        r,
                        "/observation_report/0/observations/0/observation_identifier/identifier",
                    ),
                ),
                (
                    LABEL_VALUE,
                    text_at(r, "/observation_report/0/observations/0/observation_value"),
                ),
                (
                    LABEL_UNITS,
                    text_at(r, "/observation_report/0/observations/0/units"),
                ),
            ],
            ClinicalRecord::Unrecognised(_) => Vec::new(),
        }
    }

    /// Raw highlight value for `label`, `None` if absent or not a highlight of this variant.
    pub(crate) fn highlight_value(&self, label: &str) -> Option<String> {
        self.highlight_values()
            .into_iter()
            .find(|(l, _)| *l == label)
            .and_then(|(_, v)| v)
    }
}

/// Display title of `record` read as variant `tag`.
pub fn title(record: &Value, tag: &str) -> String {
    ClinicalRecord::tagged(tag, record).title()
}

/// Ordered summary of `record` read as variant `tag`.
pub fn summary(record: &Value, tag: &str) -> FieldMap {
    ClinicalRecord::tagged(tag, record).summary()
}

/// Ordered highlight fields of `record` read as variant `tag`.
pub fn highlight_fields(record: &Value, tag: &str) -> FieldMap {
    ClinicalRecord::tagged(tag, record).highlight_fields()
}

fn or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mdm() -> Value {
        json!({
            "patient_identification": {
                "name": {"family_name": "ROSSI", "given_name": "MARIO"},
                "identifiers": [{"id_number": "1721260"}, {"id_number": "RSSMRA80E12H501X"}],
                "administrative_sex": "M",
                "date_of_birth": "19800512"
            },
            "document_header": {
                "document_type": "ZZZ",
                "activity_datetime": "20250611103000",
                "unique_document_filename": "referto_001.pdf"
            },
            "patient_visit": {"patient_class": "I"}
        })
    }

    fn oul() -> Value {
        json!({
            "patient_identification": {
                "name": {"family": "BIANCHI", "given": ["ANNA"]},
                "identifiers": [{"id_number": "383378"}],
                "administrative_sex": "F"
            },
            "specimens": [
                {
                    "specimen_type": {"text": "SIERO"},
                    "collection_datetime": "20250610080000",
                    "observation_requests": [
                        {"universal_service_identifier": {"text": "POTASSIO"}},
                        {"universal_service_identifier": {"text": "SODIO"}}
                    ]
                },
                {"specimen_type": {"text": "URINE"}}
            ]
        })
    }

    fn oru() -> Value {
        json!({
            "patient_identification": {
                "identifiers": [{"id_number": "ttttt"}],
                "administrative_sex": "F",
                "date_of_birth": "19700101"
            },
            "patient_visit": {"patient_class": "E"},
            "observation_report": [
                {"observations": [
                    {"observation_identifier": {"identifier": "HR"}, "observation_value": 72, "units": "bpm"},
                    {"observation_identifier": {"identifier": "SpO2"}, "observation_value": "98", "units": "%"}
                ]}
            ]
        })
    }

    #[test]
    fn mdm_projection() {
        let record = mdm();
        let view = ClinicalRecord::new(Some(VariantTag::Mdm), &record);
        assert_eq!(view.title(), "ROSSI, MARIO");

        let summary = view.summary();
        assert_eq!(
            summary.labels(),
            vec![LABEL_DOCUMENT_TYPE, LABEL_ACTIVITY_DATE, LABEL_PATIENT_CLASS, LABEL_SEX]
        );
        assert_eq!(summary.get(LABEL_DOCUMENT_TYPE), Some("ZZZ"));
        assert_eq!(summary.get(LABEL_PATIENT_CLASS), Some("I"));

        let highlights = view.highlight_fields();
        assert_eq!(highlights.get(LABEL_PATIENT_ID), Some("1721260"));
        assert_eq!(highlights.get(LABEL_FILE_NAME), Some("referto_001.pdf"));
    }

    #[test]
    fn oul_projection_reads_fhir_style_names_and_counts_specimens() {
        let record = oul();
        let view = ClinicalRecord::new(Some(VariantTag::Oul), &record);
        assert_eq!(view.title(), "BIANCHI, ANNA");

        let summary = view.summary();
        assert_eq!(summary.get(LABEL_SPECIMEN_COUNT), Some("2"));
        assert_eq!(summary.get(LABEL_FIRST_SPECIMEN_TYPE), Some("SIERO"));
        assert_eq!(summary.get(LABEL_COLLECTION_DATE), Some("20250610080000"));

        let highlights = view.highlight_fields();
        assert_eq!(
            highlights.labels(),
            vec![LABEL_PATIENT_ID, LABEL_SPECIMEN_TYPE, LABEL_FIRST_TEST, LABEL_COLLECTION_DATE]
        );
        assert_eq!(highlights.get(LABEL_FIRST_TEST), Some("POTASSIO"));
    }

    #[test]
    fn oru_projection() {
        let record = oru();
        let view = ClinicalRecord::new(Some(VariantTag::Oru), &record);
        assert_eq!(view.title(), "Patient: ttttt");

        let summary = view.summary();
        assert_eq!(
            summary.labels(),
            vec![LABEL_OBSERVATION_COUNT, LABEL_PATIENT_CLASS, LABEL_SEX, LABEL_DATE_OF_BIRTH]
        );
        assert_eq!(summary.get(LABEL_OBSERVATION_COUNT), Some("2"));

        let highlights = view.highlight_fields();
        assert_eq!(highlights.get(LABEL_FIRST_OBSERVATION), Some("HR"));
        assert_eq!(highlights.get(LABEL_VALUE), Some("72"));
        assert_eq!(highlights.get(LABEL_UNITS), Some("bpm"));
    }

    #[test]
    fn empty_records_render_placeholders_and_zero_counts() {
        let empty = json!({});
        assert_eq!(title(&empty, "MDM"), "N/A, N/A");
        assert_eq!(title(&empty, "ORU"), "Patient: N/A");

        let summary = summary(&empty, "OUL");
        assert_eq!(summary.len(), 4);
        assert_eq!(summary.get(LABEL_SPECIMEN_COUNT), Some("0"));
        assert_eq!(summary.get(LABEL_FIRST_SPECIMEN_TYPE), Some(NOT_AVAILABLE));

        let oru_summary = ClinicalRecord::tagged("ORU", &empty).summary();
        assert_eq!(oru_summary.get(LABEL_OBSERVATION_COUNT), Some("0"));
        assert!(highlight_fields(&empty, "ORU")
            .iter()
            .all(|(_, v)| v == NOT_AVAILABLE));
    }

    #[test]
    fn blank_and_wrongly_typed_values_are_placeholders() {
        let record = json!({
            "patient_identification": {"name": {"family_name": "", "given_name": null}},
            "specimens": "not a list",
            "document_header": {"document_type": {"nested": true}}
        });
        assert_eq!(title(&record, "OUL"), "N/A, N/A");
        assert_eq!(summary(&record, "OUL").get(LABEL_SPECIMEN_COUNT), Some("0"));
        assert_eq!(summary(&record, "MDM").get(LABEL_DOCUMENT_TYPE), Some(NOT_AVAILABLE));
    }

    #[test]
    fn unknown_tags_stay_renderable() {
        let record = mdm();
        assert_eq!(title(&record, "ADT"), UNKNOWN_VARIANT_TITLE);
        assert!(summary(&record, "ADT").is_empty());
        assert!(highlight_fields(&record, "").is_empty());
        assert_eq!(ClinicalRecord::tagged("ADT", &record).tag(), None);
    }

    #[test]
    fn projections_are_repeatable() {
        for (record, tag) in [(mdm(), "MDM"), (oul(), "OUL"), (oru(), "ORU")] {
            assert_eq!(title(&record, tag), title(&record, tag));
            assert_eq!(summary(&record, tag), summary(&record, tag));
            assert_eq!(highlight_fields(&record, tag), highlight_fields(&record, tag));
        }
    }

    #[test]
    fn field_map_serialises_in_insertion_order() {
        let record = oru();
        let json = serde_json::to_string(&summary(&record, "ORU")).unwrap();
        assert_eq!(
            json,
            r#"{"Observation Count":"2","Patient Class":"E","Sex":"F","Date of Birth":"19700101"}"#
        );
    }
}

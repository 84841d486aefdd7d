//! Variant tags for converted clinical records.

use crate::constants::{MDM_COLLECTION, ORU_COLLECTION, OUL_COLLECTION};
use crate::{RecordError, RecordResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminator identifying which record shape a converted message follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariantTag {
    /// Medical document management.
    #[serde(rename = "MDM")]
    Mdm,
    /// Unsolicited laboratory observation.
    #[serde(rename = "OUL")]
    Oul,
    /// Unsolicited observation result (patient monitoring).
    #[serde(rename = "ORU")]
    Oru,
}

impl VariantTag {
    pub const ALL: [VariantTag; 3] = [VariantTag::Mdm, VariantTag::Oul, VariantTag::Oru];

    pub fn as_str(self) -> &'static str {
        match self {
            VariantTag::Mdm => "MDM",
            VariantTag::Oul => "OUL",
            VariantTag::Oru => "ORU",
        }
    }

    /// Store collection holding records of this variant.
    pub fn collection(self) -> &'static str {
        match self {
            VariantTag::Mdm => MDM_COLLECTION,
            VariantTag::Oul => OUL_COLLECTION,
            VariantTag::Oru => ORU_COLLECTION,
        }
    }

    /// Recognise a variant from an HL7 message type such as `ORU^R01` or `mdm`.
    ///
    /// Only the leading three characters are significant, case-insensitively.
    pub fn from_message_type(message_type: &str) -> Option<Self> {
        let upper = message_type.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|tag| upper.starts_with(tag.as_str()))
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantTag {
    type Err = RecordError;

    fn from_str(s: &str) -> RecordResult<Self> {
        Self::from_message_type(s).ok_or_else(|| {
            RecordError::InvalidInput(format!("unsupported message type: '{}'", s.trim()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_message_type_prefixes() {
        assert_eq!(VariantTag::from_message_type("MDM"), Some(VariantTag::Mdm));
        assert_eq!(VariantTag::from_message_type("oul"), Some(VariantTag::Oul));
        assert_eq!(VariantTag::from_message_type("ORU^R01"), Some(VariantTag::Oru));
        assert_eq!(VariantTag::from_message_type(" MDM^T02 "), Some(VariantTag::Mdm));
        assert_eq!(VariantTag::from_message_type("ADT^A04"), None);
        assert_eq!(VariantTag::from_message_type(""), None);
    }

    #[test]
    fn parse_reports_unsupported_types() {
        let err = "ADT".parse::<VariantTag>().expect_err("ADT is not supported");
        assert!(err.to_string().contains("ADT"));
    }

    #[test]
    fn serialises_as_wire_tag() {
        assert_eq!(serde_json::to_string(&VariantTag::Oru).unwrap(), "\"ORU\"");
        assert_eq!(VariantTag::Oul.collection(), "oul_lab_results");
    }
}

//! Categorical encoding with a persisted name -> code mapping.
//!
//! Codes are assigned in sorted byte-wise order of the distinct values, so
//! fitting the same value set always produces the same mapping. The
//! mapping is fitted once on the training corpus and reused verbatim at
//! inference; unseen values are never re-coded.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ArtifactError, ArtifactResult, UnmappedCategory};

/// Fits a [`CategoryMapping`] from observed values.
pub struct CategoricalEncoder;

impl CategoricalEncoder {
    /// Assign codes `0..n` to the distinct values in sorted order.
    ///
    /// Values are trimmed; blank values are skipped.
    pub fn fit<'a, I>(values: I) -> CategoryMapping
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = values
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();

        let names: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let codes = names
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code as u32))
            .collect();

        CategoryMapping { codes, names }
    }
}

/// Ordered, immutable name -> code mapping for one categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryMapping {
    codes: BTreeMap<String, u32>,
    // Indexed by code
    names: Vec<String>,
}

impl CategoryMapping {
    /// Build from an explicit `{name: code}` table.
    ///
    /// Codes must form a dense `0..n` permutation.
    pub fn from_codes(codes: BTreeMap<String, u32>) -> ArtifactResult<Self> {
        let n = codes.len();
        let mut slots: Vec<Option<String>> = vec![None; n];

        for (name, &code) in &codes {
            let slot = slots
                .get_mut(code as usize)
                .ok_or_else(|| ArtifactError::Corrupt {
                    reason: format!("code {} for {:?} is out of range 0..{}", code, name, n),
                })?;
            if let Some(other) = slot {
                return Err(ArtifactError::Corrupt {
                    reason: format!("code {} assigned to both {:?} and {:?}", code, other, name),
                });
            }
            *slot = Some(name.clone());
        }

        // n names into n slots with no collision fills every slot
        let names = slots.into_iter().flatten().collect();
        Ok(Self { codes, names })
    }

    /// Code for a known value.
    pub fn encode(&self, value: &str) -> Result<u32, UnmappedCategory> {
        self.codes
            .get(value.trim())
            .copied()
            .ok_or_else(|| UnmappedCategory {
                value: value.to_string(),
            })
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.names.get(code as usize).map(String::as_str)
    }

    /// Names in code order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Serialize as a JSON object `{name: code}`.
    pub fn to_bytes(&self) -> ArtifactResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.codes)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> ArtifactResult<Self> {
        let codes: BTreeMap<String, u32> = serde_json::from_slice(bytes)?;
        Self::from_codes(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn codes_follow_sorted_order() {
        let mapping = CategoricalEncoder::fit(["Selangor", "Johor", "Kuala Lumpur", "Johor"]);

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.encode("Johor"), Ok(0));
        assert_eq!(mapping.encode("Kuala Lumpur"), Ok(1));
        assert_eq!(mapping.encode("Selangor"), Ok(2));
        assert_eq!(mapping.decode(1), Some("Kuala Lumpur"));
        assert_eq!(mapping.decode(3), None);
        assert_eq!(
            mapping.names().collect::<Vec<_>>(),
            vec!["Johor", "Kuala Lumpur", "Selangor"]
        );
    }

    #[test]
    fn fit_is_independent_of_input_order() {
        let a = CategoricalEncoder::fit(["b", "a", "c"]);
        let b = CategoricalEncoder::fit(["c", "b", "a", "a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn blank_values_are_skipped() {
        let mapping = CategoricalEncoder::fit(["", "  ", " Penang "]);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.encode("Penang"), Ok(0));
    }

    #[test]
    fn unseen_value_is_unmapped() {
        let mapping = CategoricalEncoder::fit(["Johor"]);
        let err = mapping.encode("Sabah").unwrap_err();
        assert_eq!(err.value, "Sabah");
    }

    #[test]
    fn persisted_form_is_a_name_to_code_object() {
        let mapping = CategoricalEncoder::fit(["Perak", "Johor"]);
        let json: serde_json::Value = serde_json::from_slice(&mapping.to_bytes().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"Johor": 0, "Perak": 1}));
    }

    #[test]
    fn sparse_codes_are_rejected() {
        let err = CategoryMapping::from_bytes(br#"{"Johor": 0, "Perak": 2}"#).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let err = CategoryMapping::from_bytes(br#"{"Johor": 0, "Perak": 0}"#).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn malformed_bytes_are_a_json_error() {
        let err = CategoryMapping::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, ArtifactError::Json(_)));
    }

    proptest! {
        #[test]
        fn persist_load_round_trips(values in proptest::collection::btree_set("[A-Za-z ]{1,12}", 0..20)) {
            let mapping = CategoricalEncoder::fit(values.iter().map(String::as_str));
            let loaded = CategoryMapping::from_bytes(&mapping.to_bytes().unwrap()).unwrap();
            prop_assert_eq!(&loaded, &mapping);
            for name in mapping.names() {
                prop_assert_eq!(loaded.encode(name), mapping.encode(name));
            }
        }
    }
}

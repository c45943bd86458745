//! Identifier and number formatting shared by every profile writer.
//!
//! Two textual forms of an identifier coexist in a CGMES document:
//!
//! - the RDF id (`_` prefixed), used in `rdf:ID`, `rdf:about` and `rdf:resource`;
//! - the master resource id (no prefix), used as the `IdentifiedObject.mRID` text.
//!
//! Writers accept either form and convert at the boundary with [`to_rdf_id`] and
//! [`to_master_resource_id`].

use uuid::Uuid;

const RDF_ID_PREFIX: char = '_';
const MAX_FRACTION_DIGITS: usize = 14;

/// `_`-prefixed form of `id`. Idempotent.
pub fn to_rdf_id(id: &str) -> String {
    if id.starts_with(RDF_ID_PREFIX) {
        id.to_string()
    } else {
        format!("{RDF_ID_PREFIX}{id}")
    }
}

/// `id` without its leading `_`, if it has one. Inverse of [`to_rdf_id`] on unprefixed ids.
pub fn to_master_resource_id(id: &str) -> &str {
    id.strip_prefix(RDF_ID_PREFIX).unwrap_or(id)
}

/// Name-based (RFC 4122 version 5, SHA-1) identifier of `name` within `namespace`.
///
/// Re-exporting an object with the same name under the same namespace always yields the same id.
pub fn uuid5(namespace: &Uuid, name: &str) -> Uuid {
    Uuid::new_v5(namespace, name.as_bytes())
}

/// Random (version 4) identifier for objects that only need to be unique within one export.
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}

/// `urn:uuid:` form used for `md:FullModel` identifiers and dependencies.
pub fn model_urn(id: &Uuid) -> String {
    format!("urn:uuid:{id}")
}

/// Fixed-locale decimal formatting: at most 14 fractional digits, no trailing zeros.
///
/// Starts from the shortest representation that round-trips, so `401.2` stays `401.2`, and only
/// rounds when that representation needs more than 14 fractional digits. `NaN` is written as
/// zero. Negative values that round to zero are written as `0`.
pub fn format_double(value: f64) -> String {
    let value = if value.is_nan() { 0.0 } else { value };
    let mut formatted = value.to_string();
    let fraction_digits = formatted.find('.').map_or(0, |dot| formatted.len() - dot - 1);
    if fraction_digits > MAX_FRACTION_DIGITS {
        formatted = format!("{:.*}", MAX_FRACTION_DIGITS, value);
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(trimmed);
    }
    if formatted == "-0" {
        formatted = "0".to_string();
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdf_id_is_idempotent() {
        assert_eq!(to_rdf_id("abc"), "_abc");
        assert_eq!(to_rdf_id("_abc"), "_abc");
        assert_eq!(to_rdf_id(&to_rdf_id("abc")), to_rdf_id("abc"));
    }

    #[test]
    fn test_rdf_and_master_ids_are_inverse() {
        for id in ["abc", "VL1_0", "6b1a0d0c-5f1e-4a43-9d6f-4c5b0f3d8a11", ""] {
            assert_eq!(to_master_resource_id(&to_rdf_id(id)), id);
        }
    }

    #[test]
    fn test_master_id_strips_single_prefix() {
        assert_eq!(to_master_resource_id("_abc"), "abc");
        assert_eq!(to_master_resource_id("__abc"), "_abc");
        assert_eq!(to_master_resource_id("abc"), "abc");
    }

    #[test]
    fn test_uuid5_matches_reference_vector() {
        // Python: uuid.uuid5(uuid.NAMESPACE_DNS, "python.org")
        let id = uuid5(&Uuid::NAMESPACE_DNS, "python.org");
        assert_eq!(id.to_string(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
        assert_eq!(id.get_version_num(), 5);
    }

    #[test]
    fn test_uuid5_is_deterministic() {
        let namespace = Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0);
        assert_eq!(uuid5(&namespace, "BUS_1"), uuid5(&namespace, "BUS_1"));
        assert_ne!(uuid5(&namespace, "BUS_1"), uuid5(&namespace, "BUS_2"));
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(random_id(), random_id());
    }

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(1.0), "1");
        assert_eq!(format_double(401.2), "401.2");
        assert_eq!(format_double(-0.0), "0");
        assert_eq!(format_double(-1.5), "-1.5");
        assert_eq!(format_double(0.1 + 0.2), "0.3");
        assert_eq!(format_double(2.0 / 3.0), "0.66666666666667");
        assert_eq!(format_double(1e-15), "0");
        assert_eq!(format_double(-1e-15), "0");
        assert_eq!(format_double(f64::NAN), "0");
        assert_eq!(format_double(1e20), "100000000000000000000");
    }
}

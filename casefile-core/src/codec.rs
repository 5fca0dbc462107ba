/*!
Two-level delimited codec for the suspect list stored in `saved_cases`.

Each suspect becomes one record of three fields. Fields are separated by
[`FIELD_DELIMITER`], records are terminated by [`RECORD_DELIMITER`]:

```text
Samantha;Medical officer;true|Derek;Navigator;false|
```

The layout is fixed by existing save databases, so both directions keep the
exact shape: encoding always appends the record terminator, and decoding
tolerates whatever it finds. A record that does not split into at least
three fields is dropped rather than failing the whole blob; field text
containing a delimiter cannot survive a round trip. Both limits are part of
the format's contract. Dropped records are counted and reported through a
single `tracing::warn!` so the loss is visible in logs without turning into
an error.
*/

use crate::model::Suspect;

/// Separates the fields of one suspect record
pub const FIELD_DELIMITER: char = ';';

/// Terminates each suspect record
pub const RECORD_DELIMITER: char = '|';

/// Encode a suspect list into the delimited blob.
///
/// Total for every input; an empty slice encodes to the empty string.
///
/// # Example
/// ```rust
/// use casefile_core::{codec, Suspect};
///
/// let suspects = vec![Suspect::new("Samantha", "Medical officer", true)];
/// assert_eq!(codec::encode(&suspects), "Samantha;Medical officer;true|");
/// ```
pub fn encode(suspects: &[Suspect]) -> String {
    let mut blob = String::new();
    for suspect in suspects {
        blob.push_str(&suspect.name);
        blob.push(FIELD_DELIMITER);
        blob.push_str(&suspect.description);
        blob.push(FIELD_DELIMITER);
        blob.push_str(if suspect.guilty { "true" } else { "false" });
        blob.push(RECORD_DELIMITER);
    }
    blob
}

/// Decode a delimited blob back into suspects.
///
/// Best-effort: empty segments are skipped, and any segment with fewer than
/// three fields is dropped. Extra fields beyond the third are ignored. The
/// guilt field is `true` case-insensitively; any other text reads as not
/// guilty, matching blobs written by older builds.
pub fn decode(blob: &str) -> Vec<Suspect> {
    let mut suspects = Vec::new();
    let mut dropped = 0usize;

    for segment in blob.split(RECORD_DELIMITER) {
        if segment.is_empty() {
            continue;
        }
        let fields: Vec<&str> = segment.split(FIELD_DELIMITER).collect();
        if fields.len() < 3 {
            dropped += 1;
            continue;
        }
        suspects.push(Suspect::new(
            fields[0],
            fields[1],
            fields[2].eq_ignore_ascii_case("true"),
        ));
    }

    if dropped > 0 {
        tracing::warn!(dropped, "dropped malformed suspect records while decoding");
    }
    suspects
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_single_suspect() {
        let suspects = vec![Suspect::new("Samantha", "Medical officer", true)];
        assert_eq!(encode(&suspects), "Samantha;Medical officer;true|");
    }

    #[test]
    fn test_encode_empty_list() {
        assert_eq!(encode(&[]), "");
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_order_and_guilt() {
        let suspects = vec![
            Suspect::new("Samantha", "Medical officer", true),
            Suspect::new("Derek", "Navigator", false),
            Suspect::new("Elena", "Cargo specialist", false),
        ];

        let decoded = decode(&encode(&suspects));
        assert_eq!(decoded, suspects);
    }

    #[test]
    fn test_short_segments_are_dropped() {
        let blob = "Samantha;Medical officer;true|garbage|Derek;Navigator|Elena;Cargo specialist;false|";
        let decoded = decode(blob);

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, "Samantha");
        assert_eq!(decoded[1].name, "Elena");
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        assert!(decode("||").is_empty());
        assert_eq!(decode("|Derek;Navigator;false|").len(), 1);
    }

    #[test]
    fn test_guilt_parses_case_insensitively() {
        let decoded = decode("A;x;TRUE|B;y;True|C;z;yes|");
        assert!(decoded[0].guilty);
        assert!(decoded[1].guilty);
        assert!(!decoded[2].guilty);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let decoded = decode("Samantha;Medical officer;true;leftover|");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].description, "Medical officer");
        assert!(decoded[0].guilty);
    }

    proptest! {
        // Round trip holds for any sequence whose fields avoid both delimiters.
        #[test]
        fn test_roundtrip_property(
            raw in prop::collection::vec(
                ("[A-Za-z0-9 ,.'-]{0,24}", "[A-Za-z0-9 ,.'-]{0,48}", any::<bool>()),
                0..8,
            )
        ) {
            let suspects: Vec<Suspect> = raw
                .into_iter()
                .map(|(name, description, guilty)| Suspect::new(name, description, guilty))
                .collect();

            prop_assert_eq!(decode(&encode(&suspects)), suspects);
        }
    }
}

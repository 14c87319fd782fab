use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use crate::constants::QR_PREFIX;
use crate::models::BatchDescriptor;

/// Encode a batch descriptor as `QR-` + base64(JSON)
pub fn encode(descriptor: &BatchDescriptor) -> String {
    // Serializing a struct of plain strings cannot fail
    let json = serde_json::to_vec(descriptor).unwrap_or_default();
    format!("{QR_PREFIX}{}", STANDARD.encode(json))
}

/// Decode a QR payload back into a descriptor.
///
/// The prefix is stripped when present but not required. Any malformed input
/// yields `None`; callers must treat that as an invalid code.
pub fn decode(code: &str) -> Option<BatchDescriptor> {
    let body = code.trim();
    let body = body.strip_prefix(QR_PREFIX).unwrap_or(body);
    if body.is_empty() {
        return None;
    }

    let bytes = match STANDARD.decode(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "QR payload is not base64");
            return None;
        }
    };

    // A blank batch id still decodes; scan validation reports it as missing
    match serde_json::from_slice::<BatchDescriptor>(&bytes) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            debug!(error = %e, "QR payload is not a batch descriptor");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_paracetamol() {
        let d = BatchDescriptor::new("BATCH-1", "Paracetamol 500mg", "Sun Pharma");
        let code = encode(&d);

        assert!(code.starts_with("QR-"));
        assert_eq!(decode(&code), Some(d));
    }

    #[test]
    fn test_round_trip_unicode_and_punctuation() {
        let d = BatchDescriptor::new("BATCH-1ldf2h-XYZAB", "Amoxicillin 250mg \"forte\"", "Dr. Reddy's");
        assert_eq!(decode(&encode(&d)), Some(d));

        let d = BatchDescriptor::new("BATCH-é", "Ibuprofène", "Lupin Ltd");
        assert_eq!(decode(&encode(&d)), Some(d));
    }

    #[test]
    fn test_round_trip_edge_descriptors() {
        let long = "x".repeat(4096);
        let descriptors = vec![
            BatchDescriptor::new("", "Paracetamol 500mg", "Sun Pharma"),
            BatchDescriptor::new("   ", "", ""),
            BatchDescriptor::new("BATCH-1", "", "Sun Pharma"),
            BatchDescriptor::new("BATCH-1", "Paracetamol 500mg", ""),
            BatchDescriptor::new(long.clone(), long.clone(), long),
            BatchDescriptor::new("BATCH-ü", "औषधि".repeat(200), "Dr. Reddy's"),
            BatchDescriptor::new("BATCH->>>>>>", ">>>>>>", ">>>>>>"),
            BatchDescriptor::new("BATCH-??????", "??????", "??????"),
            BatchDescriptor::new("B", "", ""),
            BatchDescriptor::new("BB", "", ""),
            BatchDescriptor::new("BBB", "", ""),
        ];

        let mut codes = Vec::new();
        for d in descriptors {
            let code = encode(&d);
            assert_eq!(decode(&code), Some(d), "round trip failed for {code}");
            codes.push(code);
        }

        // Runs of '>' and '?' force '+' and '/' into the standard alphabet
        assert!(codes.iter().any(|c| c.contains('+')));
        assert!(codes.iter().any(|c| c.contains('/')));

        let padding: std::collections::HashSet<usize> = codes
            .iter()
            .map(|c| c.len() - c.trim_end_matches('=').len())
            .collect();
        assert_eq!(padding, [0, 1, 2].into_iter().collect());
    }

    #[test]
    fn test_decode_without_prefix_is_permitted() {
        let d = BatchDescriptor::new("BATCH-2", "Aspirin 75mg", "Cipla Ltd");
        let code = encode(&d);
        let bare = code.strip_prefix("QR-").unwrap();
        assert_eq!(decode(bare), Some(d));
    }

    #[test]
    fn test_decode_legacy_code_with_only_batch_id() {
        // {"batchId":"BATCH-1ldf2g-ABCDE"}
        let d = decode("QR-eyJiYXRjaElkIjoiQkFUQ0gtMWxkZjJnLUFCQ0RFIn0=").unwrap();
        assert_eq!(d.batch_id, "BATCH-1ldf2g-ABCDE");
        assert!(d.drug_name.is_empty());
        assert!(d.is_partial());
    }

    #[test]
    fn test_decode_malformed_inputs() {
        let cases = [
            "",
            "QR-",
            "   ",
            "QR-!!!not-base64!!!",
            "QR-aGVsbG8=",              // "hello"
            "QR-W10=",                  // "[]"
            "QR-eyJkcnVnTmFtZSI6IngifQ==", // {"drugName":"x"}
            "QR-QR-QR-",
            "QR-\u{0}\u{1}",
        ];
        for case in cases {
            assert_eq!(decode(case), None, "expected None for {case:?}");
        }
    }
}

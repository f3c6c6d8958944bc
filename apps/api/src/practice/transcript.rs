use serde::{Deserialize, Serialize};

/// One result delivered by the browser's continuous speech recognizer.
///
/// Legacy recognizers deliver bare strings; those carry no finalized
/// transcript and are ignored during assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecognitionResult {
    Final {
        transcript: String,
        #[serde(default)]
        timestamp: Option<i64>,
    },
    Legacy(String),
}

impl RecognitionResult {
    pub fn finalized(transcript: impl Into<String>) -> Self {
        RecognitionResult::Final {
            transcript: transcript.into(),
            timestamp: None,
        }
    }
}

/// Joins the finalized transcripts with single spaces, in arrival order.
///
/// The result is recomputed from the full result list every time, so calling
/// it again on the same list yields the same text.
pub fn assemble_transcript(results: &[RecognitionResult]) -> String {
    results
        .iter()
        .filter_map(|r| match r {
            RecognitionResult::Final { transcript, .. } => Some(transcript.as_str()),
            RecognitionResult::Legacy(_) => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_in_arrival_order() {
        let results = vec![
            RecognitionResult::finalized("I would start"),
            RecognitionResult::finalized("with a hash map"),
            RecognitionResult::finalized("keyed by id"),
        ];
        assert_eq!(
            assemble_transcript(&results),
            "I would start with a hash map keyed by id"
        );
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let results = vec![
            RecognitionResult::finalized("first"),
            RecognitionResult::finalized("second"),
        ];
        let once = assemble_transcript(&results);
        let twice = assemble_transcript(&results);
        assert_eq!(once, twice);
        assert_eq!(once, "first second");
    }

    #[test]
    fn test_legacy_strings_are_skipped() {
        let results = vec![
            RecognitionResult::Legacy("raw".to_string()),
            RecognitionResult::finalized("kept"),
        ];
        assert_eq!(assemble_transcript(&results), "kept");
    }

    #[test]
    fn test_empty_results_give_empty_transcript() {
        assert_eq!(assemble_transcript(&[]), "");
    }

    #[test]
    fn test_deserializes_browser_payload() {
        let json = r#"[{"transcript": "hello", "timestamp": 1700000000}, "legacy"]"#;
        let results: Vec<RecognitionResult> = serde_json::from_str(json).unwrap();
        assert_eq!(
            results[0],
            RecognitionResult::Final {
                transcript: "hello".to_string(),
                timestamp: Some(1700000000)
            }
        );
        assert_eq!(results[1], RecognitionResult::Legacy("legacy".to_string()));
    }
}

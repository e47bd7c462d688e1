use log::{ debug, info };
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PHRASE: &str = "This sword";

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("metadata file IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("metadata file must hold a top-level JSON array")]
    NotAnArray,

    #[error("invalid strip pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Text fields of a metadata record that may carry the phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation {
    Description,
    RawDescription,
}

impl FieldLocation {
    pub const ALL: [FieldLocation; 2] = [FieldLocation::Description, FieldLocation::RawDescription];

    pub fn pointer(self) -> &'static str {
        match self {
            FieldLocation::Description => "/metadata/description",
            FieldLocation::RawDescription => "/metadata/raw/metadata/description",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldLocation::Description => "main",
            FieldLocation::RawDescription => "nested",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Zero-based position of the record in the array.
    pub index: usize,
    pub location: FieldLocation,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    pub total_items: usize,
    pub removed_count: usize,
    pub changes: Vec<FieldChange>,
}

/// Removes every sentence that contains a phrase. A sentence ends at `.`,
/// `!` or `?`; a phrase with no terminator after it is left alone.
#[derive(Debug, Clone)]
pub struct SentenceStripper {
    phrase: String,
    sentence: Regex,
}

impl SentenceStripper {
    pub fn new(phrase: &str) -> Result<Self, CleanError> {
        let sentence = Regex::new(&format!(r"[^.!?]*{}[^.!?]*[.!?]", regex::escape(phrase)))?;
        Ok(Self { phrase: phrase.to_string(), sentence })
    }

    /// Returns the cleaned text, or `None` when nothing should be written:
    /// the phrase is absent, the text would not change, or nothing would be
    /// left of it.
    pub fn strip(&self, text: &str) -> Option<String> {
        if !text.contains(&self.phrase) {
            return None;
        }
        let joined: String = self.sentence.split(text).collect();
        let cleaned = joined.trim();
        if cleaned != text && !cleaned.is_empty() {
            Some(cleaned.to_string())
        } else {
            None
        }
    }

    pub fn clean_records(&self, records: &mut [Value]) -> CleanReport {
        let mut report = CleanReport { total_items: records.len(), ..CleanReport::default() };

        for (index, record) in records.iter_mut().enumerate() {
            for location in FieldLocation::ALL {
                let Some(field) = record.pointer_mut(location.pointer()) else {
                    continue;
                };
                let Value::String(original) = field else {
                    debug!("Item {}: {} description is not a string, skipping", index + 1, location.label());
                    continue;
                };
                let Some(cleaned) = self.strip(original) else {
                    continue;
                };

                info!(
                    "Cleaned {} description in item {}: '{}' -> '{}'",
                    location.label(),
                    index + 1,
                    original,
                    cleaned
                );
                let before = std::mem::replace(original, cleaned.clone());
                report.changes.push(FieldChange { index, location, before, after: cleaned });
                report.removed_count += 1;
            }
        }

        report
    }
}

/// Strips the phrase from every record of the JSON array at `path` and
/// writes the array back pretty-printed unless `dry_run` is set.
pub fn clean_file<P: AsRef<Path>>(
    path: P,
    stripper: &SentenceStripper,
    dry_run: bool
) -> Result<CleanReport, CleanError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut data: Value = serde_json::from_str(&content)?;
    let records = data.as_array_mut().ok_or(CleanError::NotAnArray)?;

    let report = stripper.clean_records(records);
    info!("Processed {} items, removed {} sentences", report.total_items, report.removed_count);

    if dry_run {
        info!("Dry run, {} left untouched", path.display());
    } else {
        fs::write(path, serde_json::to_string_pretty(&data)?)?;
        info!("File updated successfully: {}", path.display());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn stripper() -> SentenceStripper {
        SentenceStripper::new(DEFAULT_PHRASE).unwrap()
    }

    fn write_temp(value: &Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    #[test]
    fn keeps_leading_exclamation() {
        let mut records = vec![json!({"metadata": {"description": "Phuc! This sword was forged in fire."}})];
        let report = stripper().clean_records(&mut records);
        assert_eq!(records[0], json!({"metadata": {"description": "Phuc!"}}));
        assert_eq!(report.removed_count, 1);
        assert_eq!(report.changes[0].before, "Phuc! This sword was forged in fire.");
        assert_eq!(report.changes[0].location, FieldLocation::Description);
    }

    #[test]
    fn untouched_without_phrase() {
        let original = json!({"metadata": {"description": "A humble dagger. Sharp!"}});
        let mut records = vec![original.clone()];
        let report = stripper().clean_records(&mut records);
        assert_eq!(records[0], original);
        assert_eq!(report.removed_count, 0);
        assert!(report.changes.is_empty());
    }

    #[test]
    fn strip_cases() {
        let s = stripper();
        assert_eq!(
            s.strip("A fine blade. This sword sings! Sharp.").as_deref(),
            Some("A fine blade. Sharp.")
        );
        assert_eq!(
            s.strip("This sword is old. Ok? This sword again!").as_deref(),
            Some("Ok?")
        );
        // nothing would remain
        assert_eq!(s.strip("This sword is old."), None);
        // no terminator after the phrase
        assert_eq!(s.strip("Phuc! This sword"), None);
        assert_eq!(s.strip("no match here."), None);
    }

    #[test]
    fn nested_and_main_fields_counted_separately() {
        let mut records = vec![
            json!({
                "metadata": {
                    "description": "Kiri! This sword cuts clouds.",
                    "raw": { "metadata": { "description": "Kiri? This sword cuts clouds." } }
                }
            }),
            json!({ "metadata": { "raw": { "metadata": { "description": "Plain." } } } })
        ];
        let report = stripper().clean_records(&mut records);
        assert_eq!(report.total_items, 2);
        assert_eq!(report.removed_count, 2);
        assert_eq!(records[0]["metadata"]["description"], "Kiri!");
        assert_eq!(records[0]["metadata"]["raw"]["metadata"]["description"], "Kiri?");
        assert_eq!(report.changes[1].location, FieldLocation::RawDescription);
    }

    #[test]
    fn missing_or_odd_fields_are_skipped() {
        let mut records = vec![
            json!({}),
            json!({ "metadata": {} }),
            json!({ "metadata": { "description": 7, "raw": "flat" } }),
            json!("not an object")
        ];
        let before = records.clone();
        let report = stripper().clean_records(&mut records);
        assert_eq!(records, before);
        assert_eq!(report.removed_count, 0);
        assert_eq!(report.total_items, 4);
    }

    #[test]
    fn phrase_is_matched_literally() {
        let s = SentenceStripper::new("A.I. blade").unwrap();
        assert_eq!(s.strip("Hi! The A.I. blade hums.").as_deref(), Some("Hi!"));
        assert_eq!(s.strip("Hi! The AxIx blade hums."), None);
        let s = SentenceStripper::new("(cursed)").unwrap();
        assert_eq!(s.strip("Hi! It is (cursed) indeed.").as_deref(), Some("Hi!"));
    }

    #[test]
    fn file_round_trip_is_idempotent() {
        let file = write_temp(
            &json!([
                { "name": "Phuc", "metadata": { "description": "Phuc! This sword was forged in fire." } },
                { "name": "Bo", "metadata": { "description": "Just a stick." } }
            ])
        );

        let first = clean_file(file.path(), &stripper(), false).unwrap();
        assert_eq!(first.removed_count, 1);
        let after_first = fs::read_to_string(file.path()).unwrap();
        assert!(!after_first.contains("This sword"));
        assert!(after_first.contains("\n  {"));

        let second = clean_file(file.path(), &stripper(), false).unwrap();
        assert_eq!(second.removed_count, 0);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), after_first);
    }

    #[test]
    fn key_order_is_preserved() {
        let file = write_temp(&json!([]));
        fs::write(file.path(), r#"[{"name":"z","metadata":{"description":"Ok."},"alpha":1}]"#).unwrap();
        clean_file(file.path(), &stripper(), false).unwrap();
        let text = fs::read_to_string(file.path()).unwrap();
        assert!(text.find("\"name\"").unwrap() < text.find("\"alpha\"").unwrap());
    }

    #[test]
    fn dry_run_leaves_file() {
        let file = write_temp(&json!([{ "metadata": { "description": "Hm. This sword." } }]));
        let before = fs::read_to_string(file.path()).unwrap();
        let report = clean_file(file.path(), &stripper(), true).unwrap();
        assert_eq!(report.removed_count, 1);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), before);
    }

    #[test]
    fn rejects_non_array() {
        let file = write_temp(&json!({ "metadata": {} }));
        let err = clean_file(file.path(), &stripper(), false).unwrap_err();
        assert!(matches!(err, CleanError::NotAnArray));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = clean_file(dir.path().join("nope.json"), &stripper(), false).unwrap_err();
        assert!(matches!(err, CleanError::Io(_)));
    }
}

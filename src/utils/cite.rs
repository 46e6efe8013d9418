//! Citation formatting for file names.
//!
//! The citation stem follows the Japanese humanities convention used for the
//! renamed files:
//!
//! ```text
//! {author}, {year}, 「{title}」{journal}（{issue}）{volume}, p.{first}-{last}
//! ```

use crate::models::BibliographicRecord;

/// Format a record as a citation stem.
///
/// Pure: the result depends only on the record's fields. Missing fields render
/// as empty strings; a missing issue drops its parentheses entirely.
pub fn format_citation(record: &BibliographicRecord) -> String {
    let issue = if record.issue.is_empty() {
        String::new()
    } else {
        format!("（{}）", record.issue)
    };

    format!(
        "{}, {}, 「{}」{}{}{}, p.{}-{}",
        record.author,
        record.year(),
        record.title,
        record.journal,
        issue,
        record.volume,
        record.first_page,
        record.last_page
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;

    fn sample_record() -> BibliographicRecord {
        RecordBuilder::new()
            .author("Tanaka")
            .date("2019-05-01")
            .title("Study X")
            .journal("J. Foo")
            .issue("3")
            .volume("12")
            .pages("1", "10")
            .build()
    }

    #[test]
    fn test_full_record() {
        assert_eq!(
            format_citation(&sample_record()),
            "Tanaka, 2019, 「Study X」J. Foo（3）12, p.1-10"
        );
    }

    #[test]
    fn test_missing_issue_has_no_parentheses() {
        let mut record = sample_record();
        record.issue.clear();
        assert_eq!(
            format_citation(&record),
            "Tanaka, 2019, 「Study X」J. Foo12, p.1-10"
        );
    }

    #[test]
    fn test_empty_record_renders_blanks() {
        let citation = format_citation(&BibliographicRecord::default());
        assert_eq!(citation, ", , 「」, p.-");
        assert!(!citation.contains("None"));
        assert!(!citation.contains("null"));
    }

    #[test]
    fn test_idempotent() {
        let record = sample_record();
        assert_eq!(format_citation(&record), format_citation(&record));
    }
}

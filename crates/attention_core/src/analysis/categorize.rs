//! Keyword-based domain categorizer.
//!
//! # Responsibility
//! - Map record text to exactly one [`DomainLabel`].
//!
//! # Invariants
//! - Pure: output depends only on the text and the keyword table.
//! - Domains are tried in priority order; the first domain with any
//!   substring hit wins. No hit yields `Other`.

use crate::config::KeywordConfig;
use crate::model::activity::{ActivityRecord, ClassifiedRecord};
use crate::model::domain::DomainLabel;

/// Domain plus the keyword that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch<'k> {
    pub domain: DomainLabel,
    /// `None` when the result is the `Other` fallback.
    pub keyword: Option<&'k str>,
}

/// Categorizes free text fields into a domain.
pub fn categorize<S: AsRef<str>>(
    keywords: &KeywordConfig,
    title: &str,
    description: &str,
    tags: &[S],
) -> DomainLabel {
    categorize_with_match(keywords, title, description, tags).domain
}

/// Like [`categorize`], also returning the matched keyword.
pub fn categorize_with_match<'k, S: AsRef<str>>(
    keywords: &'k KeywordConfig,
    title: &str,
    description: &str,
    tags: &[S],
) -> CategoryMatch<'k> {
    let text = searchable_text(title, description, tags);

    for domain in DomainLabel::MATCHABLE {
        if let Some(keyword) = keywords
            .keywords(domain)
            .iter()
            .find(|keyword| text.contains(keyword.as_str()))
        {
            return CategoryMatch {
                domain,
                keyword: Some(keyword.as_str()),
            };
        }
    }

    CategoryMatch {
        domain: DomainLabel::Other,
        keyword: None,
    }
}

/// Classifies one activity record.
pub fn classify_record(keywords: &KeywordConfig, record: ActivityRecord) -> ClassifiedRecord {
    let tags = record.tags().iter().collect::<Vec<_>>();
    let domain = categorize(keywords, record.title(), record.description(), &tags);
    ClassifiedRecord::new(record, domain)
}

/// Classifies a batch; order of the output matches the input.
pub fn classify_all(keywords: &KeywordConfig, records: Vec<ActivityRecord>) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| classify_record(keywords, record))
        .collect()
}

fn searchable_text<S: AsRef<str>>(title: &str, description: &str, tags: &[S]) -> String {
    let mut text = String::with_capacity(title.len() + description.len() + 1);
    text.push_str(title);
    text.push(' ');
    text.push_str(description);
    for tag in tags {
        text.push(' ');
        text.push_str(tag.as_ref());
    }
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{categorize, categorize_with_match};
    use crate::config::KeywordConfig;
    use crate::model::domain::DomainLabel;

    const NO_TAGS: &[&str] = &[];

    #[test]
    fn write_blog_post_is_generation() {
        let keywords = KeywordConfig::default();
        let matched = categorize_with_match(&keywords, "Write blog post", "", NO_TAGS);
        assert_eq!(matched.domain, DomainLabel::Generation);
        assert_eq!(matched.keyword, Some("write"));
    }

    #[test]
    fn priority_order_breaks_ties() {
        // "code" (Generation) and "lunch" (Connection) both match.
        let keywords = KeywordConfig::default();
        assert_eq!(
            categorize(&keywords, "Lunch and code review", "", NO_TAGS),
            DomainLabel::Generation
        );
    }

    #[test]
    fn description_and_tags_are_searched() {
        let keywords = KeywordConfig::default();
        assert_eq!(
            categorize(&keywords, "Tuesday", "Morning YOGA session", NO_TAGS),
            DomainLabel::Vitality
        );
        assert_eq!(
            categorize(&keywords, "Tuesday", "", &["Meditate"]),
            DomainLabel::Charging
        );
    }

    #[test]
    fn unmatched_text_is_other() {
        let keywords = KeywordConfig::default();
        assert_eq!(
            categorize(&keywords, "Errands", "pick up package", NO_TAGS),
            DomainLabel::Other
        );
        assert_eq!(categorize(&keywords, "", "", NO_TAGS), DomainLabel::Other);
    }

    #[test]
    fn custom_table_changes_result_without_touching_algorithm() {
        let keywords = KeywordConfig::new([(DomainLabel::Growth, vec!["errands"])]).unwrap();
        assert_eq!(
            categorize(&keywords, "Errands", "", NO_TAGS),
            DomainLabel::Growth
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let keywords = KeywordConfig::default();
        let inputs = [
            ("Team standup", "daily sync"),
            ("", "unknown"),
            ("Dentist", "checkup"),
            ("Read paper", "ml"),
        ];
        for (title, description) in inputs {
            let first = categorize(&keywords, title, description, NO_TAGS);
            for _ in 0..3 {
                assert_eq!(categorize(&keywords, title, description, NO_TAGS), first);
            }
            assert!(DomainLabel::ALL.contains(&first));
        }
    }
}

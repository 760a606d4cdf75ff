//! Field caps and HTML cleaning applied before a group is persisted

use crate::model::{GroupChanges, GroupFields};

pub const SHORT_NAME_MAX: usize = 50;
pub const NAME_MAX: usize = 200;
pub const CLAIM_MAX: usize = 1000;
pub const DESCRIPTION_MAX: usize = 640 * 1024;

/// Cut `s` to at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Strip scripts and unsafe markup from rich text
pub fn sane_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Drop a tag or entity left open at the end of a cut string
fn trim_open_markup(s: &str) -> &str {
    let mut end = s.len();
    if let Some(lt) = s.rfind('<') {
        if s[lt..].find('>').is_none() {
            end = end.min(lt);
        }
    }
    if let Some(amp) = s[..end].rfind('&') {
        if s[amp..end].find(';').is_none() {
            end = amp;
        }
    }
    &s[..end]
}

/// Clean rich text and keep the cleaned result within `max` characters.
///
/// Cleaning escapes characters and can grow the text, so the cap is applied
/// to the output. The cleaned text is cut and cleaned again, moving the cut
/// point left until the result fits.
pub fn sane_html_capped(html: &str, max: usize) -> String {
    let cleaned = sane_html(&truncate_chars(html, max));
    if cleaned.chars().count() <= max {
        return cleaned;
    }

    let mut limit = max;
    loop {
        let cut = truncate_chars(&cleaned, limit);
        let recleaned = sane_html(trim_open_markup(&cut));
        let len = recleaned.chars().count();
        if len <= max {
            return recleaned;
        }
        limit = limit.saturating_sub(len - max);
    }
}

/// Turn caller-supplied changes into the field set that gets stored.
///
/// An empty short name is ignored; every other present field is written,
/// even when empty.
pub fn clean_changes(changes: &GroupChanges) -> GroupFields {
    GroupFields {
        short_name: changes
            .short_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| truncate_chars(s, SHORT_NAME_MAX)),
        name: changes.name.as_deref().map(|s| truncate_chars(s, NAME_MAX)),
        claim: changes.claim.as_deref().map(|s| truncate_chars(s, CLAIM_MAX)),
        description: changes
            .description
            .as_deref()
            .map(|s| sane_html_capped(s, DESCRIPTION_MAX)),
        time_last_edited: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let s = "ääääü";
        assert_eq!(truncate_chars(s, 4), "ääää");
    }

    #[test]
    fn test_sane_html_strips_script() {
        let cleaned = sane_html("<p>hi</p><script>alert(1)</script>");
        assert!(cleaned.contains("<p>hi</p>"));
        assert!(!cleaned.contains("script"));
    }

    #[test]
    fn test_escaped_description_stays_within_cap() {
        let changes = GroupChanges {
            description: Some("&".repeat(DESCRIPTION_MAX)),
            ..Default::default()
        };
        let description = clean_changes(&changes).description.unwrap();
        assert!(description.chars().count() <= DESCRIPTION_MAX);
        assert!(description.starts_with("&amp;"));
        assert!(description.ends_with("&amp;"));
    }

    #[test]
    fn test_capped_cut_never_leaves_open_markup() {
        let cleaned = sane_html_capped("<b>a&b</b><i>c<d</i>", 12);
        assert!(cleaned.chars().count() <= 12);
        assert!(cleaned.starts_with("<b>a"));
        assert_eq!(cleaned, sane_html(&cleaned));

        assert_eq!(sane_html_capped("a<b>", 100), "a<b></b>");
        assert_eq!(sane_html_capped("<<<<", 6), "&lt;");
    }

    #[test]
    fn test_trim_open_markup() {
        assert_eq!(trim_open_markup("ab&am"), "ab");
        assert_eq!(trim_open_markup("ab<spa"), "ab");
        assert_eq!(trim_open_markup("a&amp;<b>c"), "a&amp;<b>c");
    }

    #[test]
    fn test_clean_changes() {
        let changes = GroupChanges {
            short_name: Some(String::new()),
            name: Some("A".repeat(500)),
            claim: Some(String::new()),
            description: None,
        };
        let fields = clean_changes(&changes);
        assert_eq!(fields.short_name, None);
        assert_eq!(fields.name.as_ref().map(|n| n.chars().count()), Some(NAME_MAX));
        assert_eq!(fields.claim.as_deref(), Some(""));
        assert_eq!(fields.description, None);
    }

    #[test]
    fn test_clean_changes_caps_short_name_and_claim() {
        let changes = GroupChanges {
            short_name: Some("s".repeat(80)),
            claim: Some("c".repeat(1500)),
            ..Default::default()
        };
        let fields = clean_changes(&changes);
        assert_eq!(fields.short_name.map(|s| s.len()), Some(SHORT_NAME_MAX));
        assert_eq!(fields.claim.map(|s| s.len()), Some(CLAIM_MAX));
    }
}

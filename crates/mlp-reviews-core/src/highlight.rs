//! Match highlighting for the list view.
//!
//! [`highlight`] wraps matched spans in a `<mark>` element over unescaped
//! text, for terminal output. Anything rendered as HTML uses
//! [`highlight_html`], which escapes the text between markers as it builds.

use crate::fuzzy::{FieldKey, MatchLocation};

pub const MARK_OPEN: &str = "<mark class=\"search-highlight\">";
pub const MARK_CLOSE: &str = "</mark>";

/// Title and summary spans that fit `text`, sorted, with overlapping or
/// touching spans merged.
fn marked_spans(text: &str, matches: &[MatchLocation]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = matches
        .iter()
        .filter(|m| matches!(m.field, FieldKey::Title | FieldKey::Summary))
        .filter(|m| {
            m.start < m.end
                && m.end <= text.len()
                && text.is_char_boundary(m.start)
                && text.is_char_boundary(m.end)
        })
        .map(|m| (m.start, m.end))
        .collect();

    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn render(text: &str, matches: &[MatchLocation], segment: fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in marked_spans(text, matches) {
        out.push_str(&segment(&text[cursor..start]));
        out.push_str(MARK_OPEN);
        out.push_str(&segment(&text[start..end]));
        out.push_str(MARK_CLOSE);
        cursor = end;
    }
    out.push_str(&segment(&text[cursor..]));
    out
}

/// Wrap matched spans of `text` in highlight markers.
///
/// Only title and summary matches are considered; other fields are never
/// highlighted. Returns `text` unchanged when no match qualifies.
pub fn highlight(text: &str, matches: &[MatchLocation]) -> String {
    render(text, matches, |s| s.to_string())
}

/// Like [`highlight`], but every text segment is HTML-escaped. The markers
/// are the only markup in the output.
pub fn highlight_html(text: &str, matches: &[MatchLocation]) -> String {
    render(text, matches, escape_html)
}

fn own_matches(field: FieldKey, matches: &[MatchLocation]) -> Vec<MatchLocation> {
    matches
        .iter()
        .filter(|m| m.field == field && m.value_index == 0)
        .copied()
        .collect()
}

/// Highlight one field's text using only that field's matches.
pub fn highlight_field(text: &str, field: FieldKey, matches: &[MatchLocation]) -> String {
    highlight(text, &own_matches(field, matches))
}

/// [`highlight_field`] for HTML sinks.
pub fn highlight_field_html(text: &str, field: FieldKey, matches: &[MatchLocation]) -> String {
    highlight_html(text, &own_matches(field, matches))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(field: FieldKey, start: usize, end: usize) -> MatchLocation {
        MatchLocation {
            field,
            value_index: 0,
            start,
            end,
        }
    }

    fn strip_marks(s: &str) -> String {
        s.replace(MARK_OPEN, "").replace(MARK_CLOSE, "")
    }

    #[test]
    fn test_no_matches_is_identity() {
        assert_eq!(highlight("Quantum Computing", &[]), "Quantum Computing");
    }

    #[test]
    fn test_ignores_non_display_fields() {
        let text = "Quantum Computing";
        assert_eq!(highlight(text, &[at(FieldKey::Content, 0, 7)]), text);
        assert_eq!(highlight(text, &[at(FieldKey::Tags, 0, 7)]), text);
    }

    #[test]
    fn test_two_spans_preserve_other_text() {
        let text = "Quantum Computing in Cryptography";
        let out = highlight(
            text,
            &[at(FieldKey::Title, 21, 33), at(FieldKey::Title, 0, 7)],
        );
        assert_eq!(
            out,
            format!(
                "{o}Quantum{c} Computing in {o}Cryptography{c}",
                o = MARK_OPEN,
                c = MARK_CLOSE
            )
        );
        assert_eq!(strip_marks(&out), text);
    }

    #[test]
    fn test_overlapping_and_adjacent_spans_merge() {
        let text = "abcdefgh";
        let out = highlight(
            text,
            &[
                at(FieldKey::Title, 0, 3),
                at(FieldKey::Title, 2, 5),
                at(FieldKey::Title, 5, 6),
            ],
        );
        assert_eq!(out, format!("{}abcdef{}gh", MARK_OPEN, MARK_CLOSE));
    }

    #[test]
    fn test_out_of_range_spans_skipped() {
        let text = "héllo";
        // 2 is inside the two-byte 'é'
        let out = highlight(text, &[at(FieldKey::Title, 2, 4), at(FieldKey::Title, 3, 99)]);
        assert_eq!(out, text);
    }

    #[test]
    fn test_highlight_field_uses_own_matches() {
        let matches = [at(FieldKey::Title, 0, 3), at(FieldKey::Summary, 4, 7)];
        let out = highlight_field("one two", FieldKey::Summary, &matches);
        assert_eq!(out, format!("one {}two{}", MARK_OPEN, MARK_CLOSE));
    }

    #[test]
    fn test_html_escapes_text_keeps_markers() {
        let out = highlight_html("<b>x</b> & y", &[at(FieldKey::Title, 3, 4)]);
        assert_eq!(
            out,
            format!("&lt;b&gt;{}x{}&lt;/b&gt; &amp; y", MARK_OPEN, MARK_CLOSE)
        );
    }

    #[test]
    fn test_html_literal_marker_text_stays_escaped() {
        let title = "Beyond </mark> tags";
        let out = highlight_html(title, &[at(FieldKey::Title, 0, 6)]);
        assert_eq!(
            out,
            format!("{}Beyond{} &lt;/mark&gt; tags", MARK_OPEN, MARK_CLOSE)
        );
        assert_eq!(out.matches(MARK_CLOSE).count(), 1);
    }
}

//! Small text helpers for outgoing Telegram messages (HTML parse mode).

/// Escape the characters Telegram's HTML parse mode treats specially.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Truncate on a char boundary, appending `...` when anything was cut.
pub fn truncate_title(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_special_chars() {
        assert_eq!(escape_html("a <b> & c"), "a &lt;b&gt; &amp; c");
    }

    #[test]
    fn truncates_long_titles_with_ellipsis() {
        assert_eq!(truncate_title("short", 10), "short");
        assert_eq!(truncate_title("abcdefghij", 5), "abcde...");
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let s = "héllo wörld";
        let t = truncate_title(s, 4);
        assert_eq!(t, "héll...");
    }
}

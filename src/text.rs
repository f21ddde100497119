//! Plain-text projection of rich-text note content.
//!
//! The supported markup vocabulary is a small fixed tag set, so a character
//! scan is enough: tags are stripped, block-level boundaries become newlines,
//! and a fixed entity set is decoded. This projection is the canonical text
//! for searching and for the emptiness test.

/// Tags whose presence marks a line break in the projection.
const BREAK_TAGS: [&str; 5] = ["br", "br/", "/p", "/div", "/li"];

/// Strip markup from `content`, decoding `&amp; &lt; &gt; &quot; &#39; &nbsp;`
/// and emitting `\n` for `<br>` and closing block tags.
pub fn plain_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => {
                // consume through the closing '>'; an unterminated tag
                // swallows the remainder, same as the platform projection
                let Some(end) = rest.find('>') else {
                    break;
                };
                let name: String = rest[1..end]
                    .trim()
                    .chars()
                    .take_while(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if BREAK_TAGS.contains(&name.as_str()) {
                    out.push('\n');
                }
                rest = &rest[end + 1..];
            }
            '&' => {
                let (decoded, len) = decode_entity(rest);
                out.push_str(decoded);
                rest = &rest[len..];
            }
            _ => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    out
}

/// The canonical emptiness test: blank iff the projection trims to nothing.
pub fn is_blank(content: &str) -> bool {
    plain_text(content).trim().is_empty()
}

/// Decode the entity at the head of `s` (which starts with '&'). Returns the
/// replacement text and how many input bytes it consumed. Unknown entities
/// pass through as a literal '&'.
fn decode_entity(s: &str) -> (&'static str, usize) {
    const ENTITIES: [(&str, &str); 6] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", " "),
    ];
    for (entity, replacement) in ENTITIES {
        if s.starts_with(entity) {
            return (replacement, entity.len());
        }
    }
    ("&", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags() {
        assert_eq!(plain_text("<b>bold</b> and <i>italic</i>"), "bold and italic");
    }

    #[test]
    fn test_block_tags_become_newlines() {
        assert_eq!(plain_text("<p>one</p><p>two</p>"), "one\ntwo\n");
        assert_eq!(plain_text("a<br>b"), "a\nb");
        assert_eq!(plain_text("a<br/>b"), "a\nb");
    }

    #[test]
    fn test_decodes_entity_set() {
        assert_eq!(plain_text("a &amp; b"), "a & b");
        assert_eq!(plain_text("&lt;b&gt;"), "<b>");
        assert_eq!(plain_text("&quot;hi&quot; it&#39;s&nbsp;ok"), "\"hi\" it's ok");
    }

    #[test]
    fn test_unknown_entity_passes_through() {
        assert_eq!(plain_text("&bogus; x"), "&bogus; x");
    }

    #[test]
    fn test_tag_attributes_ignored() {
        assert_eq!(plain_text(r#"<span style="x">s</span>"#), "s");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(is_blank("<p><br></p>"));
        assert!(is_blank("&nbsp;&nbsp;"));
        assert!(!is_blank("<p>x</p>"));
    }
}

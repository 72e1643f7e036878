//! Making server-provided text safe to display.

/// Trim, encode markup-significant characters, collapse whitespace, and cap
/// the result at `cap` characters.
pub fn sanitize_text(input: &str, cap: usize) -> String {
    let mut out = String::with_capacity(input.len().min(cap));
    let mut chars = 0usize;
    let mut pending_space = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        let encoded = match ch {
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#x27;",
            '/' => "&#x2F;",
            '\\' => "&#x5C;",
            '&' => "&amp;",
            _ => "",
        };
        let width = if encoded.is_empty() { 1 } else { encoded.len() };
        let extra = usize::from(pending_space);
        if chars + extra + width > cap {
            break;
        }

        if pending_space {
            out.push(' ');
            chars += 1;
            pending_space = false;
        }
        if encoded.is_empty() {
            out.push(ch);
        } else {
            out.push_str(encoded);
        }
        chars += width;
    }

    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn encodes_markup() {
        assert_eq!(
            sanitize_text("<b>bad</b>", 200),
            "&lt;b&gt;bad&lt;&#x2F;b&gt;"
        );
        assert_eq!(sanitize_text("it's \"x\"", 200), "it&#x27;s &quot;x&quot;");
    }

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(sanitize_text("  invalid \n\t credentials  ", 200), "invalid credentials");
    }

    #[test]
    fn caps_length_without_splitting_entities() {
        assert_eq!(sanitize_text("abcdef", 3), "abc");
        assert_eq!(sanitize_text("ab<c", 4), "ab");
    }

    proptest! {
        #[test]
        fn output_is_bounded_and_markup_free(input in ".{0,300}", cap in 0usize..250) {
            let out = sanitize_text(&input, cap);
            prop_assert!(out.chars().count() <= cap);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
            prop_assert!(!out.contains("  "));
        }
    }
}

//! Front-matter splitting for markdown notes
//!
//! A note may start with a `---` fenced YAML header; everything after the
//! closing fence is the body.

/// Split `text` into its front-matter header and body
///
/// Returns `(None, text)` when there is no complete header.
#[must_use]
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---")
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(|c| c == '\r' || c == '\n') == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

/// Body of a note with any front-matter header removed
#[must_use]
pub fn strip_front_matter(text: &str) -> &str {
    split_front_matter(text).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_header() {
        assert_eq!(split_front_matter("# Notes\nbody"), (None, "# Notes\nbody"));
    }

    #[test]
    fn header_and_body() {
        let text = "---\ntitle: Alpha\ntags: [x]\n---\n\nBody line\n";
        let (header, body) = split_front_matter(text);
        assert_eq!(header, Some("title: Alpha\ntags: [x]\n"));
        assert_eq!(body, "\nBody line\n");
    }

    #[test]
    fn empty_header() {
        assert_eq!(split_front_matter("---\n---\nbody"), (Some(""), "body"));
    }

    #[test]
    fn crlf_fences() {
        let (header, body) = split_front_matter("---\r\na: 1\r\n---\r\nbody");
        assert_eq!(header, Some("a: 1\r\n"));
        assert_eq!(body, "body");
    }

    #[test]
    fn unterminated_header_is_body() {
        let text = "---\na: 1\nno closing fence";
        assert_eq!(strip_front_matter(text), text);
    }

    #[test]
    fn fence_must_open_the_file() {
        let text = "intro\n---\na: 1\n---\n";
        assert_eq!(strip_front_matter(text), text);
    }
}

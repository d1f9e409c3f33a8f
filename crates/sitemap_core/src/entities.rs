use std::borrow::Cow;

/// Decode the predefined XML entities and numeric character references in a field value.
///
/// Unknown or unterminated references are kept as written.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(decode_entities("no entities"), Cow::Borrowed(_)));
    }

    #[test]
    fn predefined_entities_are_decoded() {
        assert_eq!(
            decode_entities("https://example.com/?a=1&amp;b=2&lt;&gt;&quot;&apos;"),
            "https://example.com/?a=1&b=2<>\"'"
        );
    }

    #[test]
    fn numeric_references_are_decoded() {
        assert_eq!(decode_entities("&#9730; &#x2602;"), "☂ ☂");
    }

    #[test]
    fn unknown_references_are_kept() {
        assert_eq!(decode_entities("a&nbsp;b & c&"), "a&nbsp;b & c&");
    }
}

//! Helpers for definitions embedded in a hosting document.

/// Prefix of the ids assigned to embedded definitions.
pub(crate) const CHART_ID_PREFIX: &str = "merrowChart";

/// Returns the id of the `n`-th chart rendered by page initialisation.
pub(crate) fn chart_id(n: usize) -> String {
    format!("{CHART_ID_PREFIX}{n}")
}

/// Decodes the character references a document leaves in element text and
/// trims the result.
///
/// Named references cover the markup-significant characters; numeric
/// references may be decimal or hex. Anything unrecognised is kept verbatim.
pub(crate) fn decode_definition(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(at) = rest.find('&') {
        decoded.push_str(&rest[..at]);
        rest = &rest[at..];

        let reference = rest
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
        match reference {
            Some((c, end)) => {
                decoded.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);

    decoded.trim().to_string()
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_references() {
        assert_eq!(
            decode_definition("  graph TD\na--&gt;b &amp;&lt;&quot;  "),
            "graph TD\na-->b &<\""
        );
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_definition("a&#45;&#x3E;b"), "a->b");
    }

    #[test]
    fn test_unknown_references_kept() {
        assert_eq!(decode_definition("a & b &bogus; c&"), "a & b &bogus; c&");
    }

    #[test]
    fn test_chart_ids() {
        assert_eq!(chart_id(0), "merrowChart0");
        assert_eq!(chart_id(12), "merrowChart12");
    }
}

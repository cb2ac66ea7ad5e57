use crate::constants;

/// Converts a string to kebab-case
///
/// - `camelCase`: `"volumeType"` -> "volume-type"
/// - `snake_case`: `"availability_zone"` -> "availability-zone"
/// - Acronyms: `"vpcID"` -> "vpc-id"
///
/// Apostrophes are dropped, other separators collapse into a single hyphen
/// and leading/trailing hyphens are trimmed.
#[must_use]
pub fn to_kebab_case(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    let mut last_was_sep = true;
    let mut last_was_lower = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {}
            c if c.is_alphanumeric() => {
                let is_upper = c.is_uppercase();

                if !last_was_sep && is_upper && last_was_lower {
                    result.push('-');
                } else if !last_was_sep
                    && is_upper
                    && chars.peek().is_some_and(|&next| next.is_lowercase())
                    && !result.is_empty()
                {
                    // acronym followed by a word: "HTTPSConnection" -> "https-connection"
                    result.push('-');
                }

                for lower_ch in c.to_lowercase() {
                    result.push(lower_ch);
                }

                last_was_sep = false;
                last_was_lower = c.is_lowercase() || c.is_numeric();
            }
            _ => {
                if !last_was_sep && !result.is_empty() {
                    result.push('-');
                    last_was_sep = true;
                    last_was_lower = false;
                }
            }
        }
    }

    result.trim_end_matches('-').to_string()
}

/// Normalizes a flag name segment by segment, keeping the `.` separators
/// used by namespaces and child flags intact.
#[must_use]
pub fn normalize_flag_name(name: &str) -> String {
    name.split(constants::CHILD_FLAG_SEPARATOR)
        .map(|segment| {
            let kebab = to_kebab_case(segment);
            if kebab.is_empty() {
                segment.to_string()
            } else {
                kebab
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Case-insensitive header lookup.
#[must_use]
pub fn find_header<'a, V>(
    headers: impl IntoIterator<Item = (&'a String, &'a V)>,
    name: &str,
) -> Option<&'a V>
where
    V: 'a,
{
    headers
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Returns the first sentence-like fragment of a description, used as a
/// short label for child flags.
#[must_use]
pub fn short_description(text: &str) -> String {
    let cut = text
        .find([',', '.', ':', '('])
        .filter(|&i| i > 0)
        .map_or(text, |i| &text[..i]);
    cut.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_to_kebab_case() {
        assert_eq!(to_kebab_case("volumeType"), "volume-type");
        assert_eq!(to_kebab_case("availability_zone"), "availability-zone");
        assert_eq!(to_kebab_case("vpcID"), "vpc-id");
        assert_eq!(to_kebab_case("HTTPSConnection"), "https-connection");
        assert_eq!(to_kebab_case("name"), "name");
        assert_eq!(to_kebab_case("_startWithUnderscore"), "start-with-underscore");
        assert_eq!(to_kebab_case("trailing---"), "trailing");
        assert_eq!(to_kebab_case("don't"), "dont");
        assert_eq!(to_kebab_case(""), "");
    }

    #[test]
    fn test_normalize_flag_name_keeps_dots() {
        assert_eq!(normalize_flag_name("control.dryRun"), "control.dry-run");
        assert_eq!(normalize_flag_name("param.volume_id"), "param.volume-id");
        assert_eq!(normalize_flag_name("simple"), "simple");
    }

    #[test]
    fn test_find_header_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Request-Id".to_string(), "abc".to_string());
        assert_eq!(find_header(&headers, "x-request-id"), Some(&"abc".to_string()));
        assert_eq!(find_header(&headers, "missing"), None);
    }

    #[test]
    fn test_short_description() {
        assert_eq!(short_description("Volume settings. Used on create"), "Volume settings");
        assert_eq!(short_description("Network (optional)"), "Network");
        assert_eq!(short_description(".leading"), ".leading");
        assert_eq!(short_description(""), "");
    }
}

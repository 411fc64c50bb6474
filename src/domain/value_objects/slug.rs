//! Name slugs used to match records across sources

/// Normalize a display name into a case-insensitive, punctuation-free slug.
///
/// Quotes are dropped outright ("O'Neil" -> "oneil"), every other run of
/// whitespace or punctuation collapses to a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if matches!(ch, '\'' | '"' | '`' | '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}') {
            continue;
        }
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Mattrim 'Threestrings' Mereg"), "mattrim-threestrings-mereg");
        assert_eq!(slugify("  Sildar   Hallwinter "), "sildar-hallwinter");
        assert_eq!(slugify("Gundren_Rockseeker!!"), "gundren-rockseeker");
        assert_eq!(slugify("O'Neil"), "oneil");
        assert_eq!(slugify("???"), "");
    }
}

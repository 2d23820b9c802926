/// Lowercase ASCII slug: alphanumerics kept, everything else folded into single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

/// Use the explicit slug if given, otherwise derive one from the name.
pub fn resolve(explicit: Option<&str>, name: &str) -> Option<String> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slugify(s),
        None => slugify(name),
    };
    (!slug.is_empty()).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Honey Blonde  Body-Wave 24\""), "honey-blonde-body-wave-24");
        assert_eq!(slugify("  --Bob Wig--  "), "bob-wig");
        assert_eq!(slugify("613 / Platinum"), "613-platinum");
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(slugify("Café Crème"), "caf-cr-me");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn resolve_prefers_explicit() {
        assert_eq!(resolve(Some("Custom Slug"), "Name"), Some("custom-slug".into()));
        assert_eq!(resolve(Some("   "), "Kinky Curly"), Some("kinky-curly".into()));
        assert_eq!(resolve(None, "???"), None);
    }

    #[test]
    fn validity() {
        assert!(is_valid_slug("body-wave-wig"));
        assert!(!is_valid_slug("Body Wave"));
        assert!(!is_valid_slug(""));
    }
}

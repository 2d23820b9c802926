//! Best-effort association of a color name (as typed on a variant) with
//! attribute terms or a known swatch image.
//!
//! Tiers are tried in order and the first hit wins: exact, substring
//! containment in either direction, shared tokens, then a static keyword
//! dictionary of hair color names and codes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Contains,
    Token,
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorMatch {
    /// Index into the candidate slice.
    Candidate { index: usize, tier: MatchTier },
    Keyword { keyword: &'static str, path: &'static str },
}

impl ColorMatch {
    pub fn tier(&self) -> MatchTier {
        match self {
            ColorMatch::Candidate { tier, .. } => *tier,
            ColorMatch::Keyword { .. } => MatchTier::Keyword,
        }
    }
}

const STOP_TOKENS: [&str; 7] = ["color", "colour", "hair", "wig", "shade", "tone", "col"];

/// Keyword to swatch path. Order matters: two-tone and numbered codes come
/// before the generic words they often appear with.
const KEYWORD_SWATCHES: [(&str, &str); 31] = [
    ("ombre", "/swatches/ombre.jpg"),
    ("99j", "/swatches/burgundy.jpg"),
    ("burgundy", "/swatches/burgundy.jpg"),
    ("wine", "/swatches/burgundy.jpg"),
    ("613", "/swatches/platinum-blonde.jpg"),
    ("platinum", "/swatches/platinum-blonde.jpg"),
    ("27", "/swatches/honey-blonde.jpg"),
    ("honey", "/swatches/honey-blonde.jpg"),
    ("ginger", "/swatches/ginger.jpg"),
    ("copper", "/swatches/ginger.jpg"),
    ("orange", "/swatches/ginger.jpg"),
    ("30", "/swatches/auburn.jpg"),
    ("auburn", "/swatches/auburn.jpg"),
    ("350", "/swatches/ginger.jpg"),
    ("grey", "/swatches/grey.jpg"),
    ("gray", "/swatches/grey.jpg"),
    ("silver", "/swatches/grey.jpg"),
    ("red", "/swatches/red.jpg"),
    ("pink", "/swatches/pink.jpg"),
    ("blue", "/swatches/blue.jpg"),
    ("blonde", "/swatches/blonde.jpg"),
    ("blond", "/swatches/blonde.jpg"),
    ("chocolate", "/swatches/brown.jpg"),
    ("brown", "/swatches/brown.jpg"),
    ("4", "/swatches/dark-brown.jpg"),
    ("2", "/swatches/darkest-brown.jpg"),
    ("1b", "/swatches/natural-black.jpg"),
    ("natural", "/swatches/natural-black.jpg"),
    ("1", "/swatches/jet-black.jpg"),
    ("jet", "/swatches/jet-black.jpg"),
    ("black", "/swatches/natural-black.jpg"),
];

/// Lowercase, map `-`, `_`, `/` to spaces, drop `#`, collapse whitespace.
pub fn normalize(name: &str) -> String {
    let mapped: String = name
        .chars()
        .filter(|c| *c != '#')
        .map(|c| match c {
            '-' | '_' | '/' | ',' | '(' | ')' => ' ',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|t| t.len() > 1 || t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !t.is_empty() && !STOP_TOKENS.contains(t))
        .collect()
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// Substring containment with spaces ignored. Needles carrying a digit are
/// hair codes and only match whole words, so `2` never hits `27`.
fn contains(haystack: &str, needle: &str) -> bool {
    if needle.chars().any(|c| c.is_ascii_digit()) {
        return contains_words(haystack, needle);
    }
    let compact = |s: &str| s.replace(' ', "");
    compact(haystack).contains(&compact(needle))
}

pub fn match_color<S: AsRef<str>>(name: &str, candidates: &[S]) -> Option<ColorMatch> {
    let target = normalize(name);
    if target.is_empty() {
        return None;
    }
    let normalized: Vec<String> = candidates.iter().map(|c| normalize(c.as_ref())).collect();

    if let Some(index) = normalized.iter().position(|c| *c == target) {
        return Some(ColorMatch::Candidate {
            index,
            tier: MatchTier::Exact,
        });
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in normalized.iter().enumerate() {
        if candidate.is_empty() {
            continue;
        }
        if contains(candidate, &target) || contains(&target, candidate) {
            let len = candidate.len();
            if best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((index, len));
            }
        }
    }
    if let Some((index, _)) = best {
        return Some(ColorMatch::Candidate {
            index,
            tier: MatchTier::Contains,
        });
    }

    let target_tokens = tokens(&target);
    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in normalized.iter().enumerate() {
        let shared = tokens(candidate)
            .into_iter()
            .filter(|t| target_tokens.contains(t))
            .count();
        if shared > 0 && best.is_none_or(|(_, best_shared)| shared > best_shared) {
            best = Some((index, shared));
        }
    }
    if let Some((index, _)) = best {
        return Some(ColorMatch::Candidate {
            index,
            tier: MatchTier::Token,
        });
    }

    keyword_swatch(&target_tokens)
}

fn keyword_swatch(target_tokens: &[&str]) -> Option<ColorMatch> {
    KEYWORD_SWATCHES
        .iter()
        .find(|(keyword, _)| target_tokens.contains(keyword))
        .map(|&(keyword, path)| ColorMatch::Keyword { keyword, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TERMS: [&str; 6] = [
        "Natural Black",
        "Honey Blonde",
        "#27",
        "1B/613 Ombre",
        "Burgundy 99J",
        "Blonde",
    ];

    #[test]
    fn normalization() {
        assert_eq!(normalize("  Honey-Blonde  "), "honey blonde");
        assert_eq!(normalize("#1B/613"), "1b 613");
        assert_eq!(normalize("Dark_Brown (4)"), "dark brown 4");
    }

    #[test]
    fn exact_match_ignores_case_and_separators() {
        let m = match_color("honey_blonde", &TERMS).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 1, tier: MatchTier::Exact });
        let m = match_color("27", &TERMS).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 2, tier: MatchTier::Exact });
    }

    #[test]
    fn containment_works_in_both_directions() {
        // candidate inside the name
        let m = match_color("Natural Black Body Wave", &TERMS).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 0, tier: MatchTier::Contains });
        // name inside the candidate
        let m = match_color("99J", &TERMS).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 4, tier: MatchTier::Contains });
    }

    #[test]
    fn longest_containing_candidate_wins() {
        // both "Honey Blonde" and "Blonde" are contained; the longer is more specific
        let m = match_color("Honey Blonde Highlights", &TERMS).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 1, tier: MatchTier::Contains });
    }

    #[test]
    fn containment_catches_plurals_and_joined_words() {
        let m = match_color("Blondes", &["Blonde"]).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 0, tier: MatchTier::Contains });
        let m = match_color("Honey Blonde", &["HoneyBlonde"]).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 0, tier: MatchTier::Contains });
        let m = match_color("Natural Blackish", &TERMS).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 0, tier: MatchTier::Contains });
    }

    #[test]
    fn containment_respects_word_boundaries() {
        let codes = ["2", "4"];
        assert_eq!(match_color("27", &codes).map(|m| m.tier()), Some(MatchTier::Keyword));
    }

    #[test]
    fn token_overlap_picks_most_shared() {
        let terms = ["Ash Brown", "Dark Ash Brown Mix", "Brown"];
        let m = match_color("Brown Ash Dark", &terms[..2]).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 1, tier: MatchTier::Token });
    }

    #[test]
    fn stop_words_do_not_create_matches() {
        let terms = ["Wig Color"];
        assert_eq!(match_color("Color Lilac", &terms), None);
    }

    #[test]
    fn keyword_dictionary_is_the_fallback() {
        let m = match_color("Ginger Curls", &["Natural Black"]).unwrap();
        assert_eq!(
            m,
            ColorMatch::Keyword {
                keyword: "ginger",
                path: "/swatches/ginger.jpg"
            }
        );
        let m = match_color("T1B/30", &Vec::<String>::new()).unwrap();
        assert_eq!(m.tier(), MatchTier::Keyword);
    }

    #[test]
    fn two_tone_names_prefer_ombre_swatch() {
        let m = match_color("1b 27 ombre", &Vec::<String>::new()).unwrap();
        assert_eq!(
            m,
            ColorMatch::Keyword {
                keyword: "ombre",
                path: "/swatches/ombre.jpg"
            }
        );
    }

    #[test]
    fn nothing_matches() {
        assert_eq!(match_color("Lilac", &TERMS), None);
        assert_eq!(match_color("   ", &TERMS), None);
    }

    #[test]
    fn first_candidate_wins_ties() {
        let terms = ["Jet Black", "Off Black"];
        let m = match_color("Black Jet Off", &terms).unwrap();
        assert_eq!(m, ColorMatch::Candidate { index: 0, tier: MatchTier::Token });
    }
}

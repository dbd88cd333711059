/// Normalizes a URL for comparison: drops the query string and hash
/// fragment and guarantees a trailing slash.
///
/// Applying it twice yields the same string as applying it once, so
/// already-normalized URLs can be fed back in safely.
pub fn normalize_url(url: &str) -> String {
    let mut out = url.to_string();
    if let Some(pos) = out.find('#') {
        out.truncate(pos);
    }
    if let Some(pos) = out.find('?') {
        out.truncate(pos);
    }
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Normalizes a provider/category label for matching: the multiplication
/// sign `×` becomes a plain `x`, whitespace runs collapse to single
/// spaces, surrounding whitespace is trimmed and the result is lowercased.
///
/// Site markup and config values rarely agree on exact spelling
/// ("1×2 Gaming" vs "1X2 GAMING"), so all comparisons go through here.
pub fn normalize_label(label: &str) -> String {
    label
        .replace('×', "x")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// True when `candidate` contains `target` after both are normalized.
/// Used for dropdown option lookup and result-tile validation.
pub fn label_matches(candidate: &str, target: &str) -> bool {
    normalize_label(candidate).contains(&normalize_label(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_strips_query_and_hash() {
        assert_eq!(
            normalize_url("https://example.com/games?filter=new#top"),
            "https://example.com/games/"
        );
        assert_eq!(
            normalize_url("https://example.com/games#frag?x=1"),
            "https://example.com/games/"
        );
    }

    #[test]
    fn test_normalize_url_adds_trailing_slash() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com/");
        assert_eq!(normalize_url("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_normalize_url_idempotent() {
        let urls = [
            "https://example.com/games?filter=new#top",
            "https://example.com",
            "https://example.com/a/b/",
        ];
        for url in urls {
            let once = normalize_url(url);
            assert_eq!(normalize_url(&once), once);
        }
    }

    #[test]
    fn test_normalize_label_variants_agree() {
        assert_eq!(normalize_label("1×2 Gaming"), "1x2 gaming");
        assert_eq!(normalize_label("1X2 GAMING"), "1x2 gaming");
        assert_eq!(normalize_label("  1x2   gaming "), "1x2 gaming");
    }

    #[test]
    fn test_label_matches_is_substring_match() {
        assert!(label_matches("Pragmatic Play™ Slots", "pragmatic play"));
        assert!(label_matches("1×2 Gaming", "1X2 GAMING"));
        assert!(!label_matches("NetEnt", "Play'n GO"));
    }
}

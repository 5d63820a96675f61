use prospect_core::{FilterSet, Query};
use std::collections::HashSet;

/// Query-string key carrying the page number.
const PAGE_KEY: &str = "page";

/// Compile a query, optional filters and a 1-based page index into a search locator.
///
/// Query fields are emitted in canonical order, filters afterwards in caller
/// order. Blank values are skipped, and a filter key that repeats an emitted
/// key (or the page key) is dropped. The page marker only appears past page 1,
/// and an entirely empty parameter list yields `base` unchanged.
pub fn build_search_url(
    base: &str,
    query: &Query,
    filters: Option<&FilterSet>,
    page_index: u32,
) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut params: Vec<String> = Vec::new();

    for (field, value) in query.present_fields() {
        seen.insert(field.as_str().to_string());
        params.push(format!("{}={}", field, urlencoding::encode(value)));
    }

    if let Some(filters) = filters {
        for (key, value) in filters.iter() {
            if key.trim().is_empty() || value.is_blank() {
                continue;
            }
            if key == PAGE_KEY || !seen.insert(key.to_string()) {
                tracing::debug!("Skipping filter '{}' that repeats a locator key", key);
                continue;
            }
            params.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value.as_text())
            ));
        }
    }

    if page_index > 1 {
        params.push(format!("{PAGE_KEY}={page_index}"));
    }

    if params.is_empty() {
        return base.to_string();
    }

    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{}", params.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_core::QueryField;

    const BASE: &str = "https://www.linkedin.com/search/results/people/";

    fn keys(locator: &str) -> Vec<String> {
        let url = url::Url::parse(locator).expect("valid locator");
        url.query_pairs().map(|(k, _)| k.into_owned()).collect()
    }

    #[test]
    fn test_build_url_in_canonical_order() {
        let query = Query::new()
            .with(QueryField::Company, "Google")
            .with(QueryField::Keywords, "software engineer")
            .with(QueryField::Location, "San Francisco");

        let url = build_search_url(BASE, &query, None, 1);

        assert_eq!(
            url,
            "https://www.linkedin.com/search/results/people/?keywords=software%20engineer&location=San%20Francisco&company=Google"
        );
        assert_eq!(url.matches("keywords=").count(), 1);
    }

    #[test]
    fn test_blank_query_is_bare_base() {
        assert_eq!(build_search_url(BASE, &Query::new(), None, 1), BASE);

        let blank = Query::new()
            .with(QueryField::Title, "   ")
            .with(QueryField::Industry, "");
        assert_eq!(build_search_url(BASE, &blank, None, 1), BASE);
        assert_eq!(
            build_search_url(BASE, &blank, Some(&FilterSet::new()), 0),
            BASE
        );
    }

    #[test]
    fn test_page_marker_only_after_first_page() {
        let query = Query::new().with(QueryField::Title, "CTO");

        assert_eq!(build_search_url(BASE, &query, None, 1), format!("{BASE}?title=CTO"));
        assert_eq!(
            build_search_url(BASE, &query, None, 2),
            format!("{BASE}?title=CTO&page=2")
        );
        assert_eq!(build_search_url(BASE, &Query::new(), None, 3), format!("{BASE}?page=3"));
    }

    #[test]
    fn test_filters_follow_query_in_caller_order() {
        let query = Query::new().with(QueryField::Title, "CTO");
        let filters = FilterSet::new()
            .with("network", "F")
            .with("connections", 500u64)
            .with("empty", "");

        let url = build_search_url(BASE, &query, Some(&filters), 1);

        assert_eq!(keys(&url), vec!["title", "network", "connections"]);
        assert!(url.ends_with("connections=500"));
    }

    #[test]
    fn test_no_key_appears_twice() {
        let query = Query::new().with(QueryField::Location, "Berlin");
        let filters = FilterSet::new()
            .with("location", "Munich")
            .with("page", "7")
            .with("industry", "Software");

        let url = build_search_url(BASE, &query, Some(&filters), 2);

        assert_eq!(keys(&url), vec!["location", "industry", "page"]);
        assert!(url.contains("location=Berlin"));
        assert!(url.ends_with("page=2"));
    }

    #[test]
    fn test_encoding_is_reversible() {
        let raw = "R&D / Müller, \"Senior\" 100%";
        let query = Query::new().with(QueryField::Keywords, raw);

        let url = build_search_url(BASE, &query, None, 1);
        let encoded = url
            .split_once("keywords=")
            .map(|(_, v)| v)
            .expect("keywords present");

        assert_eq!(urlencoding::decode(encoded).expect("decode"), raw);
    }

    #[test]
    fn test_deterministic() {
        let query = Query::new()
            .with(QueryField::Keywords, "data")
            .with(QueryField::Industry, "Finance");
        assert_eq!(
            build_search_url(BASE, &query, None, 2),
            build_search_url(BASE, &query, None, 2)
        );
    }
}

//! Source Trust Classifier
//!
//! Classifies the page an observation came from:
//! - **Official**: the entity's registered website (or a subdomain), or a URL
//!   whose host label or path segment is the entity's slug
//! - **Secondary**: a known listing/aggregator domain
//! - **Unknown**: everything else, including malformed URLs
//!
//! Aggregator pages are checked before slug matching because listing sites
//! routinely put the entity slug in their paths.

use crate::types::UrlClass;
use url::Url;

/// Slugs shorter than this never match by host/path token
const MIN_SLUG_MATCH_LEN: usize = 3;

/// Source Trust Classifier
pub struct SourceClassifier {
    /// Lowercased aggregator domains without a leading `www.`
    aggregator_domains: Vec<String>,
}

impl SourceClassifier {
    /// Create classifier with the given aggregator domains
    pub fn new<I, S>(aggregator_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            aggregator_domains: aggregator_domains
                .into_iter()
                .map(|d| strip_www(&d.as_ref().trim().to_ascii_lowercase()).to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Classify `url` for the entity identified by `entity_slug`
    ///
    /// Never fails: unparseable URLs and non-HTTP schemes are `Unknown`.
    pub fn classify(&self, url: &str, entity_slug: &str, official_website: Option<&str>) -> UrlClass {
        let Some((host, segments)) = parse_http_url(url) else {
            return UrlClass::Unknown;
        };

        if let Some(official_host) = official_website.and_then(parse_http_url).map(|(h, _)| h) {
            if host_matches(&host, &official_host) {
                return UrlClass::Official;
            }
        }

        if self
            .aggregator_domains
            .iter()
            .any(|domain| host_matches(&host, domain))
        {
            return UrlClass::Secondary;
        }

        if slug_matches(&host, &segments, entity_slug) {
            return UrlClass::Official;
        }

        UrlClass::Unknown
    }
}

/// Parse an http(s) URL into (host without `www.`, lowercased path segments)
fn parse_http_url(raw: &str) -> Option<(String, Vec<String>)> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = strip_www(host.trim_end_matches('.')).to_string();
    if host.is_empty() {
        return None;
    }

    let segments = parsed
        .path_segments()
        .map(|segs| {
            segs.filter(|s| !s.is_empty())
                .map(|s| s.to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default();

    Some((host, segments))
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// True if `host` is `domain` or one of its subdomains
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// True if the slug appears as a whole host label or path segment
///
/// Hyphens are ignored on the host side since domains often drop them
/// ("harvest-fair" → harvestfair.org).
fn slug_matches(host: &str, segments: &[String], entity_slug: &str) -> bool {
    let slug = entity_slug.trim().to_ascii_lowercase();
    if slug.len() < MIN_SLUG_MATCH_LEN {
        return false;
    }
    let compact_slug = slug.replace('-', "");

    let host_hit = host
        .split('.')
        .any(|label| label == slug || label.replace('-', "") == compact_slug);

    let path_hit = segments.iter().any(|segment| *segment == slug);

    host_hit || path_hit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> SourceClassifier {
        SourceClassifier::new(["everfest.com", "www.Eventbrite.com"])
    }

    #[test]
    fn test_registered_website_is_official() {
        let c = classifier();
        assert_eq!(
            c.classify("https://www.harvestfair.org/dates", "harvest-fair", Some("https://harvestfair.org")),
            UrlClass::Official
        );
        assert_eq!(
            c.classify("https://tickets.harvestfair.org/", "harvest-fair", Some("harvestfair.org/")),
            // website without scheme does not parse; slug still matches the host label
            UrlClass::Official
        );
    }

    #[test]
    fn test_subdomain_of_website_is_official() {
        let c = classifier();
        assert_eq!(
            c.classify("https://info.townfest.net/about", "other", Some("https://townfest.net")),
            UrlClass::Official
        );
    }

    #[test]
    fn test_lookalike_domain_is_not_official() {
        let c = classifier();
        assert_eq!(
            c.classify("https://nottownfest.net/", "zz", Some("https://townfest.net")),
            UrlClass::Unknown
        );
    }

    #[test]
    fn test_aggregator_is_secondary_even_with_slug_in_path() {
        let c = classifier();
        assert_eq!(
            c.classify("https://everfest.com/e/harvest-fair", "harvest-fair", None),
            UrlClass::Secondary
        );
        assert_eq!(
            c.classify("https://www.eventbrite.com/x/123", "harvest-fair", None),
            UrlClass::Secondary
        );
    }

    #[test]
    fn test_slug_in_path_is_official() {
        let c = classifier();
        assert_eq!(
            c.classify("https://cityofx.gov/events/harvest-fair", "harvest-fair", None),
            UrlClass::Official
        );
    }

    #[test]
    fn test_partial_slug_does_not_match() {
        let c = classifier();
        assert_eq!(
            c.classify("https://cityofx.gov/events/harvest-fair-2019-recap", "harvest-fair", None),
            UrlClass::Unknown
        );
    }

    #[test]
    fn test_malformed_urls_are_unknown() {
        let c = classifier();
        assert_eq!(c.classify("not a url", "harvest-fair", None), UrlClass::Unknown);
        assert_eq!(c.classify("", "harvest-fair", None), UrlClass::Unknown);
        assert_eq!(
            c.classify("ftp://harvestfair.org/file", "harvest-fair", Some("https://harvestfair.org")),
            UrlClass::Unknown
        );
    }

    #[test]
    fn test_short_slug_never_matches() {
        let c = classifier();
        assert_eq!(c.classify("https://ab.com/ab", "ab", None), UrlClass::Unknown);
    }
}

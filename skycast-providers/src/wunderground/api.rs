//! Weather Underground endpoint construction.

use skycast_core::GeoPosition;
use skycast_fetch::FetchError;
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// API base URL.
pub const WU_API_BASE: &str = "https://api.wunderground.com";

/// Autocomplete base URL.
pub const WU_AUTOCOMPLETE_BASE: &str = "https://autocomplete.wunderground.com";

/// Location used to probe whether a key is accepted.
const KEY_CHECK_QUERY: &str = "NY/New_York";

// ============================================================================
// Endpoints
// ============================================================================

/// Builds request URLs against a configurable base.
#[derive(Debug, Clone)]
pub struct WuEndpoints {
    base: Url,
    autocomplete: Url,
}

impl WuEndpoints {
    /// Uses the public service URLs.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in constants; the signature matches
    /// [`WuEndpoints::with_bases`].
    pub fn new() -> Result<Self, FetchError> {
        Self::with_bases(WU_API_BASE, WU_AUTOCOMPLETE_BASE)
    }

    /// Uses custom base URLs.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if either base does not parse.
    pub fn with_bases(base: &str, autocomplete: &str) -> Result<Self, FetchError> {
        Ok(Self {
            base: parse_base(base)?,
            autocomplete: parse_base(autocomplete)?,
        })
    }

    /// `{base}/api/{key}/conditions/forecast/q/{query}.json`
    ///
    /// Queries that are already paths (`/q/zmw:...`) are appended as-is.
    pub fn conditions(&self, key: &str, query: &str) -> Result<Url, FetchError> {
        self.feature_url(key, &["conditions", "forecast"], query)
    }

    /// `{base}/api/{key}/geolookup/q/{lat},{lon}.json`
    pub fn geolookup(&self, key: &str, position: GeoPosition) -> Result<Url, FetchError> {
        self.feature_url(key, &["geolookup"], &position.to_query(6))
    }

    /// Conditions for a fixed location, used to test a key.
    pub fn key_check(&self, key: &str) -> Result<Url, FetchError> {
        self.feature_url(key, &["conditions"], KEY_CHECK_QUERY)
    }

    /// `{autocomplete}/aq?query={text}&format=JSON`
    pub fn autocomplete(&self, text: &str) -> Result<Url, FetchError> {
        let mut url = self.autocomplete.clone();
        extend_path(&mut url, &["aq"])?;
        url.query_pairs_mut()
            .append_pair("query", text)
            .append_pair("format", "JSON");
        Ok(url)
    }

    fn feature_url(&self, key: &str, features: &[&str], query: &str) -> Result<Url, FetchError> {
        let query = query.trim();
        let query = query.strip_prefix("/q/").unwrap_or(query);
        let parts: Vec<&str> = query.split('/').filter(|p| !p.is_empty()).collect();
        let Some((last, head)) = parts.split_last() else {
            return Err(FetchError::InvalidUrl("empty location query".to_string()));
        };
        let last = format!("{last}.json");

        let mut segments: Vec<&str> = vec!["api", key];
        segments.extend_from_slice(features);
        segments.push("q");
        segments.extend_from_slice(head);
        segments.push(&last);

        let mut url = self.base.clone();
        extend_path(&mut url, &segments)?;
        Ok(url)
    }
}

fn parse_base(base: &str) -> Result<Url, FetchError> {
    Url::parse(base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))
}

fn extend_path(url: &mut Url, segments: &[&str]) -> Result<(), FetchError> {
    url.path_segments_mut()
        .map_err(|()| FetchError::InvalidUrl("base URL cannot have a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}

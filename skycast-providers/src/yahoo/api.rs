//! YQL statement and URL construction.

use skycast_core::{GeoPosition, TemperatureUnit};
use skycast_fetch::FetchError;
use url::Url;

/// YQL base URL.
pub const YAHOO_API_BASE: &str = "https://query.yahooapis.com";

/// Builds YQL request URLs.
#[derive(Debug, Clone)]
pub struct YqlEndpoint {
    base: Url,
}

impl YqlEndpoint {
    /// Uses the public service.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in base URL does not parse.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base(YAHOO_API_BASE)
    }

    /// Uses a custom base.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if `base` does not parse or cannot
    /// carry a path.
    pub fn with_base(base: &str) -> Result<Self, FetchError> {
        let mut url =
            Url::parse(base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(format!("{base} cannot carry a path")))?
            .pop_if_empty()
            .extend(["v1", "public", "yql"]);
        Ok(Self { base: url })
    }

    /// `{base}/v1/public/yql?q={statement}&format=json`
    pub fn url(&self, statement: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("q", statement)
            .append_pair("format", "json");
        url
    }
}

/// Forecast for the first place matching `query`.
pub fn forecast_statement(query: &str, unit: TemperatureUnit) -> String {
    let u = match unit {
        TemperatureUnit::Fahrenheit => 'f',
        TemperatureUnit::Celsius => 'c',
    };
    format!(
        "select * from weather.forecast where woeid in \
         (select woeid from geo.places(1) where text=\"{}\") and u='{u}'",
        escape(query)
    )
}

/// The single place closest to a position.
pub fn reverse_statement(position: GeoPosition) -> String {
    format!(
        "select * from geo.places(1) where text=\"({},{})\"",
        position.latitude, position.longitude
    )
}

/// Places matching free text.
pub fn search_statement(text: &str) -> String {
    format!("select * from geo.places where text=\"{}\"", escape(text))
}

fn escape(text: &str) -> String {
    text.trim().replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_shape() {
        let endpoint = YqlEndpoint::new().unwrap();
        let url = endpoint.url("select 1");
        assert_eq!(url.path(), "/v1/public/yql");
        assert_eq!(url.query(), Some("q=select+1&format=json"));
    }

    #[test]
    fn test_forecast_statement_unit() {
        let stmt = forecast_statement("Paris, France", TemperatureUnit::Celsius);
        assert!(stmt.contains("text=\"Paris, France\""));
        assert!(stmt.ends_with("u='c'"));
    }

    #[test]
    fn test_statement_escapes_quotes() {
        let stmt = search_statement("foo\" or 1=1");
        assert!(stmt.contains("foo\\\" or 1=1"));
    }

    #[test]
    fn test_reverse_statement() {
        let pos = GeoPosition::new(47.6, -122.3).unwrap();
        assert_eq!(
            reverse_statement(pos),
            "select * from geo.places(1) where text=\"(47.6,-122.3)\""
        );
    }
}

//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use skycast_core::{ClassifiedError, LocationEntry, WeatherSnapshot};
use skycast_refresh::{LocationPanel, PanelState, RefreshKind};
use skycast_store::Settings;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one displayed location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelOutput {
    pub query: String,
    pub name: String,
    pub kind: &'static str,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherOutput>,
}

/// Current conditions and forecast.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherOutput {
    pub location_name: String,
    pub temperature: f64,
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forecast: Vec<DayOutput>,
    #[serde(serialize_with = "serialize_datetime")]
    pub fetched_at: DateTime<Utc>,
}

/// One forecast day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOutput {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: String,
}

/// A reported failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub retryable: bool,
}

/// Result of a refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutput {
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub panels: Vec<PanelOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorOutput>,
}

/// A saved location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub query: String,
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Settings with the API key masked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOutput {
    pub provider: String,
    pub api_key: &'static str,
    pub api_key_verified: bool,
    pub unit: &'static str,
    pub refresh_interval_minutes: u32,
    pub follow_gps: bool,
    pub log_level: String,
}

fn serialize_datetime<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }

    /// Converts a snapshot to output.
    pub fn weather_to_output(snapshot: &WeatherSnapshot) -> WeatherOutput {
        WeatherOutput {
            location_name: snapshot.location_name.clone(),
            temperature: snapshot.temperature,
            unit: snapshot.unit.symbol(),
            feels_like: snapshot.feels_like,
            condition: snapshot.condition.clone(),
            humidity: snapshot.humidity,
            wind_speed: snapshot.wind_speed,
            forecast: snapshot
                .forecast
                .iter()
                .map(|d| DayOutput {
                    date: d.date,
                    high: d.high,
                    low: d.low,
                    condition: d.condition.clone(),
                })
                .collect(),
            fetched_at: snapshot.fetched_at,
        }
    }

    /// Converts a panel to output.
    pub fn panel_to_output(panel: &LocationPanel) -> PanelOutput {
        PanelOutput {
            query: panel.entry.query.clone(),
            name: panel.entry.display_name().to_string(),
            kind: location_kind(&panel.entry),
            state: panel_state(panel.state),
            source: panel.source.map(|s| s.cli_name().to_string()),
            weather: panel.snapshot.as_ref().map(Self::weather_to_output),
        }
    }

    /// Converts an error to output.
    pub fn error_to_output(error: &ClassifiedError) -> ErrorOutput {
        ErrorOutput {
            kind: serde_json::to_value(error.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            message: error.message.clone(),
            query: error.query.clone(),
            retryable: error.retryable,
        }
    }

    /// Builds the output of a refresh.
    pub fn refresh_output(
        kind: RefreshKind,
        panels: &[LocationPanel],
        errors: &[ClassifiedError],
    ) -> RefreshOutput {
        let (mode, reason) = match kind {
            RefreshKind::FullReload(reason) => ("fullReload", Some(format!("{reason:?}"))),
            RefreshKind::Quiet => ("quiet", None),
        };
        RefreshOutput {
            mode,
            reason,
            panels: panels.iter().map(Self::panel_to_output).collect(),
            errors: errors.iter().map(Self::error_to_output).collect(),
        }
    }

    /// Converts saved locations to output; the GPS entry has no index.
    pub fn locations_output(
        gps: Option<&LocationEntry>,
        entries: &[LocationEntry],
    ) -> Vec<LocationOutput> {
        let to_output = |index, entry: &LocationEntry| LocationOutput {
            index,
            query: entry.query.clone(),
            name: entry.display_name().to_string(),
            kind: location_kind(entry),
            source: entry.weather_source.map(|s| s.cli_name().to_string()),
        };
        gps.into_iter()
            .map(|e| to_output(None, e))
            .chain(entries.iter().enumerate().map(|(i, e)| to_output(Some(i), e)))
            .collect()
    }

    /// Converts settings to output.
    pub fn settings_output(settings: &Settings) -> SettingsOutput {
        SettingsOutput {
            provider: settings.api.cli_name().to_string(),
            api_key: if settings.has_api_key() { "set" } else { "unset" },
            api_key_verified: settings.api_key_verified,
            unit: settings.unit.symbol(),
            refresh_interval_minutes: settings.refresh_interval.minutes(),
            follow_gps: settings.follow_gps,
            log_level: settings.log_level.to_string(),
        }
    }
}

fn location_kind(entry: &LocationEntry) -> &'static str {
    if entry.is_gps() { "gps" } else { "manual" }
}

fn panel_state(state: PanelState) -> &'static str {
    match state {
        PanelState::Idle => "idle",
        PanelState::Fetching => "fetching",
        PanelState::Loaded => "loaded",
        PanelState::Failed => "failed",
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Text output formatting with colors.

use chrono::{DateTime, Utc};
use skycast_core::{ClassifiedError, LocationEntry, LocationSuggestion, WeatherSnapshot};
use skycast_refresh::{LocationPanel, PanelState};
use skycast_store::Settings;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

// Marker shown before the GPS location
const GPS_MARKER: &str = "➤";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    forecast_days: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            forecast_days: 3,
        }
    }

    /// Formats every panel followed by the reported errors.
    pub fn format_refresh(
        &self,
        panels: &[LocationPanel],
        errors: &[ClassifiedError],
        now: DateTime<Utc>,
    ) -> String {
        let mut blocks: Vec<String> = panels.iter().map(|p| self.format_panel(p, now)).collect();
        if panels.is_empty() {
            blocks.push(self.dim("No locations. Add one with `skycast locations add <name>`."));
        }
        if !errors.is_empty() {
            blocks.push(self.format_errors(errors));
        }
        blocks.join("\n\n")
    }

    /// Formats one displayed location.
    pub fn format_panel(&self, panel: &LocationPanel, now: DateTime<Utc>) -> String {
        let mut lines = Vec::new();

        let mut header = self.bold(panel.entry.display_name());
        if panel.entry.is_gps() {
            header = format!("{} {}", self.yellow(GPS_MARKER), header);
        }
        match panel.state {
            PanelState::Fetching => header.push_str(&format!(" {}", self.yellow("(updating)"))),
            PanelState::Failed => header.push_str(&format!(" {}", self.red("(update failed)"))),
            PanelState::Idle | PanelState::Loaded => {}
        }
        lines.push(header);

        match &panel.snapshot {
            Some(snapshot) => lines.extend(self.weather_lines(snapshot, now)),
            None => lines.push(format!("  {}", self.dim("No weather yet"))),
        }

        lines.join("\n")
    }

    fn weather_lines(&self, snapshot: &WeatherSnapshot, now: DateTime<Utc>) -> Vec<String> {
        let mut lines = Vec::new();

        let mut current = format!(
            "  {}  {}",
            self.cyan(&self.temperature(snapshot.temperature, snapshot)),
            snapshot.condition
        );
        if let Some(feels) = snapshot.feels_like {
            current.push_str(&format!(
                "  {}",
                self.dim(&format!("feels like {}", self.temperature(feels, snapshot)))
            ));
        }
        lines.push(current);

        let mut details = Vec::new();
        if let Some(h) = snapshot.humidity {
            details.push(format!("Humidity {h}%"));
        }
        if let Some(w) = snapshot.wind_speed {
            let speed_unit = if snapshot.unit.is_fahrenheit() { "mph" } else { "km/h" };
            details.push(format!("Wind {w:.0} {speed_unit}"));
        }
        if !details.is_empty() {
            lines.push(format!("  {}", details.join("  ")));
        }

        for day in snapshot.forecast.iter().take(self.forecast_days) {
            lines.push(format!(
                "  {:<4} {:>5} / {:<5} {}",
                day.date.format("%a").to_string(),
                self.temperature(day.high, snapshot),
                self.temperature(day.low, snapshot),
                self.dim(&day.condition)
            ));
        }

        lines.push(format!(
            "  {}",
            self.dim(&format!(
                "{} · updated {}",
                snapshot.source,
                format_age(snapshot.fetched_at, now)
            ))
        ));
        lines
    }

    fn temperature(&self, value: f64, snapshot: &WeatherSnapshot) -> String {
        format!("{value:.0}°{}", snapshot.unit.symbol())
    }

    /// Formats reported errors, one per line.
    pub fn format_errors(&self, errors: &[ClassifiedError]) -> String {
        errors
            .iter()
            .map(|e| {
                let mut line = format!("{} {e}", self.red("✗"));
                if e.retryable {
                    line.push_str(&format!(" {}", self.dim("(run `skycast refresh` to retry)")));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the saved locations with their reorder indexes.
    pub fn format_locations(&self, gps: Option<&LocationEntry>, entries: &[LocationEntry]) -> String {
        let mut lines = Vec::new();
        if let Some(entry) = gps {
            lines.push(format!(
                "{}  {} {}",
                self.yellow(GPS_MARKER),
                self.bold(entry.display_name()),
                self.dim(&format!("({})", entry.query))
            ));
        }
        for (i, entry) in entries.iter().enumerate() {
            lines.push(format!(
                "{}  {} {}",
                self.dim(&i.to_string()),
                self.bold(entry.display_name()),
                self.dim(&format!("({})", entry.query))
            ));
        }
        if lines.is_empty() {
            return self.dim("No saved locations.");
        }
        lines.join("\n")
    }

    /// Formats search suggestions.
    pub fn format_suggestions(&self, suggestions: &[LocationSuggestion]) -> String {
        if suggestions.is_empty() {
            return self.dim("No matches.");
        }
        suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}  {} {}", self.dim(&i.to_string()), s.name, self.dim(&s.query)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats settings with the API key masked.
    pub fn format_settings(&self, settings: &Settings) -> String {
        let key = if !settings.has_api_key() {
            self.dim("not set")
        } else if settings.api_key_verified {
            self.green("set (verified)")
        } else {
            self.yellow("set (unverified)")
        };
        let gps = if settings.follow_gps {
            self.green("on")
        } else {
            self.dim("off")
        };

        let mut lines = vec![
            format!("Provider:  {}", self.blue(settings.api.display_name())),
            format!("API key:   {key}"),
            format!("Unit:      {}", settings.unit),
            format!("Refresh:   every {}", settings.refresh_interval),
            format!("GPS:       {gps}"),
            format!("Log level: {}", settings.log_level),
        ];
        if settings.missing_api_key() {
            lines.push(self.red(&format!(
                "{} needs an API key: `skycast config key <KEY>`",
                settings.api
            )));
        }
        lines.join("\n")
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// Formats how long ago a snapshot was fetched.
pub fn format_age(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now - fetched_at;
    let minutes = age.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if minutes < 24 * 60 {
        let hours = minutes / 60;
        let rest = minutes % 60;
        if rest > 0 {
            format!("{hours}h {rest}m ago")
        } else {
            format!("{hours}h ago")
        }
    } else {
        format!("{} days ago", age.num_days())
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Renderer settings read from `LAST_COMMENTER_*` environment variables.

use std::{env, fmt, num::NonZeroUsize, str::FromStr, time::Duration};

use chrono::{
    format::{Item, StrftimeItems},
    DateTime, FixedOffset, Local, Utc,
};

use crate::error::ConfigError;

/// Rows kept in the commenter cache when no capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;
/// Default internal name of the first administrator field.
pub const DEFAULT_ADMIN_FIELD_1: &str = "admin_1";
/// Default internal name of the second administrator field.
pub const DEFAULT_ADMIN_FIELD_2: &str = "admin_2";
/// Default `chrono` pattern for comment timestamps.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Default timeout of one REST request.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
const MIN_HTTP_TIMEOUT_SECONDS: u64 = 3;

/// Which revision of the pipeline is active. Exactly one runs per renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineVariant {
    /// Latest annotation only.
    EmailOnly,
    /// Latest annotation compared against the row's administrator pair.
    #[default]
    AdminMatch,
    /// Latest annotation, falling back to the row's last editor.
    LastEditor,
}

impl PipelineVariant {
    /// Name accepted by `LAST_COMMENTER_VARIANT` and `--variant`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailOnly => "email-only",
            Self::AdminMatch => "admin-match",
            Self::LastEditor => "last-editor",
        }
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineVariant {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "email-only" | "email" => Ok(Self::EmailOnly),
            "admin-match" | "admin" => Ok(Self::AdminMatch),
            "last-editor" | "editor" => Ok(Self::LastEditor),
            _ => Err(ConfigError::UnknownVariant(value.to_string())),
        }
    }
}

/// Internal names of the two person fields holding the row's administrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminFields {
    /// First administrator field.
    pub first: String,
    /// Second administrator field.
    pub second: String,
}

impl Default for AdminFields {
    fn default() -> Self {
        Self {
            first: DEFAULT_ADMIN_FIELD_1.to_string(),
            second: DEFAULT_ADMIN_FIELD_2.to_string(),
        }
    }
}

/// How comment timestamps are shown to the viewer.
///
/// Timestamps use one fixed `chrono` pattern (default `%Y-%m-%d %H:%M`) for
/// every viewer. A browser host would order date parts by the viewer's
/// locale instead; that ordering is not reproduced here, set the pattern
/// explicitly to match a locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDisplay {
    pattern: String,
    offset: Option<FixedOffset>,
}

impl TimeDisplay {
    /// Viewer's local zone.
    pub fn local(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: validate_pattern(pattern)?,
            offset: None,
        })
    }

    /// Fixed UTC offset, independent of the machine's zone.
    pub fn fixed(pattern: &str, offset: FixedOffset) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: validate_pattern(pattern)?,
            offset: Some(offset),
        })
    }

    /// Default pattern in UTC.
    pub fn utc() -> Self {
        Self {
            pattern: DEFAULT_TIME_FORMAT.to_string(),
            offset: FixedOffset::east_opt(0),
        }
    }

    /// Formats `at` in the configured zone and pattern.
    pub fn format(&self, at: DateTime<Utc>) -> String {
        match self.offset {
            Some(offset) => at.with_timezone(&offset).format(&self.pattern).to_string(),
            None => at.with_timezone(&Local).format(&self.pattern).to_string(),
        }
    }
}

impl Default for TimeDisplay {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TIME_FORMAT.to_string(),
            offset: None,
        }
    }
}

/// Settings of one renderer instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Active pipeline.
    pub variant: PipelineVariant,
    /// Maximum rows held in the commenter cache.
    pub cache_capacity: NonZeroUsize,
    /// Administrator person fields compared in `admin-match`.
    pub admin_fields: AdminFields,
    /// Timestamp display.
    pub time_display: TimeDisplay,
    /// Timeout of one REST request.
    pub http_timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            variant: PipelineVariant::default(),
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            admin_fields: AdminFields::default(),
            time_display: TimeDisplay::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
        }
    }
}

impl RendererConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let variant = match read("LAST_COMMENTER_VARIANT") {
            Some(value) => value.parse()?,
            None => PipelineVariant::default(),
        };
        let cache_capacity = match read("LAST_COMMENTER_CACHE_CAPACITY") {
            Some(value) => {
                let parsed = value.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                    key: "LAST_COMMENTER_CACHE_CAPACITY",
                    value: value.clone(),
                })?;
                NonZeroUsize::new(parsed).unwrap_or(NonZeroUsize::MIN)
            },
            None => NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        };
        let admin_fields = AdminFields {
            first: read("LAST_COMMENTER_ADMIN_FIELD_1")
                .unwrap_or_else(|| DEFAULT_ADMIN_FIELD_1.to_string()),
            second: read("LAST_COMMENTER_ADMIN_FIELD_2")
                .unwrap_or_else(|| DEFAULT_ADMIN_FIELD_2.to_string()),
        };
        let pattern =
            read("LAST_COMMENTER_TIME_FORMAT").unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());
        let time_display = match read("LAST_COMMENTER_UTC_OFFSET_MINUTES") {
            Some(value) => TimeDisplay::fixed(&pattern, parse_offset_minutes(&value)?)?,
            None => TimeDisplay::local(&pattern)?,
        };
        let timeout_seconds = read("LAST_COMMENTER_HTTP_TIMEOUT_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS)
            .max(MIN_HTTP_TIMEOUT_SECONDS);

        Ok(Self {
            variant,
            cache_capacity,
            admin_fields,
            time_display,
            http_timeout: Duration::from_secs(timeout_seconds),
        })
    }
}

fn parse_offset_minutes(value: &str) -> Result<FixedOffset, ConfigError> {
    value
        .parse::<i32>()
        .ok()
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: "LAST_COMMENTER_UTC_OFFSET_MINUTES",
            value: value.to_string(),
        })
}

fn validate_pattern(pattern: &str) -> Result<String, ConfigError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidValue {
            key: "LAST_COMMENTER_TIME_FORMAT",
            value: pattern.to_string(),
        });
    }
    Ok(pattern.to_string())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use chrono::{TimeZone, Utc};

    use super::{PipelineVariant, RendererConfig, TimeDisplay};
    use crate::error::ConfigError;

    fn config_from(pairs: &[(&str, &str)]) -> Result<RendererConfig, ConfigError> {
        let values = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        RendererConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_select_admin_match() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.variant, PipelineVariant::AdminMatch);
        assert_eq!(config.cache_capacity.get(), 1024);
        assert_eq!(config.admin_fields.first, "admin_1");
        assert_eq!(config.admin_fields.second, "admin_2");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn variant_names_are_normalized() {
        assert_eq!("Last_Editor".parse::<PipelineVariant>(), Ok(PipelineVariant::LastEditor));
        assert_eq!(" email-only ".parse::<PipelineVariant>(), Ok(PipelineVariant::EmailOnly));
        assert!("bogus".parse::<PipelineVariant>().is_err());
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let err = config_from(&[("LAST_COMMENTER_VARIANT", "everything")]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownVariant("everything".to_string()));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("LAST_COMMENTER_ADMIN_FIELD_1", "  "),
            ("LAST_COMMENTER_ADMIN_FIELD_2", "Owner"),
            ("LAST_COMMENTER_CACHE_CAPACITY", "0"),
            ("LAST_COMMENTER_HTTP_TIMEOUT_SECONDS", "1"),
        ])
        .unwrap();
        assert_eq!(config.admin_fields.first, "admin_1");
        assert_eq!(config.admin_fields.second, "Owner");
        assert_eq!(config.cache_capacity.get(), 1);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn fixed_offset_shifts_display() {
        let config = config_from(&[
            ("LAST_COMMENTER_UTC_OFFSET_MINUTES", "120"),
            ("LAST_COMMENTER_TIME_FORMAT", "%d/%m/%Y %H:%M"),
        ])
        .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 23, 7, 0).unwrap();
        assert_eq!(config.time_display.format(at), "06/03/2024 01:07");
    }

    #[test]
    fn locale_order_comes_from_the_pattern() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        assert_eq!(TimeDisplay::utc().format(at), "2024-03-05 14:07");

        let us = config_from(&[
            ("LAST_COMMENTER_UTC_OFFSET_MINUTES", "0"),
            ("LAST_COMMENTER_TIME_FORMAT", "%m/%d/%Y, %I:%M %p"),
        ])
        .unwrap();
        assert_eq!(us.time_display.format(at), "03/05/2024, 02:07 PM");
    }

    #[test]
    fn invalid_time_pattern_is_rejected() {
        assert!(TimeDisplay::local("%!").is_err());
        assert!(config_from(&[("LAST_COMMENTER_UTC_OFFSET_MINUTES", "soon")]).is_err());
    }

    #[test]
    fn utc_display_uses_two_digit_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 4, 7, 0).unwrap();
        assert_eq!(TimeDisplay::utc().format(at), "2024-03-05 04:07");
    }
}

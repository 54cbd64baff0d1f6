//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;

use crate::analytics::{MEASUREMENT_ENDPOINT, MeasurementConfig};
use crate::error::ConfigError;
use crate::funnel::countdown::Countdown;
use crate::funnel::offer::{DEFAULT_CHECKOUT_URL, DEFAULT_CURRENCY, DEFAULT_PRICE, OfferSettings};

/// Events buffered for the measurement protocol before new ones are dropped.
const ANALYTICS_QUEUE_CAPACITY: usize = 256;

/// How the binary delivers the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// HTTP/JSON + WebSocket API.
    Serve,
    /// Interactive terminal session.
    Cli,
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct FunnelConfig {
    pub mode: RunMode,
    pub port: u16,
    pub offer: OfferSettings,
    /// Sessions idle this long are pruned.
    pub session_idle_timeout: Duration,
    /// Probe image URLs and substitute placeholders server-side.
    pub probe_media: bool,
    /// GA4 measurement protocol settings; `None` logs events instead.
    pub analytics: Option<MeasurementConfig>,
    /// Directory for daily rolling log files; `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Serve,
            port: 8080,
            offer: OfferSettings::default(),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            probe_media: false,
            analytics: None,
            log_dir: None,
        }
    }
}

impl FunnelConfig {
    /// Build config from `FUNNEL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mode = match get("FUNNEL_MODE").as_deref() {
            None | Some("serve") => RunMode::Serve,
            Some("cli") => RunMode::Cli,
            Some(other) => return Err(invalid("FUNNEL_MODE", format!("unknown mode {other:?}"))),
        };

        let port: u16 = match get("FUNNEL_PORT") {
            Some(v) => v.parse().map_err(|e| invalid("FUNNEL_PORT", e))?,
            None => 8080,
        };

        let price: Decimal = match get("FUNNEL_PRICE") {
            Some(v) => v.parse().map_err(|e| invalid("FUNNEL_PRICE", e))?,
            None => DEFAULT_PRICE,
        };
        if price.is_sign_negative() {
            return Err(invalid("FUNNEL_PRICE", "must not be negative"));
        }

        let countdown_start = match get("FUNNEL_COUNTDOWN_START") {
            Some(v) => Countdown::parse(&v)
                .ok_or_else(|| invalid("FUNNEL_COUNTDOWN_START", "expected HH:MM:SS"))?,
            None => Countdown::INITIAL,
        };

        let offer = OfferSettings {
            checkout_url: get("FUNNEL_CHECKOUT_URL")
                .unwrap_or_else(|| DEFAULT_CHECKOUT_URL.to_string()),
            price,
            currency: get("FUNNEL_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            countdown_start,
        };

        let idle_secs: u64 = match get("FUNNEL_SESSION_IDLE_SECS") {
            Some(v) => v.parse().map_err(|e| invalid("FUNNEL_SESSION_IDLE_SECS", e))?,
            None => 3600,
        };

        let probe_media = match get("FUNNEL_PROBE_MEDIA") {
            Some(v) => parse_flag(&v).ok_or_else(|| invalid("FUNNEL_PROBE_MEDIA", "expected true or false"))?,
            None => false,
        };

        let analytics = match (get("FUNNEL_GA_MEASUREMENT_ID"), get("FUNNEL_GA_API_SECRET")) {
            (Some(measurement_id), Some(secret)) => Some(MeasurementConfig {
                measurement_id,
                api_secret: SecretString::from(secret),
                endpoint: MEASUREMENT_ENDPOINT.to_string(),
                queue_capacity: ANALYTICS_QUEUE_CAPACITY,
            }),
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("FUNNEL_GA_API_SECRET".to_string()));
            }
            (None, _) => None,
        };

        Ok(Self {
            mode,
            port,
            offer,
            session_idle_timeout: Duration::from_secs(idle_secs),
            probe_media,
            analytics,
            log_dir: get("FUNNEL_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal_macros::dec;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<FunnelConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FunnelConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.mode, RunMode::Serve);
        assert_eq!(config.port, 8080);
        assert_eq!(config.offer, OfferSettings::default());
        assert_eq!(config.session_idle_timeout, Duration::from_secs(3600));
        assert!(!config.probe_media);
        assert!(config.analytics.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("FUNNEL_MODE", "cli"),
            ("FUNNEL_PORT", "9000"),
            ("FUNNEL_PRICE", "19.90"),
            ("FUNNEL_CURRENCY", "EUR"),
            ("FUNNEL_COUNTDOWN_START", "01:00:00"),
            ("FUNNEL_PROBE_MEDIA", "yes"),
            ("FUNNEL_LOG_DIR", "/tmp/funnel"),
        ])
        .unwrap();
        assert_eq!(config.mode, RunMode::Cli);
        assert_eq!(config.port, 9000);
        assert_eq!(config.offer.price, dec!(19.90));
        assert_eq!(config.offer.currency, "EUR");
        assert_eq!(config.offer.countdown_start, Countdown::new(1, 0, 0));
        assert!(config.probe_media);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/funnel")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (key, value) in [
            ("FUNNEL_PORT", "eighty"),
            ("FUNNEL_PRICE", "cheap"),
            ("FUNNEL_PRICE", "-1"),
            ("FUNNEL_COUNTDOWN_START", "25:00:00"),
            ("FUNNEL_MODE", "daemon"),
            ("FUNNEL_PROBE_MEDIA", "maybe"),
        ] {
            match config(&[(key, value)]) {
                Err(ConfigError::InvalidValue { key: k, .. }) => assert_eq!(k, key),
                other => panic!("{key}={value} gave {other:?}"),
            }
        }
    }

    #[test]
    fn measurement_id_needs_secret() {
        assert!(matches!(
            config(&[("FUNNEL_GA_MEASUREMENT_ID", "G-1")]),
            Err(ConfigError::MissingEnvVar(_))
        ));

        let config = config(&[
            ("FUNNEL_GA_MEASUREMENT_ID", "G-1"),
            ("FUNNEL_GA_API_SECRET", "s3cret"),
        ])
        .unwrap();
        let analytics = config.analytics.unwrap();
        assert_eq!(analytics.measurement_id, "G-1");
        assert_eq!(analytics.endpoint, MEASUREMENT_ENDPOINT);
    }
}

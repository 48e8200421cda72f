use std::collections::HashMap;
use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub assignment_queue_size: usize,
    pub event_buffer_size: usize,
    pub pricing: PricingConfig,
    pub auto_assign: bool,
    pub review_requires_delivery: bool,
    pub notifications_enabled: bool,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub base_fee: f64,
    pub surge_enabled: bool,
    pub surge_factor: f64,
    /// Promotion code -> percent discount.
    pub promo_codes: HashMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub anchor_lat: f64,
    pub anchor_lng: f64,
    pub jitter: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            log_json: false,
            assignment_queue_size: 1024,
            event_buffer_size: 1024,
            pricing: PricingConfig::default(),
            auto_assign: false,
            review_requires_delivery: true,
            notifications_enabled: true,
            tracking: TrackingConfig::default(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fee: 5.0,
            surge_enabled: false,
            surge_factor: 1.2,
            promo_codes: HashMap::from([("WELCOME10".to_string(), 10.0)]),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            anchor_lat: 40.7128,
            anchor_lng: -74.0060,
            jitter: 0.01,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Config::default();

        let promo_codes = match env::var("PROMO_CODES") {
            Ok(raw) => parse_promo_codes(&raw)?,
            Err(_) => defaults.pricing.promo_codes,
        };

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")),
            assignment_queue_size: parse_or_default(
                "ASSIGNMENT_QUEUE_SIZE",
                defaults.assignment_queue_size,
            )?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            pricing: PricingConfig {
                base_fee: parse_or_default("BASE_FEE", defaults.pricing.base_fee)?,
                surge_enabled: parse_or_default("SURGE_PRICING", defaults.pricing.surge_enabled)?,
                surge_factor: parse_or_default("SURGE_FACTOR", defaults.pricing.surge_factor)?,
                promo_codes,
            },
            auto_assign: parse_or_default("AUTO_ASSIGN", defaults.auto_assign)?,
            review_requires_delivery: parse_or_default(
                "REVIEW_REQUIRES_DELIVERY",
                defaults.review_requires_delivery,
            )?,
            notifications_enabled: parse_or_default(
                "NOTIFICATIONS_ENABLED",
                defaults.notifications_enabled,
            )?,
            tracking: TrackingConfig {
                anchor_lat: parse_or_default("TRACKING_ANCHOR_LAT", defaults.tracking.anchor_lat)?,
                anchor_lng: parse_or_default("TRACKING_ANCHOR_LNG", defaults.tracking.anchor_lng)?,
                jitter: parse_or_default("TRACKING_JITTER", defaults.tracking.jitter)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would panic at startup or yield nonsense prices.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.assignment_queue_size == 0 {
            return Err(AppError::Internal(
                "ASSIGNMENT_QUEUE_SIZE must be > 0".to_string(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(AppError::Internal("EVENT_BUFFER_SIZE must be > 0".to_string()));
        }

        require_non_negative("BASE_FEE", self.pricing.base_fee)?;
        require_non_negative("SURGE_FACTOR", self.pricing.surge_factor)?;
        require_non_negative("TRACKING_JITTER", self.tracking.jitter)?;

        if !(-90.0..=90.0).contains(&self.tracking.anchor_lat) {
            return Err(AppError::Internal(format!(
                "TRACKING_ANCHOR_LAT {} is outside [-90, 90]",
                self.tracking.anchor_lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.tracking.anchor_lng) {
            return Err(AppError::Internal(format!(
                "TRACKING_ANCHOR_LNG {} is outside [-180, 180]",
                self.tracking.anchor_lng
            )));
        }

        Ok(())
    }
}

fn require_non_negative(key: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Internal(format!(
            "{key} must be a finite number >= 0, got {value}"
        )))
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

/// Parses `CODE:percent` pairs separated by commas, e.g. `WELCOME10:10,VIP:25`.
fn parse_promo_codes(raw: &str) -> Result<HashMap<String, f64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (code, percent) = entry
                .split_once(':')
                .ok_or_else(|| AppError::Internal(format!("invalid PROMO_CODES entry: {entry}")))?;
            let percent = percent
                .trim()
                .parse::<f64>()
                .map_err(|err| AppError::Internal(format!("invalid PROMO_CODES entry {entry}: {err}")))?;
            if !(0.0..=100.0).contains(&percent) {
                return Err(AppError::Internal(format!(
                    "promo discount out of range in {entry}"
                )));
            }
            Ok((code.trim().to_ascii_uppercase(), percent))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_promo_codes, Config, PricingConfig, TrackingConfig};

    #[test]
    fn promo_codes_parse_into_uppercase_table() {
        let codes = parse_promo_codes("welcome10:10, VIP:25 ,").unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes["WELCOME10"], 10.0);
        assert_eq!(codes["VIP"], 25.0);
    }

    #[test]
    fn promo_codes_reject_bad_entries() {
        assert!(parse_promo_codes("NOPERCENT").is_err());
        assert!(parse_promo_codes("BIG:150").is_err());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_sized_channels_are_rejected() {
        let queue = Config {
            assignment_queue_size: 0,
            ..Config::default()
        };
        let events = Config {
            event_buffer_size: 0,
            ..Config::default()
        };
        assert!(queue.validate().is_err());
        assert!(events.validate().is_err());
    }

    #[test]
    fn negative_or_nan_numbers_are_rejected() {
        let fee = Config {
            pricing: PricingConfig {
                base_fee: -5.0,
                ..PricingConfig::default()
            },
            ..Config::default()
        };
        let surge = Config {
            pricing: PricingConfig {
                surge_factor: -1.2,
                ..PricingConfig::default()
            },
            ..Config::default()
        };
        let jitter = Config {
            tracking: TrackingConfig {
                jitter: f64::NAN,
                ..TrackingConfig::default()
            },
            ..Config::default()
        };
        let anchor = Config {
            tracking: TrackingConfig {
                anchor_lat: 123.0,
                ..TrackingConfig::default()
            },
            ..Config::default()
        };

        for config in [fee, surge, jitter, anchor] {
            assert!(config.validate().is_err());
        }
    }
}

use crate::error::ConfigError;
use crate::event::EventInfo;
use crate::messages::SupportContact;
use crate::runner::DEFAULT_PHONE_PREFIX;
use chrono::DateTime;
use reqwest::Url;
use std::time::Duration;
use tiered_server::env::{ConfigurationKey, secret_value};

const REGISTRY_BACKEND: &str = "REGISTRY_BACKEND";
const REGISTRY_URL: &str = "REGISTRY_URL";
const REGISTRY_TIMEOUT_SECONDS: &str = "REGISTRY_TIMEOUT_SECONDS";
const PHONE_PREFIX: &str = "PHONE_PREFIX";
const EVENT_NAME: &str = "EVENT_NAME";
const EVENT_SLUG: &str = "EVENT_SLUG";
const EVENT_START: &str = "EVENT_START";
const SUPPORT_PHONE: &str = "SUPPORT_PHONE";
const SUPPORT_EMAIL: &str = "SUPPORT_EMAIL";

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// The deployed spreadsheet web app.
    Http(Url),
    /// Demonstration dataset kept in memory.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub timeout: Duration,
    pub phone_prefix: String,
    pub event: EventInfo,
    pub support: SupportContact,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|variable_name| secret_value(ConfigurationKey::Other { variable_name }))
    }

    pub fn from_lookup<'a, F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<&'a str>,
    {
        let value = |name: &'static str| {
            lookup(name)
                .map(str::trim)
                .filter(|it| !it.is_empty())
        };
        let backend = match value(REGISTRY_BACKEND).unwrap_or("http") {
            "memory" => Backend::Memory,
            "http" => {
                let url = value(REGISTRY_URL).ok_or(ConfigError::Missing(REGISTRY_URL))?;
                let invalid = || ConfigError::Invalid {
                    name: REGISTRY_URL,
                    value: url.to_string(),
                };
                // the registry client only speaks https
                match Url::parse(url) {
                    Ok(parsed) if parsed.scheme() == "https" => Backend::Http(parsed),
                    _ => return Err(invalid()),
                }
            }
            other => {
                return Err(ConfigError::Invalid {
                    name: REGISTRY_BACKEND,
                    value: other.to_string(),
                });
            }
        };
        let timeout = match value(REGISTRY_TIMEOUT_SECONDS) {
            Some(seconds) => match seconds.parse::<u64>() {
                Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: REGISTRY_TIMEOUT_SECONDS,
                        value: seconds.to_string(),
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        };
        let start = value(EVENT_START).unwrap_or("2025-09-26T06:00:00+06:00");
        let starts_at = DateTime::parse_from_rfc3339(start).map_err(|_| ConfigError::Invalid {
            name: EVENT_START,
            value: start.to_string(),
        })?;
        let default_support = SupportContact::default();
        Ok(Self {
            backend,
            timeout,
            // an explicitly empty prefix disables prefix stripping
            phone_prefix: lookup(PHONE_PREFIX)
                .map(|it| it.trim().to_string())
                .unwrap_or_else(|| DEFAULT_PHONE_PREFIX.to_string()),
            event: EventInfo {
                name: value(EVENT_NAME)
                    .unwrap_or("Justice Half Marathon 2025")
                    .to_string(),
                slug: value(EVENT_SLUG).unwrap_or("justice-marathon").to_string(),
                starts_at,
            },
            support: SupportContact {
                phone: value(SUPPORT_PHONE)
                    .map(str::to_string)
                    .unwrap_or(default_support.phone),
                email: value(SUPPORT_EMAIL)
                    .map(str::to_string)
                    .unwrap_or(default_support.email),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config(values: &[(&'static str, &'static str)]) -> Result<Config, ConfigError> {
        let values = values.iter().copied().collect::<BTreeMap<_, _>>();
        Config::from_lookup(|name| values.get(name).copied())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[(REGISTRY_URL, "https://script.google.com/macros/s/abc/exec")])
            .unwrap();
        assert_eq!(
            Backend::Http(Url::parse("https://script.google.com/macros/s/abc/exec").unwrap()),
            config.backend
        );
        assert_eq!(Duration::from_secs(10), config.timeout);
        assert_eq!("+88", config.phone_prefix);
        assert_eq!("justice-marathon", config.event.slug);
        assert_eq!(SupportContact::default(), config.support);
    }

    #[test]
    fn test_memory_backend() {
        let config = config(&[
            (REGISTRY_BACKEND, "memory"),
            (REGISTRY_TIMEOUT_SECONDS, "4"),
            (PHONE_PREFIX, ""),
            (SUPPORT_EMAIL, "help@example.com"),
        ])
        .unwrap();
        assert_eq!(Backend::Memory, config.backend);
        assert_eq!(Duration::from_secs(4), config.timeout);
        assert_eq!("", config.phone_prefix);
        assert_eq!("help@example.com", config.support.email);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            Err(ConfigError::Missing(REGISTRY_URL)),
            config(&[]).map(|_| ())
        );
        assert_eq!(
            Err(ConfigError::Invalid {
                name: REGISTRY_URL,
                value: "http://script.google.com/macros/s/abc/exec".to_string(),
            }),
            config(&[(REGISTRY_URL, "http://script.google.com/macros/s/abc/exec")]).map(|_| ())
        );
        assert!(matches!(
            config(&[(REGISTRY_URL, "not a url")]),
            Err(ConfigError::Invalid {
                name: REGISTRY_URL,
                ..
            })
        ));
        assert!(matches!(
            config(&[(REGISTRY_BACKEND, "sheets")]),
            Err(ConfigError::Invalid {
                name: REGISTRY_BACKEND,
                ..
            })
        ));
        assert!(matches!(
            config(&[(REGISTRY_BACKEND, "memory"), (REGISTRY_TIMEOUT_SECONDS, "0")]),
            Err(ConfigError::Invalid {
                name: REGISTRY_TIMEOUT_SECONDS,
                ..
            })
        ));
        assert!(matches!(
            config(&[(REGISTRY_BACKEND, "memory"), (EVENT_START, "tomorrow")]),
            Err(ConfigError::Invalid {
                name: EVENT_START,
                ..
            })
        ));
    }
}

//! Server configuration and its environment-variable loader.

use std::time::Duration;

use partyforge_lobby::SessionKind;
use partyforge_sweep::SweepConfig;

use crate::PartyforgeError;

/// Access-link template used when none is configured. `{code}` is
/// replaced by the session's access code.
pub const DEFAULT_LINK_TEMPLATE: &str = "https://www.roblox.com/share?code={code}&type=Server";

const CODE_PLACEHOLDER: &str = "{code}";

/// Everything the server needs besides its [`Notifier`](crate::Notifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Which capacity rule new sessions use.
    pub kind: SessionKind,
    /// Template for access links; must contain `{code}`.
    pub link_template: String,
    /// Idle-session sweeping. `None` keeps sessions until they fill.
    pub sweep: Option<SweepConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            kind: SessionKind::default(),
            link_template: DEFAULT_LINK_TEMPLATE.to_string(),
            sweep: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// | Variable                          | Default                |
    /// |-----------------------------------|------------------------|
    /// | `PARTYFORGE_BIND`                 | `0.0.0.0:$PORT`        |
    /// | `PORT`                            | `8080`                 |
    /// | `PARTYFORGE_KIND`                 | `duel`                 |
    /// | `PARTYFORGE_LINK_TEMPLATE`        | [`DEFAULT_LINK_TEMPLATE`] |
    /// | `PARTYFORGE_SWEEP_INTERVAL_SECS`  | unset: no sweeping     |
    /// | `PARTYFORGE_SESSION_TTL_SECS`     | `1800` when sweeping   |
    pub fn from_env() -> Result<Self, PartyforgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PartyforgeError> {
        let bind_addr = match lookup("PARTYFORGE_BIND") {
            Some(addr) => addr,
            None => {
                let port = match lookup("PORT") {
                    Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                        PartyforgeError::Config(format!("PORT must be a port number, got {raw:?}"))
                    })?,
                    None => 8080,
                };
                format!("0.0.0.0:{port}")
            }
        };

        let kind = match lookup("PARTYFORGE_KIND") {
            Some(raw) => SessionKind::parse(&raw).ok_or_else(|| {
                PartyforgeError::Config(format!(
                    "PARTYFORGE_KIND must be \"duel\" or \"party\", got {raw:?}"
                ))
            })?,
            None => SessionKind::default(),
        };

        let link_template = lookup("PARTYFORGE_LINK_TEMPLATE")
            .unwrap_or_else(|| DEFAULT_LINK_TEMPLATE.to_string());
        validate_template(&link_template)?;

        let interval = seconds(&lookup, "PARTYFORGE_SWEEP_INTERVAL_SECS")?;
        let ttl = seconds(&lookup, "PARTYFORGE_SESSION_TTL_SECS")?;
        let sweep = match interval {
            Some(interval) if !interval.is_zero() => {
                let defaults = SweepConfig::default();
                Some(SweepConfig::every(interval, ttl.unwrap_or(defaults.ttl)))
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            kind,
            link_template,
            sweep,
        })
    }

    /// Renders the access link for `access_code`.
    pub fn access_url(&self, access_code: &str) -> String {
        self.link_template.replace(CODE_PLACEHOLDER, access_code)
    }
}

pub(crate) fn validate_template(template: &str) -> Result<(), PartyforgeError> {
    if template.contains(CODE_PLACEHOLDER) {
        Ok(())
    } else {
        Err(PartyforgeError::Config(format!(
            "link template {template:?} has no {CODE_PLACEHOLDER} placeholder"
        )))
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, PartyforgeError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    PartyforgeError::Config(format!("{key} must be whole seconds, got {raw:?}"))
                })
        })
        .transpose()
}

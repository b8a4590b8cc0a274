use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Zone used to turn event instants into wall-clock stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    System,
    Named(Tz),
}

/// Wall-clock time of an event plus the zone label written into entry lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub local: NaiveDateTime,
    pub zone_label: String,
}

impl Stamp {
    pub fn new(local: NaiveDateTime, zone_label: impl Into<String>) -> Self {
        Self {
            local,
            zone_label: zone_label.into(),
        }
    }
}

impl Zone {
    pub fn parse(name: Option<&str>) -> Result<Self> {
        let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::System);
        };
        // POSIX TZ values may carry a leading colon (`TZ=:Asia/Shanghai`).
        let name = name.trim_start_matches(':');
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|err| anyhow!("invalid timezone `{name}`: {err}"))
    }

    pub fn stamp(&self, at: DateTime<Utc>) -> Stamp {
        match self {
            Self::System => {
                let local = at.with_timezone(&Local);
                Stamp::new(local.naive_local(), local.format("%Z").to_string())
            }
            Self::Named(tz) => {
                let local = at.with_timezone(tz);
                Stamp::new(local.naive_local(), local.format("%Z").to_string())
            }
        }
    }

    pub fn now(&self) -> Stamp {
        self.stamp(Utc::now())
    }

    pub fn describe(&self) -> String {
        match self {
            Self::System => "system".to_string(),
            Self::Named(tz) => tz.name().to_string(),
        }
    }
}

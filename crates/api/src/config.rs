use anyhow::Context;
use sched_core::DEFAULT_ROTATION_PERIOD;
use std::time::Duration;

/// Process settings, read once at startup from `TIMETABLE__*` variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Budget for solves that do not carry their own `params`.
    pub time_limit: Duration,
    pub rotation_period: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            time_limit: Duration::from_millis(30_000),
            rotation_period: DEFAULT_ROTATION_PERIOD,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Config::default();
        if let Some(v) = get("TIMETABLE__SERVER__PORT") {
            cfg.port = v.parse().context("TIMETABLE__SERVER__PORT")?;
        }
        if let Some(v) = get("TIMETABLE__SOLVER__TIME_LIMIT_MS") {
            let ms: u64 = v.parse().context("TIMETABLE__SOLVER__TIME_LIMIT_MS")?;
            cfg.time_limit = Duration::from_millis(ms);
        }
        if let Some(v) = get("TIMETABLE__ROTATION__PERIOD") {
            cfg.rotation_period = v.parse().context("TIMETABLE__ROTATION__PERIOD")?;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn overrides_and_bad_values() {
        let cfg = Config::from_lookup(lookup(&[
            ("TIMETABLE__SERVER__PORT", "9000"),
            ("TIMETABLE__SOLVER__TIME_LIMIT_MS", "1500"),
            ("TIMETABLE__ROTATION__PERIOD", "4"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.time_limit, Duration::from_millis(1500));
        assert_eq!(cfg.rotation_period, 4);

        let err = Config::from_lookup(lookup(&[("TIMETABLE__SERVER__PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("TIMETABLE__SERVER__PORT"));
    }
}

use crate::domain::DEFAULT_SERVICE_FEE_BPS;
use log::warn;
use std::path::PathBuf;

pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub intent_log_path: PathBuf,
    pub service_fee_bps: u32,
    pub theme: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("STAYCAL_DIR").map(PathBuf::from).unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("staycal")
        });

        let db_path = data_dir.join("availability.db");
        let intent_log_path = data_dir.join("booking_intents.jsonl");

        let service_fee_bps = match lookup("STAYCAL_SERVICE_FEE_BPS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(
                    "STAYCAL_SERVICE_FEE_BPS={} is not a whole number, using {}",
                    raw, DEFAULT_SERVICE_FEE_BPS
                );
                DEFAULT_SERVICE_FEE_BPS
            }),
            None => DEFAULT_SERVICE_FEE_BPS,
        };

        let theme = lookup("STAYCAL_THEME").unwrap_or_else(|| "dark".to_string());

        Self {
            data_dir,
            db_path,
            intent_log_path,
            service_fee_bps,
            theme,
        }
    }
}

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::{validate_time_slots, GenerateOptions, RotationScope, Strategy, TimeSlot};

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig { port: 8080 }
    }
}

/// Contents of `schedule.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub congregation: String,
    pub time_slots: Vec<TimeSlot>,
    pub strategy: Strategy,
    /// Chain all slots into one rotation instead of one per weekday + slot
    pub global_rotation: bool,
    pub one_outing_per_day: bool,
    pub roster_path: PathBuf,
    pub fixed_path: PathBuf,
    pub web: WebConfig,
    #[serde(skip)]
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            congregation: String::new(),
            time_slots: vec![
                TimeSlot {
                    id: "morning".to_string(),
                    start: "09:30".to_string(),
                    label: "Morning".to_string(),
                    weekdays: vec![],
                },
                TimeSlot {
                    id: "afternoon".to_string(),
                    start: "17:00".to_string(),
                    label: "Afternoon".to_string(),
                    weekdays: vec![1, 2, 3, 4, 5],
                },
            ],
            strategy: Strategy::Rotation,
            global_rotation: false,
            one_outing_per_day: true,
            roster_path: PathBuf::from("data/roster.csv"),
            fixed_path: PathBuf::from("data/fixed_assignments.csv"),
            web: WebConfig::default(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config file, or the defaults if it does not exist.
    /// `ADMIN_PASSWORD` is always read from the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            let config = AppConfig::from_toml(&text)?;
            info!("loaded config from {}", path.display());
            config
        } else {
            warn!("config file {} not found, using defaults", path.display());
            AppConfig::default()
        };

        config.admin_password = std::env::var("ADMIN_PASSWORD")
            .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<AppConfig> {
        let mut config: AppConfig = toml::from_str(text)?;
        validate_time_slots(&config.time_slots)?;
        config.admin_password = DEFAULT_ADMIN_PASSWORD.to_string();
        Ok(config)
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            strategy: self.strategy,
            rotation_scope: if self.global_rotation {
                RotationScope::Global
            } else {
                RotationScope::PerSlot
            },
            one_outing_per_day: self.one_outing_per_day,
        }
    }
}

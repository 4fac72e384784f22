use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::app::Settings;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, SqliteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    File,
    Memory,
}

impl StoreBackend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "file" | "files" => Ok(StoreBackend::File),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => bail!("unknown store backend '{}' (sqlite|file|memory)", other),
        }
    }

    fn default_path(&self) -> &'static str {
        match self {
            StoreBackend::Sqlite => "./ecosim.sqlite",
            StoreBackend::File => "./ecosim-data",
            StoreBackend::Memory => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub store_path: String,
    pub chart_dir: PathBuf,
    /// Overrides the stored daily water target when set.
    pub water_target_l: Option<f64>,
    /// Overrides the stored daily carbon budget when set.
    pub carbon_budget_kg: Option<f64>,
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).filter(|v: &f64| v.is_finite() && *v > 0.0)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store = StoreBackend::parse(&std::env::var("ECOSIM_STORE").unwrap_or_else(|_| "sqlite".to_string()))?;
        Ok(Self {
            store,
            store_path: std::env::var("ECOSIM_STORE_PATH").unwrap_or_else(|_| store.default_path().to_string()),
            chart_dir: std::env::var("ECOSIM_CHART_DIR").unwrap_or_else(|_| "out/charts".to_string()).into(),
            water_target_l: env_f64("ECOSIM_WATER_TARGET_L"),
            carbon_budget_kg: env_f64("ECOSIM_CARBON_BUDGET_KG"),
        })
    }

    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        Ok(match self.store {
            StoreBackend::Sqlite => Box::new(SqliteStore::new(&self.store_path)?),
            StoreBackend::File => Box::new(FileStore::new(&self.store_path)?),
            StoreBackend::Memory => Box::new(MemoryStore::new()),
        })
    }

    /// Apply the environment overrides on top of stored settings.
    pub fn overlay(&self, mut settings: Settings) -> Settings {
        if let Some(target) = self.water_target_l {
            settings.daily_water_target_l = target;
        }
        if let Some(budget) = self.carbon_budget_kg {
            settings.daily_carbon_budget_kg = budget;
        }
        settings
    }
}

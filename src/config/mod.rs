use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::app::state::PageSizeTiers;
use crate::engine::SortSpec;

pub mod themes;

pub use themes::{Palette, ThemeName};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Hearth";
const APP_NAME: &str = "hearth";

pub const CONFIG_ENV: &str = "HEARTH_CONFIG";
pub const DATA_ENV: &str = "HEARTH_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths);
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub dataset_path: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("state"));

        Ok(Self {
            config_dir,
            config_file,
            database_path: data_root.join("hearth.db"),
            dataset_path: data_root.join("hunts-data.json"),
            data_dir: data_root,
            log_dir: state_dir.join("logs"),
            state_dir,
        })
    }

    /// Every path under one root directory.
    pub fn rooted(root: &Path) -> Self {
        let config_dir = root.join("config");
        let data_dir = root.join("data");
        let state_dir = root.join("state");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            database_path: data_dir.join("hearth.db"),
            dataset_path: data_dir.join("hunts-data.json"),
            data_dir,
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.log_dir,
            &self.state_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hunt dataset; defaults to `hunts-data.json` in the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<PathBuf>,
    pub theme: String,
    #[serde_as(as = "DisplayFromStr")]
    pub default_sort: SortSpec,
    pub search: SearchOptions,
    pub viewport: ViewportOptions,
    pub storage: StorageOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            theme: ThemeName::Dark.to_string(),
            default_sort: SortSpec::default(),
            search: SearchOptions::default(),
            viewport: ViewportOptions::default(),
            storage: StorageOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.storage.resolve(paths);
        if self.dataset_path.is_none() {
            self.dataset_path = Some(paths.dataset_path.clone());
        }
        if self.theme.parse::<ThemeName>().is_err() {
            tracing::warn!(theme = %self.theme, "unknown theme in config, falling back to dark");
            self.theme = ThemeName::Dark.to_string();
        }
        self.viewport.clamp();
    }

    pub fn dataset_path(&self, paths: &ConfigPaths) -> PathBuf {
        self.dataset_path
            .clone()
            .unwrap_or_else(|| paths.dataset_path.clone())
    }

    pub fn theme_name(&self) -> ThemeName {
        self.theme.parse().unwrap_or_default()
    }

    pub fn palette(&self) -> Palette {
        self.theme_name().palette()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub debounce_ms: u64,
    /// Cap on rows printed by `hearth search --ranked`.
    pub max_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            max_results: 50,
        }
    }
}

impl SearchOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    /// Nominal pixel width of one terminal column.
    pub cell_width_px: u32,
    pub small_below: u32,
    pub medium_below: u32,
    pub small_page_size: usize,
    pub medium_page_size: usize,
    pub large_page_size: usize,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        let tiers = PageSizeTiers::default();
        Self {
            cell_width_px: 8,
            small_below: tiers.small_below,
            medium_below: tiers.medium_below,
            small_page_size: tiers.small,
            medium_page_size: tiers.medium,
            large_page_size: tiers.large,
        }
    }
}

impl ViewportOptions {
    fn clamp(&mut self) {
        self.cell_width_px = self.cell_width_px.max(1);
        self.small_page_size = self.small_page_size.max(1);
        self.medium_page_size = self.medium_page_size.max(1);
        self.large_page_size = self.large_page_size.max(1);
    }

    pub fn tiers(&self) -> PageSizeTiers {
        PageSizeTiers {
            small_below: self.small_below,
            medium_below: self.medium_below,
            small: self.small_page_size,
            medium: self.medium_page_size,
            large: self.large_page_size,
        }
    }

    pub fn width_for_columns(&self, columns: u16) -> u32 {
        u32::from(columns) * self.cell_width_px
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub database_path: PathBuf,
    pub wal_autocheckpoint: u32,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            database_path: PathBuf::new(),
            wal_autocheckpoint: 1000,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SortDirection, SortKey};
    use tempfile::TempDir;

    #[test]
    fn first_run_writes_defaults() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::with_paths(ConfigPaths::rooted(temp.path()));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert_eq!(cfg.search.debounce_ms, 300);
        assert_eq!(cfg.viewport.tiers(), PageSizeTiers::default());
        assert_eq!(cfg.dataset_path(loader.paths()), loader.paths().dataset_path);

        let reloaded = loader.load()?;
        assert_eq!(reloaded.default_sort, SortSpec::default());
        assert_eq!(reloaded.storage.database_path, loader.paths().database_path);
        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults_and_repairs_values() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            r#"
theme = "neon"
default_sort = "title-desc"

[viewport]
small_page_size = 0
cell_width_px = 10
"#,
        )?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.theme_name(), ThemeName::Dark);
        assert_eq!(
            cfg.default_sort,
            SortSpec::new(SortKey::Title, SortDirection::Desc)
        );
        assert_eq!(cfg.viewport.small_page_size, 1);
        assert_eq!(cfg.viewport.large_page_size, 9);
        assert_eq!(cfg.viewport.width_for_columns(80), 800);
        assert_eq!(cfg.search.max_results, 50);
        Ok(())
    }
}

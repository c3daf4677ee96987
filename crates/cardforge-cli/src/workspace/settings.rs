use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cardforge_core::{DEFAULT_INLINE_THRESHOLD, DatasetColumns, LiteralShape, YearWindow};

use super::atomic::write_bytes_atomic;
use super::{WorkspaceError, WorkspacePaths, WorkspaceResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    pub dataset: DatasetSettings,
    pub registry: RegistrySettings,
    pub generation: GenerationSettings,
    pub artifact: ArtifactSettings,
    pub welcome: WelcomeSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// CSV with BIN metadata; relative to the workspace root.
    pub path: PathBuf,
    pub columns: DatasetColumns,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/bin-list-data.csv"),
            columns: DatasetColumns::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// One registered user id per line; relative to the workspace root.
    pub users_path: PathBuf,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            users_path: PathBuf::from("data/bot_users.txt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub inline_threshold: usize,
    pub max_count: usize,
    pub literal_default_count: usize,
    pub literal_shape: LiteralShape,
    /// BIN prefixes eligible for `/gg`.
    pub random_prefixes: Vec<String>,
    /// Expiration years are drawn from `now + min` ..= `now + max`.
    pub expiry_min_years: u16,
    pub expiry_max_years: u16,
    /// Fixed RNG seed for reproducible sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerationSettings {
    pub fn year_window(&self) -> YearWindow {
        YearWindow::from_offsets(self.expiry_min_years, self.expiry_max_years)
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            max_count: 5000,
            literal_default_count: 1,
            literal_shape: LiteralShape::Full,
            random_prefixes: vec![
                "4".to_string(),
                "5".to_string(),
                "34".to_string(),
                "37".to_string(),
            ],
            expiry_min_years: 0,
            expiry_max_years: 7,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    /// Append a `# generated N cards in X ms` line to attachments.
    pub duration_footer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelcomeSettings {
    /// Media sent with `/start` to unregistered users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_path: Option<PathBuf>,
}

impl BotSettings {
    pub fn validate(&self) -> WorkspaceResult<()> {
        let generation = &self.generation;
        if generation.inline_threshold == 0 {
            return Err(WorkspaceError::Invalid(
                "generation.inline_threshold must be at least 1".to_string(),
            ));
        }
        if generation.max_count == 0 {
            return Err(WorkspaceError::Invalid(
                "generation.max_count must be at least 1".to_string(),
            ));
        }
        if generation.literal_default_count == 0
            || generation.literal_default_count > generation.max_count
        {
            return Err(WorkspaceError::Invalid(
                "generation.literal_default_count must be between 1 and max_count".to_string(),
            ));
        }
        if generation.expiry_min_years > generation.expiry_max_years {
            return Err(WorkspaceError::Invalid(
                "generation.expiry_min_years must be <= expiry_max_years".to_string(),
            ));
        }
        if generation
            .random_prefixes
            .iter()
            .any(|prefix| prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(WorkspaceError::Invalid(
                "generation.random_prefixes must be non-empty digit strings".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_or_create_settings(paths: &WorkspacePaths) -> WorkspaceResult<BotSettings> {
    let path = paths.settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        let settings: BotSettings = toml::from_str(&content)?;
        settings.validate()?;
        return Ok(settings);
    }

    let settings = BotSettings::default();
    save_settings(paths, &settings)?;
    Ok(settings)
}

pub fn save_settings(paths: &WorkspacePaths, settings: &BotSettings) -> WorkspaceResult<()> {
    let path = paths.settings_path();
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(&path, encoded.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: BotSettings = toml::from_str(
            r#"
            [dataset.columns]
            country_code = "country_iso"

            [generation]
            literal_shape = "short"
            seed = 7
            "#,
        )
        .expect("parse settings");
        assert_eq!(settings.dataset.columns.country_code, "country_iso");
        assert_eq!(settings.dataset.columns.bin, "BIN");
        assert_eq!(settings.generation.literal_shape, LiteralShape::Short);
        assert_eq!(settings.generation.seed, Some(7));
        assert_eq!(settings.generation.inline_threshold, 20);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let encoded = toml::to_string_pretty(&BotSettings::default()).expect("encode");
        let decoded: BotSettings = toml::from_str(&encoded).expect("decode");
        assert_eq!(decoded, BotSettings::default());
    }

    #[test]
    fn inverted_expiry_window_is_rejected() {
        let mut settings = BotSettings::default();
        settings.generation.expiry_min_years = 5;
        settings.generation.expiry_max_years = 2;
        assert!(matches!(settings.validate(), Err(WorkspaceError::Invalid(_))));
    }
}

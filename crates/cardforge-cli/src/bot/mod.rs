mod commands;
mod delivery;

pub use commands::{COMMANDS, execute_command};

use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

use cardforge_core::{
    BatchGenerator, BinCatalog, CardError, CatalogSource, CatalogStore, FieldRandomizer,
};

use crate::registry::{RegistryError, UserRegistry};
use crate::workspace::{BotSettings, WorkspaceError, WorkspacePaths};

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Card(#[from] CardError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("registration required")]
    RegistrationRequired,
    #[error("usage: {0}")]
    Usage(String),
}

pub type BotResult<T> = Result<T, BotError>;

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Text { text: String },
    Document { path: PathBuf, caption: String },
    Media { path: PathBuf, caption: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Command handler state shared across requests.
pub struct Bot {
    paths: WorkspacePaths,
    settings: BotSettings,
    catalog: CatalogStore,
    users: UserRegistry,
    generator: BatchGenerator,
    rng: ChaCha8Rng,
}

impl Bot {
    pub fn new(paths: WorkspacePaths, settings: BotSettings) -> Self {
        let store = CatalogStore::new(catalog_source(&paths, &settings));
        Self::from_parts(paths, settings, store)
    }

    /// Bot backed by an already built catalog instead of the dataset file.
    pub fn with_catalog(paths: WorkspacePaths, settings: BotSettings, catalog: BinCatalog) -> Self {
        let store = CatalogStore::with_catalog(catalog_source(&paths, &settings), catalog);
        Self::from_parts(paths, settings, store)
    }

    fn from_parts(paths: WorkspacePaths, settings: BotSettings, catalog: CatalogStore) -> Self {
        let users = UserRegistry::new(paths.resolve(&settings.registry.users_path));
        let randomizer = FieldRandomizer::new(settings.generation.year_window());
        let generator = BatchGenerator::new(randomizer, settings.generation.inline_threshold);
        let rng = match settings.generation.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::seed_from_u64(rand::random()),
        };
        Self {
            paths,
            settings,
            catalog,
            users,
            generator,
            rng,
        }
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Handle one command; failures become user-facing replies.
    pub fn handle(&mut self, user_id: &str, input: &str) -> Vec<Reply> {
        let command = input.split_whitespace().next().unwrap_or_default();
        tracing::info!(event = "command_received", user_id = %user_id, command = %command);

        match execute_command(self, user_id, input) {
            Ok(replies) => replies,
            Err(err) => {
                let message = user_message(&err);
                if is_internal(&err) {
                    tracing::error!(
                        event = "command_failed",
                        user_id = %user_id,
                        command = %command,
                        error = %err
                    );
                } else {
                    tracing::info!(
                        event = "command_rejected",
                        user_id = %user_id,
                        command = %command,
                        reason = %err
                    );
                }
                vec![Reply::text(message)]
            }
        }
    }

    fn require_registered(&self, user_id: &str) -> BotResult<()> {
        if self.users.is_registered(user_id)? {
            Ok(())
        } else {
            Err(BotError::RegistrationRequired)
        }
    }
}

fn catalog_source(paths: &WorkspacePaths, settings: &BotSettings) -> CatalogSource {
    CatalogSource {
        path: paths.resolve(&settings.dataset.path),
        columns: settings.dataset.columns.clone(),
    }
}

/// Text shown to the user for a failed command.
pub fn user_message(err: &BotError) -> String {
    match err {
        BotError::Card(CardError::Validation { field, reason }) => {
            format!("Invalid {field}: {reason}.")
        }
        BotError::Card(CardError::NoMatchingBin(label)) => format!("No BINs found for {label}."),
        BotError::Card(CardError::UnknownBin(bin)) => format!("No information found for BIN {bin}."),
        BotError::Card(err @ CardError::PrefixTooLong { .. }) => format!("{err}."),
        BotError::Registry(RegistryError::InvalidUserId(_)) => {
            "Your user id cannot be registered.".to_string()
        }
        BotError::RegistrationRequired => "You need to register first using /register.".to_string(),
        BotError::Usage(usage) => format!("Usage: {usage}"),
        _ => "Something went wrong while handling your command. Please try again later."
            .to_string(),
    }
}

fn is_internal(err: &BotError) -> bool {
    !matches!(
        err,
        BotError::Card(
            CardError::Validation { .. }
                | CardError::NoMatchingBin(_)
                | CardError::UnknownBin(_)
                | CardError::PrefixTooLong { .. }
        ) | BotError::Registry(RegistryError::InvalidUserId(_))
            | BotError::RegistrationRequired
            | BotError::Usage(_)
    )
}

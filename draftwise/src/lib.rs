use std::path::PathBuf;
use std::sync::Arc;

use draftwise_extensions::store::JsonFileStore;

pub mod cli;
pub mod commands;
pub mod host;
pub mod options;

pub const STORE_FILE: &str = "storage.json";
pub const EXCHANGE_DIR: &str = "exchanges";

pub struct AppContext {
    pub store: Arc<JsonFileStore>,
    pub options: Arc<options::LayeredOptions>,
    /// Where LLM exchanges are recorded, if enabled.
    pub exchange_dir: Option<PathBuf>,
    pub quiet: bool,
}

impl AppContext {
    pub async fn from_cli(cli: &cli::Cli) -> anyhow::Result<Self> {
        let store = Arc::new(JsonFileStore::new(cli.state_dir.join(STORE_FILE)));

        let mut layered = options::LayeredOptions::new(store.clone());
        if let Some(path) = &cli.options {
            layered = layered.with_file(path).await?;
        }
        let layered = layered
            .with_override("model", cli.model.clone())
            .with_override("api_token", cli.api_token.clone());

        Ok(Self {
            store,
            options: Arc::new(layered),
            exchange_dir: cli.log_exchanges.then(|| cli.state_dir.join(EXCHANGE_DIR)),
            quiet: cli.quiet,
        })
    }
}

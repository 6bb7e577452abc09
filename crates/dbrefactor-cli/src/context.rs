use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dbrefactor_core::Plan;
use dbrefactor_storage::{DynStore, FileStore, NullStore};
use tracing::{debug, warn};

use crate::api::{Connection, GenerationOptions};
use crate::cli::{Cli, ConnectionArgs, OutputFormat};
use crate::client::RefactorClient;
use crate::config::{self, ProfileConfig};
use crate::llm::{API_KEY_ENV, LlmClient};
use crate::plan_file;
use crate::session::{self, StoredSession};

/// Everything a command needs, resolved once from flags, env and the profile config.
pub struct AppContext {
    pub profile: String,
    /// `~/.dbrefactor` (or `$DBREFACTOR_HOME`); `None` if no home directory exists.
    pub home: Option<PathBuf>,
    pub config: ProfileConfig,
    pub server: String,
    pub format: OutputFormat,
    pub plan_path: PathBuf,
    pub root_key: String,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let home = config::home_dir();
        let config = match &home {
            Some(dir) => config::load_profile(dir, &cli.profile)?,
            None => ProfileConfig::default(),
        };
        Ok(Self::resolve(cli, home, config))
    }

    fn resolve(cli: &Cli, home: Option<PathBuf>, config: ProfileConfig) -> Self {
        let server = config::resolve_server(cli.server.as_deref(), &config);
        let format = cli.format.unwrap_or_else(|| match config.format.as_deref() {
            Some("json") => OutputFormat::Json,
            Some("yaml") => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        });
        let plan_path = PathBuf::from(cli.plan.as_deref().unwrap_or(config.plan_file()));
        let root_key = cli
            .root_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| config.root_key().to_string());
        debug!(profile = %cli.profile, %server, root_key = %root_key, plan = %plan_path.display(), "resolved context");
        Self {
            profile: cli.profile.clone(),
            home,
            config,
            server,
            format,
            plan_path,
            root_key,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs())
    }

    pub fn home(&self) -> Result<&Path> {
        self.home
            .as_deref()
            .context("Cannot determine home directory (set DBREFACTOR_HOME)")
    }

    pub fn client(&self) -> Result<RefactorClient> {
        Ok(RefactorClient::new(&self.server, self.timeout())?)
    }

    pub fn llm(&self) -> Result<LlmClient> {
        let api_key = std::env::var(API_KEY_ENV).ok();
        if api_key.is_none() {
            warn!("{API_KEY_ENV} is not set; calling the model without credentials");
        }
        Ok(LlmClient::new(
            self.config.llm_url(),
            self.config.llm_model(),
            api_key,
            self.timeout(),
        )?)
    }

    /// Store holding the applied sets. Without a home directory nothing is persisted.
    pub fn store(&self) -> DynStore {
        match &self.home {
            Some(dir) => std::sync::Arc::new(FileStore::new(dir.join("applied"))),
            None => {
                warn!("no home directory, applied operations will not be remembered");
                std::sync::Arc::new(NullStore)
            }
        }
    }

    pub fn load_plan(&self) -> Result<Plan> {
        plan_file::load_plan(&self.plan_path)
    }

    pub fn save_plan(&self, plan: &Plan) -> Result<()> {
        plan_file::save_plan(&self.plan_path, plan)
    }

    /// Profile switches, with `allow_destructive` raised by the command-line flag.
    pub fn generation_options(&self, allow_destructive: bool) -> GenerationOptions {
        GenerationOptions {
            use_synonyms: self.config.use_synonyms(),
            use_views: self.config.use_views(),
            cqrs: self.config.cqrs(),
            allow_destructive: allow_destructive || self.config.allow_destructive(),
        }
    }

    pub fn load_session(&self) -> Result<Option<StoredSession>> {
        match &self.home {
            Some(dir) => session::load_session(dir, &self.profile),
            None => Ok(None),
        }
    }

    /// `--connection-string` if given, else the stored session for this profile.
    pub fn connection(&self, args: &ConnectionArgs) -> Result<Connection> {
        if let Some(cs) = args.connection_string.as_deref().filter(|s| !s.trim().is_empty()) {
            return Ok(Connection::ConnectionString {
                connection_string: cs.to_string(),
            });
        }
        let Some(stored) = self.load_session()? else {
            anyhow::bail!(
                "No session. Run: dbrefactor session connect <connection-string>, or pass --connection-string"
            );
        };
        if stored.server != self.server {
            anyhow::bail!(
                "The stored session belongs to {}, not {}. Reconnect with: dbrefactor session connect",
                stored.server,
                self.server
            );
        }
        if stored.is_expired() {
            anyhow::bail!(
                "Session expired at {}. Reconnect with: dbrefactor session connect",
                stored.expires_at_utc
            );
        }
        Ok(Connection::Session {
            session_id: stored.session_id,
        })
    }
}

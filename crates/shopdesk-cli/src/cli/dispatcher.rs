use crate::cli::command_handlers::{
    AppConfigHandler, AuthHandler, CategoryHandler, ConfigHandler, OrderHandler, ProductHandler,
};
use crate::cli::main_types::{Commands, OutputFormat};
use shopdesk_core::api::client::ApiClient;
use shopdesk_core::core::app_context::AppContext;
use shopdesk_core::core::auth::AuthContext;
use shopdesk_core::error::{AppError, AuthError, CliError};
use shopdesk_core::storage::config::Config;
use shopdesk_core::storage::session::{FileStorage, Session};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a command needs to talk to the backend.
pub struct Services {
    pub config: Config,
    pub api: ApiClient,
    pub ctx: Arc<AppContext>,
    pub auth: AuthContext,
    pub format: OutputFormat,
}

pub struct Dispatcher {
    config: Config,
    config_dir: Option<PathBuf>,
    api_url: Option<String>,
    format: OutputFormat,
}

impl Dispatcher {
    pub fn new(
        config: Config,
        config_dir: Option<PathBuf>,
        api_url: Option<String>,
        format: OutputFormat,
    ) -> Self {
        Self {
            config,
            config_dir,
            api_url,
            format,
        }
    }

    fn state_dir(&self) -> Result<PathBuf, AppError> {
        match &self.config_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Config::default_dir()?),
        }
    }

    fn create_services(&self, ctx: Arc<AppContext>) -> Result<Services, AppError> {
        let api_url = self.config.resolve_api_url(self.api_url.as_deref());
        let dir = self.state_dir()?;
        log::debug!("Using API {} with session state in {}", api_url, dir.display());

        let session = Session::new(Arc::new(FileStorage::in_dir(&dir)));
        let api = ApiClient::with_timeout(api_url, session, self.config.timeout_secs)?
            .with_navigator(ctx.clone());
        let auth = AuthContext::new(api.clone(), self.config.security.clone());
        auth.init();

        Ok(Services {
            config: self.config.clone(),
            api,
            ctx,
            auth,
            format: self.format,
        })
    }

    fn require_login(services: &Services) -> Result<(), AppError> {
        match services.auth.require_user() {
            Ok(_) => Ok(()),
            Err(AuthError::NotAuthenticated) => Err(AppError::Cli(CliError::AuthRequired {
                message: "You are not signed in".to_string(),
                hint: "Run 'shopdesk auth login --email <email>' first".to_string(),
            })),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn dispatch(&self, command: Commands, ctx: Arc<AppContext>) -> Result<(), AppError> {
        match command {
            Commands::Config { command } => {
                let handler = ConfigHandler::new(self.config_dir.clone());
                handler.handle(command, self.config.clone(), self.format)
            }
            Commands::Auth { command } => {
                let services = self.create_services(ctx)?;
                AuthHandler::new().handle(command, &services).await
            }
            Commands::Product { command } => {
                let services = self.create_services(ctx)?;
                Self::require_login(&services)?;
                ProductHandler::new().handle(command, &services).await
            }
            Commands::Category { command } => {
                let services = self.create_services(ctx)?;
                Self::require_login(&services)?;
                CategoryHandler::new().handle(command, &services).await
            }
            Commands::Order { command } => {
                let services = self.create_services(ctx)?;
                Self::require_login(&services)?;
                OrderHandler::new().handle(command, &services).await
            }
            Commands::AppConfig { command } => {
                let services = self.create_services(ctx)?;
                Self::require_login(&services)?;
                AppConfigHandler::new().handle(command, &services).await
            }
        }
    }
}

use crate::cli::dispatcher::Services;
use crate::cli::main_types::{
    AppConfigCommands, AuthCommands, CategoryCommands, ConfigCommands, OrderCommands,
    OutputFormat, PageArgs, ProductCommands,
};
use crate::cli::search::interactive_search;
use serde_json::{Map, Value, json};
use shopdesk_core::api::models::AppConfigs;
use shopdesk_core::core::actions::{AppConfigActions, ResourceActions};
use shopdesk_core::core::app_context::{AppContext, NotificationKind};
use shopdesk_core::core::list::{ListState, ResourceList};
use shopdesk_core::core::resource::{
    Categories, CategoryFilters, ListFilters, OrderFilters, Orders, ProductFilters, Products,
    Resource, Stats,
};
use shopdesk_core::display::TableDisplay;
use shopdesk_core::error::{AppError, CliError};
use shopdesk_core::storage::config::{API_URL_ENV, Config};
use std::path::PathBuf;

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Cli(CliError::InvalidArguments(message.into()))
}

/// The failure was already reported through the app context notifications.
fn ensure(ok: bool, what: &str) -> Result<(), AppError> {
    if ok {
        Ok(())
    } else {
        Err(AppError::Cli(CliError::ActionFailed(format!("{} failed", what))))
    }
}

pub fn print_json(value: &Value) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| invalid(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// Print and drop all pending notifications, oldest first, on stderr.
pub fn flush_notifications(ctx: &AppContext) {
    for notification in ctx.drain_notifications() {
        let marker = match notification.kind {
            NotificationKind::Success => "✅",
            NotificationKind::Error => "❌",
            NotificationKind::Warning => "⚠️",
            NotificationKind::Info => "ℹ️",
        };
        eprintln!("{} {}", marker, notification.message);
    }
}

fn list_json(state: &ListState, page: u32) -> Value {
    json!({
        "items": state.items,
        "stats": state.stats,
        "page": page,
        "totalPages": state.total_pages,
        "totalItems": state.total_items,
    })
}

pub fn print_list<R: Resource>(
    format: OutputFormat,
    state: &ListState,
    page: u32,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => print_json(&list_json(state, page)),
        OutputFormat::Table => {
            println!("{}", TableDisplay::new().render_list::<R>(state, page));
            Ok(())
        }
    }
}

fn print_entity(format: OutputFormat, entity: &Value) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => print_json(entity),
        OutputFormat::Table => {
            println!("{}", TableDisplay::new().render_entity(entity));
            Ok(())
        }
    }
}

/// `--data` must hold a JSON object.
fn parse_payload(data: &str) -> Result<Value, AppError> {
    match serde_json::from_str::<Value>(data) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(invalid("--data must be a JSON object")),
        Err(e) => Err(invalid(format!("--data is not valid JSON: {}", e))),
    }
}

async fn show_list<R: Resource>(services: &Services, filters: R::Filters) -> Result<(), AppError> {
    let page = filters.page();
    let list: ResourceList<R> =
        ResourceList::new(services.api.clone(), filters, services.ctx.clone());
    let state = list.settled().await;
    if state.error.is_some() {
        return ensure(false, &format!("Loading {}", R::ITEMS_KEY));
    }
    print_list::<R>(services.format, &state, page)
}

async fn show_entity<R: Resource>(services: &Services, id: &str) -> Result<(), AppError> {
    let actions: ResourceActions<R> =
        ResourceActions::new(services.api.clone(), services.ctx.clone());
    match actions.get(id).await {
        Some(entity) => print_entity(services.format, &entity),
        None => ensure(false, &format!("{} lookup", R::LABEL)),
    }
}

fn page_limit(page: &PageArgs, services: &Services) -> u32 {
    page.limit.unwrap_or(services.config.page_size).max(1)
}

fn prompt_password(prompt: &str) -> Result<String, AppError> {
    rpassword::prompt_password(prompt)
        .map_err(|e| invalid(format!("Failed to read password: {}", e)))
}

fn prompt_new_password() -> Result<String, AppError> {
    let password = prompt_password("New password: ")?;
    let confirm = prompt_password("Confirm new password: ")?;
    if password != confirm {
        return Err(invalid("Passwords do not match"));
    }
    Ok(password)
}

pub struct ConfigHandler {
    config_dir: Option<PathBuf>,
}

impl ConfigHandler {
    pub fn new(config_dir: Option<PathBuf>) -> Self {
        Self { config_dir }
    }

    pub fn handle(
        &self,
        command: ConfigCommands,
        mut config: Config,
        format: OutputFormat,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                log::debug!("Showing configuration");
                if format == OutputFormat::Json {
                    let mut value = serde_json::to_value(&config)
                        .map_err(|e| invalid(e.to_string()))?;
                    value["resolved_api_url"] = json!(config.resolve_api_url(None));
                    return print_json(&value);
                }

                let api_url = match &config.api_url {
                    Some(url) => url.clone(),
                    None => format!("(not set, using {})", config.resolve_api_url(None)),
                };
                let rows = vec![
                    vec!["api_url".to_string(), api_url],
                    vec!["timeout_secs".to_string(), config.timeout_secs.to_string()],
                    vec!["page_size".to_string(), config.page_size.to_string()],
                    vec![
                        "search_debounce_ms".to_string(),
                        config.search_debounce_ms.to_string(),
                    ],
                    vec![
                        "security.max_login_attempts".to_string(),
                        config.security.max_login_attempts.to_string(),
                    ],
                    vec![
                        "security.lockout_minutes".to_string(),
                        config.security.lockout_minutes.to_string(),
                    ],
                    vec![
                        "security.session_timeout_hours".to_string(),
                        config.security.session_timeout_hours.to_string(),
                    ],
                ];
                println!("Current Configuration:");
                println!(
                    "{}",
                    TableDisplay::new().render_simple_table(&["Key", "Value"], &rows)
                );
                if std::env::var(API_URL_ENV).is_ok_and(|v| !v.is_empty()) {
                    println!("{} is set and overrides api_url", API_URL_ENV);
                }
                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                log::debug!("Setting {} = {}", key, value);
                config.set_value(&key, &value)?;
                let path = Config::file_in(self.config_dir.as_deref())?;
                config.save(Some(path.clone()))?;
                println!("✅ Set {} to {}", key, value);
                println!("Configuration saved to {}", path.display());
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct AuthHandler;

impl AuthHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: AuthCommands, services: &Services) -> Result<(), AppError> {
        let auth = &services.auth;
        match command {
            AuthCommands::Login { email, password } => {
                let password = match password {
                    Some(p) => p,
                    None => prompt_password("Password: ")?,
                };
                let user = auth.login(&email, &password).await?;
                println!("✅ Signed in as {} <{}> ({})", user.name, user.email, user.role);
                Ok(())
            }
            AuthCommands::Logout => {
                auth.logout().await?;
                println!("Signed out.");
                Ok(())
            }
            AuthCommands::Status => {
                let Some(user) = auth.user() else {
                    println!("Not signed in.");
                    return Ok(());
                };
                let expiry = services.api.session().expiry()?;
                if services.format == OutputFormat::Json {
                    return print_json(&json!({
                        "user": user,
                        "expiresAt": expiry.map(|e| e.to_rfc3339()),
                    }));
                }
                let rows = vec![
                    vec!["Name".to_string(), user.name.clone()],
                    vec!["Email".to_string(), user.email.clone()],
                    vec!["Role".to_string(), user.role.clone()],
                    vec!["Permissions".to_string(), user.permissions.join(", ")],
                    vec![
                        "Session expires".to_string(),
                        expiry
                            .map(|e| e.format("%Y-%m-%d %H:%M UTC").to_string())
                            .unwrap_or_else(|| "never".to_string()),
                    ],
                ];
                println!(
                    "{}",
                    TableDisplay::new().render_simple_table(&["Field", "Value"], &rows)
                );
                Ok(())
            }
            AuthCommands::ForgotPassword { email } => {
                println!("{}", auth.forgot_password(&email).await?);
                Ok(())
            }
            AuthCommands::VerifyOtp { email, otp } => {
                let token = auth.verify_otp(&email, &otp).await?;
                println!("Reset token: {}", token);
                println!("Next: shopdesk auth reset-password {}", token);
                Ok(())
            }
            AuthCommands::ResetPassword { token, password } => {
                let password = match password {
                    Some(p) => p,
                    None => prompt_new_password()?,
                };
                println!("✅ {}", auth.reset_password(&token, &password).await?);
                Ok(())
            }
            AuthCommands::ChangePassword => {
                let current = prompt_password("Current password: ")?;
                let new_password = prompt_new_password()?;
                println!("✅ {}", auth.change_password(&current, &new_password).await?);
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct ProductHandler;

impl ProductHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: ProductCommands,
        services: &Services,
    ) -> Result<(), AppError> {
        let actions: ResourceActions<Products> =
            ResourceActions::new(services.api.clone(), services.ctx.clone());
        match command {
            ProductCommands::List {
                search,
                status,
                category,
                page,
            } => {
                let filters = ProductFilters {
                    search: search.unwrap_or_default(),
                    status,
                    category: category.unwrap_or_default(),
                    page: page.page.max(1),
                    limit: page_limit(&page, services),
                };
                show_list::<Products>(services, filters).await
            }
            ProductCommands::Get { id } => show_entity::<Products>(services, &id).await,
            ProductCommands::Create { data } => {
                let payload = parse_payload(&data)?;
                ensure(actions.create(payload).await, "Product create")
            }
            ProductCommands::Update { id, data } => {
                let payload = parse_payload(&data)?;
                ensure(actions.update(&id, payload).await, "Product update")
            }
            ProductCommands::Delete { id } => {
                ensure(actions.delete(&id).await, "Product delete")
            }
            ProductCommands::Search { status } => {
                let filters = ProductFilters {
                    status,
                    limit: services.config.page_size.max(1),
                    ..ProductFilters::default()
                };
                interactive_search(services, filters).await
            }
        }
    }
}

#[derive(Default)]
pub struct CategoryHandler;

impl CategoryHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: CategoryCommands,
        services: &Services,
    ) -> Result<(), AppError> {
        let actions: ResourceActions<Categories> =
            ResourceActions::new(services.api.clone(), services.ctx.clone());
        match command {
            CategoryCommands::List {
                search,
                status,
                page,
            } => {
                let filters = CategoryFilters {
                    search: search.unwrap_or_default(),
                    status,
                    page: page.page.max(1),
                    limit: page_limit(&page, services),
                };
                show_list::<Categories>(services, filters).await
            }
            CategoryCommands::Get { id } => show_entity::<Categories>(services, &id).await,
            CategoryCommands::Create { name, status } => {
                let mut payload = Map::new();
                payload.insert("name".to_string(), json!(name));
                if let Some(status) = status {
                    payload.insert("status".to_string(), json!(status.as_str()));
                }
                ensure(actions.create(Value::Object(payload)).await, "Category create")
            }
            CategoryCommands::Update { id, name, status } => {
                let mut payload = Map::new();
                if let Some(name) = name {
                    payload.insert("name".to_string(), json!(name));
                }
                if let Some(status) = status {
                    payload.insert("status".to_string(), json!(status.as_str()));
                }
                if payload.is_empty() {
                    return Err(invalid("Nothing to update. Use --name and/or --status"));
                }
                ensure(
                    actions.update(&id, Value::Object(payload)).await,
                    "Category update",
                )
            }
            CategoryCommands::Delete { id } => {
                ensure(actions.delete(&id).await, "Category delete")
            }
        }
    }
}

#[derive(Default)]
pub struct OrderHandler;

impl OrderHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(&self, command: OrderCommands, services: &Services) -> Result<(), AppError> {
        let actions: ResourceActions<Orders> =
            ResourceActions::new(services.api.clone(), services.ctx.clone());
        match command {
            OrderCommands::List {
                payment_status,
                order_status,
                order_type,
                from,
                to,
                search,
                page,
            } => {
                if let (Some(from), Some(to)) = (from, to) {
                    if from > to {
                        return Err(invalid("--from must not be after --to"));
                    }
                }
                let filters = OrderFilters {
                    payment_status,
                    order_status,
                    order_type,
                    start_date: from,
                    end_date: to,
                    search: search.unwrap_or_default(),
                    page: page.page.max(1),
                    limit: page_limit(&page, services),
                };
                show_list::<Orders>(services, filters).await
            }
            OrderCommands::Get { id } => show_entity::<Orders>(services, &id).await,
            OrderCommands::ByContact { email } => {
                let Some(orders) = actions.orders_by_contact(&email).await else {
                    return ensure(false, "Order lookup");
                };
                match services.format {
                    OutputFormat::Json => print_json(&Value::Array(orders)),
                    OutputFormat::Table => {
                        let count = orders.len();
                        let state = ListState {
                            items: orders,
                            total_items: count as u64,
                            ..ListState::empty(Stats::new())
                        };
                        println!("{}", TableDisplay::new().render_items::<Orders>(&state));
                        println!("{} orders for {}", count, email);
                        Ok(())
                    }
                }
            }
            OrderCommands::UpdateStatus {
                id,
                status,
                payment,
            } => {
                let mut payload = Map::new();
                if let Some(status) = status {
                    payload.insert("orderStatus".to_string(), json!(status.as_str()));
                }
                if let Some(payment) = payment {
                    payload.insert("paymentStatus".to_string(), json!(payment.as_str()));
                }
                if payload.is_empty() {
                    return Err(invalid("Nothing to update. Use --status and/or --payment"));
                }
                ensure(
                    actions.mutate(Some(&id), Value::Object(payload)).await,
                    "Order update",
                )
            }
        }
    }
}

#[derive(Default)]
pub struct AppConfigHandler;

impl AppConfigHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: AppConfigCommands,
        services: &Services,
    ) -> Result<(), AppError> {
        let actions = AppConfigActions::new(services.api.clone(), services.ctx.clone());
        let Some(current) = actions.refresh().await else {
            return ensure(false, "Loading app configs");
        };
        match command {
            AppConfigCommands::Show => Self::print_configs(services.format, &current),
            AppConfigCommands::Update {
                shipping_cost,
                pickup_address,
            } => {
                if shipping_cost.is_none() && pickup_address.is_none() {
                    return Err(invalid(
                        "Nothing to update. Use --shipping-cost and/or --pickup-address",
                    ));
                }
                let updated = AppConfigs {
                    shipping_cost: shipping_cost.unwrap_or(current.shipping_cost),
                    pickup_address: pickup_address.unwrap_or(current.pickup_address),
                };
                ensure(actions.update(updated.clone()).await, "App config update")?;
                Self::print_configs(services.format, &updated)
            }
        }
    }

    fn print_configs(format: OutputFormat, configs: &AppConfigs) -> Result<(), AppError> {
        match format {
            OutputFormat::Json => {
                let value = serde_json::to_value(configs).map_err(|e| invalid(e.to_string()))?;
                print_json(&value)
            }
            OutputFormat::Table => {
                let rows = vec![
                    vec![
                        "Shipping cost".to_string(),
                        format!("{:.2}", configs.shipping_cost),
                    ],
                    vec!["Pickup address".to_string(), configs.pickup_address.clone()],
                ];
                println!(
                    "{}",
                    TableDisplay::new().render_simple_table(&["Setting", "Value"], &rows)
                );
                Ok(())
            }
        }
    }
}

//! Resource mutation hooks
//!
//! Every action reports failures through the feedback channel and returns a
//! plain `bool` (or `Option` for reads). Nothing propagates and nothing
//! refreshes a list on its own.

use crate::api::client::ApiClient;
use crate::api::models::AppConfigs;
use crate::core::app_context::AppContext;
use crate::core::feedback::Feedback;
use crate::core::forms::{self, ValidationMode};
use crate::core::resource::{Orders, Resource};
use crate::error::ApiError;
use crate::utils::validation::is_valid_email;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts overlapping actions; `loading` holds until the last one finishes.
#[derive(Debug, Default, Clone)]
struct InFlight(Arc<AtomicUsize>);

struct InFlightGuard(Arc<AtomicUsize>);

impl InFlight {
    fn start(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(&self.0))
    }

    fn active(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ResourceActions<R: Resource> {
    api: ApiClient,
    feedback: Arc<dyn Feedback>,
    in_flight: InFlight,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceActions<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            feedback: Arc::clone(&self.feedback),
            in_flight: self.in_flight.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceActions<R> {
    pub fn new(api: ApiClient, feedback: Arc<dyn Feedback>) -> Self {
        Self {
            api,
            feedback,
            in_flight: InFlight::default(),
            _resource: PhantomData,
        }
    }

    /// True while at least one action is pending. Independent from list loading.
    pub fn loading(&self) -> bool {
        self.in_flight.active()
    }

    fn report(&self, action: &str, err: &ApiError) {
        log::warn!("{} {} failed: {}", R::LABEL, action, err);
        self.feedback.error(&err.user_message());
    }

    fn validate(&self, payload: &Value, mode: ValidationMode) -> bool {
        match R::SCHEMA.validate(payload, mode) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("{} payload rejected: {:?}", R::LABEL, e.errors);
                self.feedback.error(&e.to_string());
                false
            }
        }
    }

    pub async fn create(&self, payload: Value) -> bool {
        if !self.validate(&payload, ValidationMode::Full) {
            return false;
        }
        let _guard = self.in_flight.start();
        match self.api.create_resource(R::PATH, payload).await {
            Ok(envelope) => {
                self.feedback.success(
                    &envelope.message_or(&format!("{} created successfully", R::LABEL)),
                );
                true
            }
            Err(e) => {
                self.report("create", &e);
                false
            }
        }
    }

    pub async fn update(&self, id: &str, payload: Value) -> bool {
        if !self.validate(&payload, ValidationMode::Partial) {
            return false;
        }
        let _guard = self.in_flight.start();
        match self.api.update_resource(R::PATH, id, payload).await {
            Ok(envelope) => {
                self.feedback.success(
                    &envelope.message_or(&format!("{} updated successfully", R::LABEL)),
                );
                true
            }
            Err(e) => {
                self.report("update", &e);
                false
            }
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        let _guard = self.in_flight.start();
        match self.api.delete_resource(R::PATH, id).await {
            Ok(envelope) => {
                self.feedback.success(
                    &envelope.message_or(&format!("{} deleted successfully", R::LABEL)),
                );
                true
            }
            Err(e) => {
                self.report("delete", &e);
                false
            }
        }
    }

    pub async fn get(&self, id: &str) -> Option<Value> {
        let _guard = self.in_flight.start();
        match self.api.get_resource(R::PATH, id).await {
            Ok(entity) => Some(entity),
            Err(e) => {
                self.report("lookup", &e);
                None
            }
        }
    }

    /// Create when `id` is `None`, update otherwise.
    pub async fn mutate(&self, id: Option<&str>, payload: Value) -> bool {
        match id {
            Some(id) => self.update(id, payload).await,
            None => self.create(payload).await,
        }
    }
}

impl ResourceActions<Orders> {
    pub async fn orders_by_contact(&self, email: &str) -> Option<Vec<Value>> {
        if !is_valid_email(email) {
            self.feedback.error("Please enter a valid email address");
            return None;
        }
        let _guard = self.in_flight.start();
        match self.api.orders_by_contact(email).await {
            Ok(orders) => Some(orders),
            Err(e) => {
                self.report("contact lookup", &e);
                None
            }
        }
    }
}

pub const CONFIGS_UPDATED_MESSAGE: &str = "App configurations updated successfully";
pub const NO_CHANGES_MESSAGE: &str = "No changes to save";

/// App configuration actions; the fetched configs live in the [`AppContext`].
#[derive(Clone)]
pub struct AppConfigActions {
    api: ApiClient,
    ctx: Arc<AppContext>,
    in_flight: InFlight,
}

impl AppConfigActions {
    pub fn new(api: ApiClient, ctx: Arc<AppContext>) -> Self {
        Self {
            api,
            ctx,
            in_flight: InFlight::default(),
        }
    }

    pub fn loading(&self) -> bool {
        self.in_flight.active()
    }

    pub fn get(&self) -> Option<AppConfigs> {
        self.ctx.app_configs()
    }

    /// Fetch configs only when none are cached. Fetch failures are logged, not reported.
    pub async fn load_if_missing(&self) -> Option<AppConfigs> {
        if let Some(configs) = self.ctx.app_configs() {
            return Some(configs);
        }
        let _guard = self.in_flight.start();
        match self.api.get_app_configs().await {
            Ok(configs) => {
                self.ctx.set_app_configs(configs.clone());
                Some(configs)
            }
            Err(e) => {
                log::warn!("Failed to load app configs: {}", e);
                None
            }
        }
    }

    /// Always fetch, reporting failures.
    pub async fn refresh(&self) -> Option<AppConfigs> {
        let _guard = self.in_flight.start();
        match self.api.get_app_configs().await {
            Ok(configs) => {
                self.ctx.set_app_configs(configs.clone());
                Some(configs)
            }
            Err(e) => {
                self.ctx.error(&e.user_message());
                None
            }
        }
    }

    pub async fn update(&self, configs: AppConfigs) -> bool {
        let payload = match serde_json::to_value(&configs) {
            Ok(payload) => payload,
            Err(e) => {
                self.ctx.error(&e.to_string());
                return false;
            }
        };
        if let Err(e) = forms::APP_CONFIG.validate(&payload, ValidationMode::Full) {
            self.ctx.error(&e.to_string());
            return false;
        }
        if self.ctx.app_configs().as_ref() == Some(&configs) {
            self.ctx.error(NO_CHANGES_MESSAGE);
            return false;
        }

        let _guard = self.in_flight.start();
        match self.api.update_app_configs(&configs).await {
            Ok(_) => {
                self.ctx.set_app_configs(configs);
                self.ctx.success(CONFIGS_UPDATED_MESSAGE);
                true
            }
            Err(e) => {
                log::warn!("App config update failed: {}", e);
                self.ctx.error(&e.user_message());
                false
            }
        }
    }
}

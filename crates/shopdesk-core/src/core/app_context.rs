//! Application context
//!
//! Explicit shared store for layout flags, theme, notifications, cached app
//! configs and the pending redirect. Passed around by `Arc`; every operation
//! is a short synchronous critical section.

use crate::api::client::Navigator;
use crate::api::models::AppConfigs;
use crate::core::feedback::Feedback;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DESKTOP_MIN_WIDTH: u32 = 1024;
pub const TABLET_MIN_WIDTH: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Default)]
struct AppState {
    viewport_width: u32,
    sidebar_collapsed: bool,
    sidebar_open: bool,
    theme: Theme,
    notifications: Vec<Notification>,
    app_configs: Option<AppConfigs>,
    pending_redirect: Option<String>,
}

#[derive(Debug)]
pub struct AppContext {
    state: Mutex<AppState>,
    next_notification_id: AtomicU64,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AppState {
                viewport_width: DESKTOP_MIN_WIDTH,
                ..AppState::default()
            }),
            next_notification_id: AtomicU64::new(1),
        }
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mount: apply the responsive rule once for the initial viewport.
    pub fn init(&self, viewport_width: u32) {
        self.handle_resize(viewport_width);
    }

    /// Unmount: drop notifications, cached configs and any pending redirect.
    pub fn teardown(&self) {
        let mut state = self.state();
        state.notifications.clear();
        state.app_configs = None;
        state.pending_redirect = None;
    }

    pub fn handle_resize(&self, width: u32) {
        let mut state = self.state();
        state.viewport_width = width;
        if width < DESKTOP_MIN_WIDTH {
            state.sidebar_collapsed = false;
            state.sidebar_open = false;
        }
    }

    pub fn viewport_width(&self) -> u32 {
        self.state().viewport_width
    }

    pub fn is_mobile(&self) -> bool {
        self.viewport_width() < DESKTOP_MIN_WIDTH
    }

    pub fn is_tablet(&self) -> bool {
        (TABLET_MIN_WIDTH..DESKTOP_MIN_WIDTH).contains(&self.viewport_width())
    }

    pub fn is_desktop(&self) -> bool {
        self.viewport_width() >= DESKTOP_MIN_WIDTH
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.state().sidebar_collapsed
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.state().sidebar_collapsed = collapsed;
    }

    pub fn toggle_sidebar(&self) {
        let mut state = self.state();
        state.sidebar_collapsed = !state.sidebar_collapsed;
    }

    pub fn sidebar_open(&self) -> bool {
        self.state().sidebar_open
    }

    pub fn set_sidebar_open(&self, open: bool) {
        self.state().sidebar_open = open;
    }

    pub fn toggle_mobile_sidebar(&self) {
        let mut state = self.state();
        state.sidebar_open = !state.sidebar_open;
    }

    pub fn theme(&self) -> Theme {
        self.state().theme
    }

    pub fn set_theme(&self, theme: Theme) {
        self.state().theme = theme;
    }

    pub fn toggle_theme(&self) -> Theme {
        let mut state = self.state();
        state.theme = match state.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        state.theme
    }

    /// Prepend an unread notification and return its id.
    pub fn add_notification(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        let id = self.next_notification_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
        };
        self.state().notifications.insert(0, notification);
        id
    }

    /// Returns `false` when no notification has this id.
    pub fn mark_notification_read(&self, id: u64) -> bool {
        match self.state().notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_notifications_read(&self) {
        for notification in self.state().notifications.iter_mut() {
            notification.read = true;
        }
    }

    pub fn clear_notifications(&self) {
        self.state().notifications.clear();
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.state().notifications.iter().filter(|n| !n.read).count()
    }

    /// Remove and return all notifications, oldest first.
    pub fn drain_notifications(&self) -> Vec<Notification> {
        let mut drained = std::mem::take(&mut self.state().notifications);
        drained.reverse();
        drained
    }

    pub fn app_configs(&self) -> Option<AppConfigs> {
        self.state().app_configs.clone()
    }

    pub fn set_app_configs(&self, configs: AppConfigs) {
        self.state().app_configs = Some(configs);
    }

    pub fn pending_redirect(&self) -> Option<String> {
        self.state().pending_redirect.clone()
    }

    pub fn take_redirect(&self) -> Option<String> {
        self.state().pending_redirect.take()
    }
}

impl Feedback for AppContext {
    fn error(&self, message: &str) {
        log::error!("{}", message);
        self.add_notification(NotificationKind::Error, "Error", message);
    }

    fn success(&self, message: &str) {
        log::info!("{}", message);
        self.add_notification(NotificationKind::Success, "Success", message);
    }
}

impl Navigator for AppContext {
    fn navigate(&self, path: &str) {
        log::info!("Navigating to {}", path);
        self.state().pending_redirect = Some(path.to_string());
    }
}

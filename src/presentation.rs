//! Presentation-side state: theme, dock auto-hide and the one-time warning.

use crate::error::SessionError;
use crate::session::{notice_acknowledged, record_acknowledgement, SessionState, SessionStore, THEME_KEY};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DOCK_HIDE_DELTA: f64 = 12.0;
pub const DOCK_SHOW_DELTA: f64 = -4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

pub fn saved_theme(store: &dyn SessionStore) -> Result<Option<Theme>, SessionError> {
    Ok(store.get(THEME_KEY)?.as_deref().and_then(Theme::parse))
}

pub fn initial_theme(store: &dyn SessionStore, system: Theme) -> Result<Theme, SessionError> {
    Ok(saved_theme(store)?.unwrap_or(system))
}

pub fn toggle_theme(state: &mut SessionState, store: &dyn SessionStore) -> Result<Theme, SessionError> {
    let next = state.theme.toggled();
    store.set(THEME_KEY, next.as_str())?;
    state.theme = next;
    Ok(next)
}

/// System preference changes only apply while the user has not chosen.
pub fn follow_system_theme(
    state: &mut SessionState,
    store: &dyn SessionStore,
    system: Theme,
) -> Result<Theme, SessionError> {
    if saved_theme(store)?.is_none() {
        state.theme = system;
    }
    Ok(state.theme)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockTracker {
    last_y: f64,
    hidden: bool,
}

impl DockTracker {
    pub fn new(scroll_y: f64) -> Self {
        Self {
            last_y: scroll_y,
            hidden: false,
        }
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn on_scroll(&mut self, scroll_y: f64) -> bool {
        let delta = scroll_y - self.last_y;
        if delta > DOCK_HIDE_DELTA {
            self.hidden = true;
        } else if delta < DOCK_SHOW_DELTA {
            self.hidden = false;
        }
        self.last_y = scroll_y;
        self.hidden
    }
}

/// Asks the user to accept the warning shown before the identity redirect.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn confirm(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Acknowledger for FixedAnswer {
    async fn confirm(&self) -> bool {
        self.0
    }
}

/// Runs the warning once per store. Acceptance is remembered; a decline is
/// not.
pub async fn acknowledge_once(store: &dyn SessionStore, acknowledger: &dyn Acknowledger) -> Result<bool, SessionError> {
    if notice_acknowledged(store)? {
        return Ok(true);
    }
    if acknowledger.confirm().await {
        record_acknowledgement(store)?;
        return Ok(true);
    }
    info!(target: "form", "user declined the warning");
    Ok(false)
}

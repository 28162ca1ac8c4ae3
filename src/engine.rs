use crate::adapters::base::require_message;
use crate::adapters::{build_channel, DeliveryChannel, ProofGate};
use crate::config::{OAuthConfig, RelayConfig};
use crate::error::ValidationError;
pub use crate::error::SESSION_EXPIRED;
use crate::models::{Notice, PendingSubmission, Proof, SubmissionPayload, SubmissionStatus};
use crate::oauth::{authorize_url, callback_code};
use crate::presentation::{
    acknowledge_once, follow_system_theme, initial_theme, toggle_theme, Acknowledger, Theme,
};
use crate::session::{clear_pending, load_pending, store_pending, SessionState, SessionStore};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub message: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Ignored,
    Invalid(Notice),
    Declined,
    /// Payload stored; send the user to the identity provider.
    Redirect { authorize_url: String },
    NoCallback,
    SessionExpired(Notice),
    Delivered { notice: Notice, compose_uri: Option<String> },
    Failed { notice: Notice },
}

pub struct ContactRelay {
    channel: Arc<dyn DeliveryChannel>,
    store: Arc<dyn SessionStore>,
    acknowledger: Arc<dyn Acknowledger>,
    oauth: OAuthConfig,
    state: Arc<Mutex<SessionState>>,
}

impl ContactRelay {
    pub fn new(
        channel: Arc<dyn DeliveryChannel>,
        store: Arc<dyn SessionStore>,
        acknowledger: Arc<dyn Acknowledger>,
        oauth: OAuthConfig,
        system_theme: Theme,
    ) -> Result<Self> {
        let theme = initial_theme(store.as_ref(), system_theme)?;
        info!(target: "form", channel = ?channel.kind(), "contact relay loaded");
        Ok(Self {
            channel,
            store,
            acknowledger,
            oauth,
            state: Arc::new(Mutex::new(SessionState::new(theme, 0.0))),
        })
    }

    pub fn from_config(
        config: &RelayConfig,
        store: Arc<dyn SessionStore>,
        acknowledger: Arc<dyn Acknowledger>,
        system_theme: Theme,
    ) -> Result<Self> {
        let http = config.http.build_client()?;
        let channel = build_channel(config.channel()?, http)?;
        Self::new(channel, store, acknowledger, config.oauth.clone(), system_theme)
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn toggle_theme(&self) -> Result<Theme> {
        let mut state = self.state.lock().await;
        Ok(toggle_theme(&mut state, self.store.as_ref())?)
    }

    pub async fn system_theme_changed(&self, system: Theme) -> Result<Theme> {
        let mut state = self.state.lock().await;
        Ok(follow_system_theme(&mut state, self.store.as_ref(), system)?)
    }

    pub async fn scroll(&self, scroll_y: f64) -> bool {
        self.state.lock().await.dock.on_scroll(scroll_y)
    }

    pub async fn dock_hidden(&self) -> bool {
        self.state.lock().await.dock.hidden()
    }

    pub async fn submit(&self, form: ContactForm) -> Result<FlowOutcome> {
        let payload = SubmissionPayload::from_form(&form.name, &form.message);
        {
            let mut state = self.state.lock().await;
            if !state.submit_enabled {
                debug!(target: "form", "submit ignored, attempt in flight");
                return Ok(FlowOutcome::Ignored);
            }
            if let Err(reason) = require_message(&payload) {
                return Ok(invalid(&mut state, reason));
            }
            let token = form.token.as_deref().map(str::trim).unwrap_or("");
            if self.channel.gate() == ProofGate::Captcha && token.is_empty() {
                return Ok(invalid(&mut state, ValidationError::MissingProofToken));
            }
            state.submit_enabled = false;
        }

        match self.channel.gate() {
            ProofGate::Identity => self.start_identity_round_trip(payload).await,
            ProofGate::Captcha => {
                let token = form.token.unwrap_or_default().trim().to_string();
                self.deliver_direct(payload, Proof::CaptchaToken(token)).await
            }
            ProofGate::Open => self.deliver_direct(payload, Proof::None).await,
        }
    }

    /// Consumes the identity provider's redirect back to the site.
    pub async fn handle_callback(&self, return_url: &str) -> Result<FlowOutcome> {
        let Some(code) = callback_code(return_url) else {
            return Ok(FlowOutcome::NoCallback);
        };
        info!(target: "callback", "authorization code received");

        let pending = {
            let mut state = self.state.lock().await;
            if !state.submit_enabled {
                return Ok(FlowOutcome::Ignored);
            }
            let Some(pending) = load_pending(self.store.as_ref())? else {
                let notice = Notice::error(SESSION_EXPIRED);
                transition(&mut state, SubmissionStatus::IDLE);
                state.last_notice = Some(notice.clone());
                return Ok(FlowOutcome::SessionExpired(notice));
            };
            clear_pending(self.store.as_ref())?;
            state.submit_enabled = false;
            transition(&mut state, SubmissionStatus::DELIVERING);
            pending
        };

        debug!(target: "callback", id = %pending.id, fingerprint = %pending.payload.fingerprint(), "delivering pending payload");
        let result = self
            .channel
            .deliver(&pending.payload, &Proof::AuthorizationCode(code))
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(delivery) => {
                info!(target: "callback", id = %pending.id, "delivered");
                Ok(delivered(&mut state, self.channel.success_notice(), delivery.compose_uri))
            }
            Err(err) => {
                error!(target: "callback", id = %pending.id, "delivery failed: {err}");
                if let Err(restore) = store_pending(self.store.as_ref(), &pending) {
                    error!(target: "callback", id = %pending.id, "pending payload lost: {restore}");
                }
                Ok(failed(&mut state, err.notice()))
            }
        }
    }

    async fn start_identity_round_trip(&self, payload: SubmissionPayload) -> Result<FlowOutcome> {
        let accepted = acknowledge_once(self.store.as_ref(), self.acknowledger.as_ref()).await;
        let mut state = self.state.lock().await;
        state.submit_enabled = true;
        if !accepted? {
            transition(&mut state, SubmissionStatus::IDLE);
            return Ok(FlowOutcome::Declined);
        }

        let authorize_url = authorize_url(&self.oauth)?;
        let pending = PendingSubmission::new(payload);
        store_pending(self.store.as_ref(), &pending)?;
        info!(target: "form", id = %pending.id, "payload stored, redirecting to identity provider");
        transition(&mut state, SubmissionStatus::AWAITING_EXTERNAL_PROOF);
        Ok(FlowOutcome::Redirect { authorize_url })
    }

    async fn deliver_direct(&self, payload: SubmissionPayload, proof: Proof) -> Result<FlowOutcome> {
        let pending = PendingSubmission::new(payload);
        {
            let mut state = self.state.lock().await;
            if let Err(err) = store_pending(self.store.as_ref(), &pending) {
                state.submit_enabled = true;
                return Err(err.into());
            }
            transition(&mut state, SubmissionStatus::DELIVERING);
        }

        debug!(target: "form", id = %pending.id, fingerprint = %pending.payload.fingerprint(), "delivering");
        let result = self.channel.deliver(&pending.payload, &proof).await;

        let mut state = self.state.lock().await;
        let cleared = clear_pending(self.store.as_ref());
        let outcome = match result {
            Ok(delivery) => {
                info!(target: "form", id = %pending.id, "delivered");
                delivered(&mut state, self.channel.success_notice(), delivery.compose_uri)
            }
            Err(err) => {
                error!(target: "form", id = %pending.id, "delivery failed: {err}");
                failed(&mut state, err.notice())
            }
        };
        cleared?;
        Ok(outcome)
    }
}

fn transition(state: &mut SessionState, next: SubmissionStatus) {
    debug!(target: "form", from = ?state.status, to = ?next, "status change");
    state.status = next;
}

fn invalid(state: &mut SessionState, reason: ValidationError) -> FlowOutcome {
    let notice = Notice::error(reason.corrective_text());
    state.last_notice = Some(notice.clone());
    FlowOutcome::Invalid(notice)
}

fn delivered(state: &mut SessionState, text: &str, compose_uri: Option<String>) -> FlowOutcome {
    let notice = Notice::success(text);
    transition(state, SubmissionStatus::DELIVERED);
    state.submit_enabled = false;
    state.last_notice = Some(notice.clone());
    FlowOutcome::Delivered { notice, compose_uri }
}

fn failed(state: &mut SessionState, notice: Notice) -> FlowOutcome {
    transition(state, SubmissionStatus::FAILED);
    transition(state, SubmissionStatus::IDLE);
    state.submit_enabled = true;
    state.last_notice = Some(notice.clone());
    FlowOutcome::Failed { notice }
}

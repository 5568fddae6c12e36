use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use leaddesk::domain::entities::{ConversationTurn, NluInput, NluOutcome, ReplyButton};
use leaddesk::domain::ports::messaging_gateway::{GatewayError, MessagingGateway};
use leaddesk::domain::ports::nlu_oracle::{NluError, NluOracle};
use leaddesk::domain::ports::time_service::{Clock, TimeService};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentKind {
    Text,
    Buttons(Vec<String>),
    Location,
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel_id: String,
    pub text: String,
    pub kind: SentKind,
}

/// Gateway that records every outbound message instead of sending it.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<bool>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, channel_id: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.channel_id == channel_id)
            .collect()
    }

    pub fn texts_to(&self, channel_id: &str) -> Vec<String> {
        self.sent_to(channel_id).into_iter().map(|m| m.text).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, channel_id: &str, text: &str, kind: SentKind) -> Result<(), GatewayError> {
        if *self.failing.lock().unwrap() {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
            kind,
        });
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), GatewayError> {
        self.record(channel_id, text, SentKind::Text)
    }

    async fn send_buttons(
        &self,
        channel_id: &str,
        text: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError> {
        let ids = buttons.iter().map(|b| b.id.clone()).collect();
        self.record(channel_id, text, SentKind::Buttons(ids))
    }

    async fn send_location_link(
        &self,
        channel_id: &str,
        address: &str,
        _prefix: &str,
    ) -> Result<(), GatewayError> {
        self.record(channel_id, address, SentKind::Location)
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Oracle that replays scripted outcomes in order; an empty script means
/// the oracle is down.
#[derive(Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<NluOutcome, NluError>>>,
    calls: Mutex<Vec<(usize, NluInput)>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: NluOutcome) {
        self.script.lock().unwrap().push_back(Ok(outcome));
    }

    pub fn push_failure(&self) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(NluError::Unavailable("timeout".to_string())));
    }

    /// History length seen by each call.
    pub fn history_lengths(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(n, _)| *n).collect()
    }
}

#[async_trait]
impl NluOracle for ScriptedOracle {
    async fn analyze(
        &self,
        history: &[ConversationTurn],
        input: &NluInput,
    ) -> Result<NluOutcome, NluError> {
        self.calls.lock().unwrap().push((history.len(), input.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NluError::Unavailable("no scripted outcome".to_string())))
    }
}

/// Clock the test moves by hand.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Retry backoff without the wait.
pub struct InstantTimeService;

#[async_trait]
impl TimeService for InstantTimeService {
    async fn sleep(&self, _duration: std::time::Duration) {}
}

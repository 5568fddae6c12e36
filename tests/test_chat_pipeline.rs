mod helpers;

use helpers::*;
use leaddesk::application::services::chat_service::CLARIFYING_REPLY;
use leaddesk::application::services::ConversationCache;
use leaddesk::domain::entities::{
    ConversationTurn, ExtractedFields, InboundMessage, LeadStatus, MessageRole, NluOutcome,
};
use leaddesk::domain::ports::lead_repository::LeadRepository;
use chrono::Duration;

fn outcome(reply: &str, city: Option<&str>, issue: Option<&str>) -> NluOutcome {
    NluOutcome {
        reply_text: reply.to_string(),
        transcription: None,
        extracted: ExtractedFields {
            city: city.map(str::to_string),
            issue: issue.map(str::to_string),
            ..Default::default()
        },
        is_deal: false,
    }
}

async fn open_lead_status(app: &TestApp) -> Option<LeadStatus> {
    app.lead_repo
        .latest_lead_for_chat(
            CUSTOMER_CHAT,
            &[LeadStatus::Contacted, LeadStatus::New, LeadStatus::Booked],
        )
        .await
        .unwrap()
        .map(|lead| lead.status)
}

#[tokio::test]
async fn test_oracle_failure_gets_clarifying_reply() {
    let app = TestApp::new().await;
    app.oracle.push_failure();

    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "hello?"))
        .await;

    assert_eq!(app.gateway.texts_to(CUSTOMER_CHAT), vec![CLARIFYING_REPLY.to_string()]);
    let history = app.cache.history(CUSTOMER_CHAT).await.unwrap();
    assert_eq!(history.first(), Some(&ConversationTurn::user("hello?")));
    assert_eq!(open_lead_status(&app).await, None);
}

#[tokio::test]
async fn test_lead_opens_then_deal_marker_confirms_it() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Yossi", "972500000501", "Tel Aviv").await;

    app.oracle.push(outcome("Which city are you in?", None, None));
    app.oracle.push(outcome(
        "Got it, a broken pipe in Tel Aviv. When is good for you?",
        Some("Tel Aviv"),
        Some("Broken Pipe"),
    ));
    app.oracle.push(outcome(
        "Booked! [DEAL: Tomorrow 10:00 AM | Rothschild Blvd 10, Tel Aviv | Broken Pipe]",
        None,
        None,
    ));

    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "my pipe burst"))
        .await;
    assert_eq!(open_lead_status(&app).await, None);

    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "Tel Aviv"))
        .await;
    assert_eq!(open_lead_status(&app).await, Some(LeadStatus::Contacted));

    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "tomorrow at 10, Rothschild 10"))
        .await;
    assert_eq!(open_lead_status(&app).await, Some(LeadStatus::New));

    let replies = app.gateway.texts_to(CUSTOMER_CHAT);
    assert_eq!(replies.last().map(String::as_str), Some("Booked!"));
    assert!(replies.iter().all(|r| !r.contains("[DEAL")));

    let lead = app
        .lead_repo
        .latest_lead_for_chat(CUSTOMER_CHAT, &[LeadStatus::New])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lead.pro_id.as_deref(), Some(pro.id.as_str()));
    assert_eq!(lead.full_address.as_deref(), Some("Rothschild Blvd 10, Tel Aviv"));
    assert_eq!(lead.appointment_time.as_deref(), Some("Tomorrow 10:00 AM"));
    assert!(!app.gateway.sent_to(&pro.phone).is_empty());

    // History grows by a user and an assistant turn per exchange
    assert_eq!(app.oracle.history_lengths(), vec![0, 2, 4]);
}

#[tokio::test]
async fn test_structured_deal_flag_confirms_without_marker() {
    let app = TestApp::new().await;
    app.add_professional("Dana", "972500000502", "Haifa").await;

    app.oracle
        .push(outcome("Noted, Haifa boiler.", Some("Haifa"), Some("Boiler")));
    let mut deal = outcome("Perfect, a technician will contact you.", None, None);
    deal.is_deal = true;
    deal.extracted.full_address = Some("Herzl 1, Haifa".to_string());
    deal.extracted.appointment_time = Some("Today 18:00".to_string());
    app.oracle.push(deal);

    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "boiler broken in Haifa"))
        .await;
    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "Herzl 1, at 18:00"))
        .await;

    let lead = app
        .lead_repo
        .latest_lead_for_chat(CUSTOMER_CHAT, &[LeadStatus::New])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lead.full_address.as_deref(), Some("Herzl 1, Haifa"));
    assert_eq!(lead.appointment_time.as_deref(), Some("Today 18:00"));
}

#[tokio::test]
async fn test_cancel_without_open_request() {
    let app = TestApp::new().await;

    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, " Cancel "))
        .await;

    assert_eq!(
        app.gateway.texts_to(CUSTOMER_CHAT),
        vec!["You have no open request to cancel.".to_string()]
    );
    assert!(app.oracle.history_lengths().is_empty());
}

#[tokio::test]
async fn test_history_survives_cache_rebuild() {
    let app = TestApp::new().await;
    app.cache
        .record_turn(CUSTOMER_CHAT, MessageRole::User, "leaking tap")
        .await
        .unwrap();
    app.cache
        .record_turn(CUSTOMER_CHAT, MessageRole::Assistant, "Which city?")
        .await
        .unwrap();
    let cached = app.cache.history(CUSTOMER_CHAT).await.unwrap();

    let fresh = ConversationCache::new(
        app.message_repo.clone(),
        app.clock.clone(),
        Duration::minutes(30),
        20,
    );
    let rebuilt = fresh.history(CUSTOMER_CHAT).await.unwrap();

    assert_eq!(cached, rebuilt);
    assert_eq!(
        rebuilt,
        vec![
            ConversationTurn::user("leaking tap"),
            ConversationTurn::assistant("Which city?")
        ]
    );
}

#[tokio::test]
async fn test_expired_entries_are_purged() {
    let app = TestApp::new().await;
    app.cache.history(CUSTOMER_CHAT).await.unwrap();
    assert_eq!(app.cache.len().await, 1);

    app.clock.advance(Duration::minutes(31));
    assert_eq!(app.cache.purge_expired().await, 1);
    assert_eq!(app.cache.len().await, 0);
}

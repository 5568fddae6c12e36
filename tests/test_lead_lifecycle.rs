mod helpers;

use chrono::{Duration, TimeZone, Utc};
use helpers::*;
use leaddesk::application::services::chat_service::NOTHING_PENDING_REPLY;
use leaddesk::application::services::CommandOutcome;
use leaddesk::domain::entities::{DealDetails, InboundMessage, LeadStatus};
use leaddesk::domain::ports::time_service::Clock;

fn rothschild_deal() -> DealDetails {
    DealDetails {
        appointment_time: "Tomorrow 10:00 AM".to_string(),
        full_address: "Rothschild Blvd 10, Tel Aviv".to_string(),
        issue_type: "Broken Pipe".to_string(),
    }
}

fn applied(outcome: CommandOutcome) -> leaddesk::domain::entities::Lead {
    match outcome {
        CommandOutcome::Applied(lead) => lead,
        CommandOutcome::NothingPending => panic!("expected the command to apply"),
    }
}

#[tokio::test]
async fn test_booking_to_rating_end_to_end() {
    let app = TestApp::at(Utc.with_ymd_and_hms(2026, 3, 10, 9, 15, 0).unwrap()).await;
    let pro = app.add_professional("Yossi", "972500000100", "Tel Aviv").await;
    let slot = app
        .add_slot(&pro.id, Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap())
        .await;

    let lead = app
        .lifecycle
        .open_lead(CUSTOMER_CHAT, "Tel Aviv", "Broken Pipe")
        .await
        .unwrap();
    assert_eq!(lead.status, LeadStatus::Contacted);
    assert_eq!(lead.pro_id.as_deref(), Some(pro.id.as_str()));

    let lead = app.lifecycle.confirm_deal(&lead, &rothschild_deal()).await.unwrap();
    assert_eq!(lead.status, LeadStatus::New);
    assert_eq!(lead.full_address.as_deref(), Some("Rothschild Blvd 10, Tel Aviv"));
    assert_eq!(lead.appointment_time.as_deref(), Some("Tomorrow 10:00 AM"));

    let offer = app.gateway.sent_to(&pro.phone);
    assert!(offer.iter().any(|m| matches!(
        &m.kind,
        SentKind::Buttons(ids)
            if ids == &vec![format!("approve_job:{}", lead.id), format!("reject_job:{}", lead.id)]
    )));
    assert!(offer.iter().any(|m| m.kind == SentKind::Location));

    // Professional approves by text
    app.chat
        .handle_inbound(InboundMessage::text(&pro.phone, "approve"))
        .await;
    let booked = app.lead(&lead.id).await;
    assert_eq!(booked.status, LeadStatus::Booked);
    let slots = app.slots.list_slots(&pro.id).await.unwrap();
    assert!(slots.iter().any(|s| s.id == slot.id && s.is_taken));
    assert!(app
        .gateway
        .texts_to(CUSTOMER_CHAT)
        .iter()
        .any(|t| t.contains("booked")));

    let finish_button = format!("finish_job:{}", lead.id);
    assert!(app.gateway.sent_to(&pro.phone).iter().any(|m| matches!(
        &m.kind,
        SentKind::Buttons(ids) if ids == &vec![finish_button.clone()]
    )));

    // Professional finishes from the job card
    app.chat
        .handle_inbound(InboundMessage::button(&pro.phone, &finish_button))
        .await;
    let completed = app.lead(&lead.id).await;
    assert_eq!(completed.status, LeadStatus::Completed);
    assert!(completed.waiting_for_rating);
    assert!(completed.completed_at.is_some());

    // Customer rates
    app.chat.handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "5")).await;
    let rated = app.lead(&lead.id).await;
    assert!(!rated.waiting_for_rating);
    assert_eq!(rated.rating_given, Some(5));
    let pro_after = app.professional(&pro.id).await;
    assert_eq!(pro_after.review_count, 1);
    assert!((pro_after.rating - 5.0).abs() < f64::EPSILON);

    // The next text lands in the review window
    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "Fast and clean work"))
        .await;
    let reviewed = app.lead(&lead.id).await;
    assert_eq!(reviewed.review_comment.as_deref(), Some("Fast and clean work"));
    assert!(reviewed.check_invariants().is_ok());
}

#[tokio::test]
async fn test_approval_books_without_free_slot() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Dana", "972500000101", "Haifa").await;
    let lead = app
        .add_lead(CUSTOMER_CHAT, LeadStatus::New, Some(&pro.id), Duration::minutes(5))
        .await;
    // Outside the two-hour window
    app.add_slot(&pro.id, app.clock.now() + Duration::hours(6)).await;

    let booked = applied(app.lifecycle.approve(&pro, None).await.unwrap());
    assert_eq!(booked.id, lead.id);
    assert_eq!(booked.status, LeadStatus::Booked);
    assert!(app
        .slots
        .list_slots(&pro.id)
        .await
        .unwrap()
        .iter()
        .all(|s| !s.is_taken));
    assert!(app
        .gateway
        .texts_to(CUSTOMER_CHAT)
        .iter()
        .any(|t| t.contains("confirm the exact time")));
}

#[tokio::test]
async fn test_rejection_is_terminal() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Avi", "972500000102", "Haifa").await;
    let lead = app
        .add_lead(CUSTOMER_CHAT, LeadStatus::New, Some(&pro.id), Duration::minutes(5))
        .await;

    let rejected = applied(app.lifecycle.reject(&pro, None).await.unwrap());
    assert_eq!(rejected.status, LeadStatus::Rejected);

    // Nothing left to act on
    assert!(matches!(
        app.lifecycle.approve(&pro, None).await.unwrap(),
        CommandOutcome::NothingPending
    ));
    assert!(app.lifecycle.cancel_by_customer(CUSTOMER_CHAT).await.unwrap().is_none());
    assert_eq!(app.lead(&lead.id).await.status, LeadStatus::Rejected);
}

#[tokio::test]
async fn test_professional_command_with_nothing_pending() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Moshe", "972500000103", "Holon").await;

    app.chat
        .handle_inbound(InboundMessage::text(&pro.phone, "finish"))
        .await;

    assert_eq!(app.gateway.texts_to(&pro.phone), vec![NOTHING_PENDING_REPLY.to_string()]);
}

#[tokio::test]
async fn test_rating_blends_with_existing_score() {
    let app = TestApp::new().await;
    let pro = app
        .add_professional_with("Rina", "972500000104", vec!["Holon".into()], None, 4.2)
        .await;
    let lead = app
        .add_lead(CUSTOMER_CHAT, LeadStatus::Booked, Some(&pro.id), Duration::hours(1))
        .await;
    applied(app.lifecycle.finish_by_professional(&pro, None).await.unwrap());

    let rating = app
        .lifecycle
        .apply_rating(CUSTOMER_CHAT, 5)
        .await
        .unwrap()
        .expect("rating should apply");
    assert_eq!(rating.lead_id, lead.id);
    assert!((rating.new_rating - 4.3).abs() < 1e-9);

    let stored = app.professional(&pro.id).await;
    assert!((stored.rating - 4.3).abs() < 1e-9);
    assert_eq!(stored.review_count, 1);

    // The window is consumed; a second digit is not a rating
    assert!(app.lifecycle.apply_rating(CUSTOMER_CHAT, 1).await.unwrap().is_none());
    assert_eq!(app.professional(&pro.id).await.review_count, 1);
}

#[tokio::test]
async fn test_customer_cancel_notifies_professional() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Eli", "972500000105", "Holon").await;
    let lead = app
        .add_lead(CUSTOMER_CHAT, LeadStatus::Booked, Some(&pro.id), Duration::hours(2))
        .await;

    app.chat
        .handle_inbound(InboundMessage::text(CUSTOMER_CHAT, "Cancel"))
        .await;

    assert_eq!(app.lead(&lead.id).await.status, LeadStatus::Cancelled);
    assert!(app
        .gateway
        .texts_to(&pro.phone)
        .iter()
        .any(|t| t.contains("cancelled")));
    assert!(app
        .gateway
        .texts_to(CUSTOMER_CHAT)
        .iter()
        .any(|t| t.contains("cancelled")));
}

#[tokio::test]
async fn test_customer_completion_buttons() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Gal", "972500000106", "Holon").await;
    let lead = app
        .add_lead(CUSTOMER_CHAT, LeadStatus::Booked, Some(&pro.id), Duration::hours(8))
        .await;

    app.chat
        .handle_inbound(InboundMessage::button(CUSTOMER_CHAT, format!("not_done:{}", lead.id)))
        .await;
    assert_eq!(app.lead(&lead.id).await.status, LeadStatus::Booked);
    assert!(app
        .gateway
        .texts_to(&pro.phone)
        .iter()
        .any(|t| t.contains("not finished")));

    app.chat
        .handle_inbound(InboundMessage::button(CUSTOMER_CHAT, format!("confirm_done:{}", lead.id)))
        .await;
    let done = app.lead(&lead.id).await;
    assert_eq!(done.status, LeadStatus::Completed);
    assert!(done.waiting_for_rating);

    // A stale button press on a closed job changes nothing
    let err = app
        .lifecycle
        .confirm_done_by_customer(CUSTOMER_CHAT, &lead.id)
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_completion_button_from_other_chat_is_ignored() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Tal", "972500000107", "Holon").await;
    let lead = app
        .add_lead(CUSTOMER_CHAT, LeadStatus::Booked, Some(&pro.id), Duration::hours(8))
        .await;

    let result = app
        .lifecycle
        .confirm_done_by_customer("972500000555", &lead.id)
        .await;
    assert!(result.is_err());
    assert_eq!(app.lead(&lead.id).await.status, LeadStatus::Booked);
}

#[tokio::test]
async fn test_job_card_buttons_act_on_their_own_lead() {
    let app = TestApp::new().await;
    let pro = app.add_professional("Eli", "972500000108", "Tel Aviv").await;
    let older = app
        .add_lead("972500000201", LeadStatus::New, Some(&pro.id), Duration::minutes(20))
        .await;
    let newer = app
        .add_lead("972500000202", LeadStatus::New, Some(&pro.id), Duration::minutes(5))
        .await;

    app.chat
        .handle_inbound(InboundMessage::button(&pro.phone, format!("approve_job:{}", older.id)))
        .await;
    assert_eq!(app.lead(&older.id).await.status, LeadStatus::Booked);
    assert_eq!(app.lead(&newer.id).await.status, LeadStatus::New);

    app.chat
        .handle_inbound(InboundMessage::button(&pro.phone, format!("reject_job:{}", newer.id)))
        .await;
    assert_eq!(app.lead(&newer.id).await.status, LeadStatus::Rejected);
    assert_eq!(app.lead(&older.id).await.status, LeadStatus::Booked);
}

#[tokio::test]
async fn test_job_card_of_reassigned_lead_is_nothing_pending() {
    let app = TestApp::new().await;
    let previous = app.add_professional("Gil", "972500000109", "Tel Aviv").await;
    let current = app.add_professional("Noa", "972500000110", "Tel Aviv").await;
    let lead = app
        .add_lead(CUSTOMER_CHAT, LeadStatus::New, Some(&current.id), Duration::minutes(5))
        .await;

    app.chat
        .handle_inbound(InboundMessage::button(
            &previous.phone,
            format!("approve_job:{}", lead.id),
        ))
        .await;

    assert_eq!(
        app.gateway.texts_to(&previous.phone),
        vec![NOTHING_PENDING_REPLY.to_string()]
    );
    assert_eq!(app.lead(&lead.id).await.status, LeadStatus::New);
}

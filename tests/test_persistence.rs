use leaddesk::domain::ports::time_service::Clock;
mod helpers;

use chrono::Duration;
use helpers::*;
use leaddesk::domain::entities::{Lead, LeadStatus};
use leaddesk::shared::utils::format_timestamp;

#[tokio::test]
async fn test_lead_with_null_columns_loads() {
    let app = TestApp::new().await;
    let created = format_timestamp(app.clock.now() - Duration::hours(2));
    let bare = Lead {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id: CUSTOMER_CHAT.to_string(),
        status: LeadStatus::Contacted,
        pro_id: None,
        city: None,
        issue_type: None,
        full_address: None,
        appointment_time: None,
        created_at: created.clone(),
        updated_at: created,
        completed_at: None,
        waiting_for_rating: false,
        rating_given: None,
        review_comment: None,
        flag: None,
        reassigned_from: None,
    };
    app.lead_repo.create_lead(&bare).await.unwrap();

    let loaded = app.lead(&bare.id).await;
    assert_eq!(loaded.status, LeadStatus::Contacted);
    assert!(loaded.pro_id.is_none());
    assert!(loaded.city.is_none());
    assert!(loaded.rating_given.is_none());
    assert!(loaded.flag.is_none());

    let stale = app
        .lead_repo
        .find_leads_created_before(
            &[LeadStatus::Contacted],
            &format_timestamp(app.clock.now()),
        )
        .await
        .unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, bare.id);
    assert!(stale[0].full_address.is_none());

    let listed = app.lead_repo.list_leads(None, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_professional_without_location_loads() {
    let app = TestApp::new().await;
    let pro = app
        .add_professional_with("Nowhere", "972500000601", vec!["Eilat".into()], None, 4.2)
        .await;

    let loaded = app.professional(&pro.id).await;
    assert!(loaded.location.is_none());
    assert_eq!(loaded.rating, 4.2);

    let active = app.professional_repo.list_active_professionals().await.unwrap();
    assert_eq!(active.len(), 1);
    assert!(active[0].location.is_none());
}

#[tokio::test]
async fn test_service_area_lookup_treats_location_literally() {
    let app = TestApp::new().await;
    let eilat = app
        .add_professional_with("Eilat", "972500000611", vec!["Eilat".into()], None, 4.0)
        .await;
    app.add_professional_with(
        "Center",
        "972500000612",
        vec!["Tel Aviv".into(), "Holon".into()],
        None,
        4.0,
    )
    .await;

    for wildcard in ["%", "_", "\\", "e%t"] {
        let found = app
            .professional_repo
            .list_active_by_service_area(wildcard)
            .await
            .unwrap();
        assert!(found.is_empty(), "{:?} matched {:?}", wildcard, found);
    }

    // Never matches across two stored areas
    let across = app
        .professional_repo
        .list_active_by_service_area("aviv\",\"holon")
        .await
        .unwrap();
    assert!(across.is_empty());

    let found = app
        .professional_repo
        .list_active_by_service_area("  eilat ")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, eilat.id);
}

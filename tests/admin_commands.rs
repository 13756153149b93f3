//! Admin command surface: keyword edit flows, moderation, and utilities.

mod common;

use common::*;
use threadrelay::relay::RelayServer;
use threadrelay::storage::Topic;
use threadrelay::telegram::ChatRef;

async fn seeded_server() -> (tempfile::TempDir, RelayServer<MockApi>) {
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(dir.path());
    seed_topics(&config, DEFAULT_TOPICS);
    let server = RelayServer::new(config, MockApi::new()).await.unwrap();
    (dir, server)
}

#[tokio::test]
async fn add_keyword_flow_mutates_and_persists_the_table() {
    let (dir, mut server) = seeded_server().await;

    server
        .handle_update(private_message(ADMIN, "Manage Keywords"))
        .await;
    server.handle_update(private_message(ADMIN, "Add Keyword")).await;
    let prompt = server.api().last_sent().unwrap();
    assert!(prompt.contains("Available: gift, news"));

    server.handle_update(private_message(ADMIN, "gift")).await;
    assert!(server.api().last_sent().unwrap().contains("Enter keyword to add"));

    server.handle_update(private_message(ADMIN, "bonus")).await;
    assert_eq!(
        server.topics().get("gift").unwrap().keywords,
        vec!["promo", "sale", "bonus"]
    );

    // Mutation was saved and survived the confirming reload.
    let on_disk = std::fs::read_to_string(dir.path().join("topics.json")).unwrap();
    let parsed: std::collections::BTreeMap<String, Topic> =
        serde_json::from_str(&on_disk).unwrap();
    assert!(parsed["gift"].keywords.contains(&"bonus".to_string()));

    let texts = server.api().sent_to(ADMIN);
    assert!(texts.iter().any(|t| t.contains("Added keyword \"bonus\" to \"gift\"")));
}

#[tokio::test]
async fn remove_keyword_flow_and_absent_keyword_noop() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "Remove Keyword")).await;
    server.handle_update(private_message(ADMIN, "gift")).await;
    server.handle_update(private_message(ADMIN, "promo")).await;
    assert_eq!(server.topics().get("gift").unwrap().keywords, vec!["sale"]);

    // Removing a keyword that is not there completes without error.
    server.handle_update(private_message(ADMIN, "Remove Keyword")).await;
    server.handle_update(private_message(ADMIN, "gift")).await;
    server.handle_update(private_message(ADMIN, "promo")).await;
    assert_eq!(server.topics().get("gift").unwrap().keywords, vec!["sale"]);
}

#[tokio::test]
async fn unknown_topic_reprompts_and_empty_keyword_is_rejected() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "Add Keyword")).await;
    server.handle_update(private_message(ADMIN, "nope")).await;
    assert_eq!(server.api().last_sent().unwrap(), "Topic not found.");

    // Still in the flow: a valid topic now advances it.
    server.handle_update(private_message(ADMIN, "gift")).await;
    server.handle_update(private_message(ADMIN, "   ")).await;
    assert_eq!(server.api().last_sent().unwrap(), "Invalid keyword.");

    // And a real keyword completes it.
    server.handle_update(private_message(ADMIN, "extra")).await;
    assert!(server
        .topics()
        .get("gift")
        .unwrap()
        .keywords
        .contains(&"extra".to_string()));
}

#[tokio::test]
async fn back_to_menu_cancels_without_mutation() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "Add Keyword")).await;
    server.handle_update(private_message(ADMIN, "gift")).await;
    server.handle_update(private_message(ADMIN, "Back to Menu")).await;

    // The would-be keyword is now just unrecognized chatter.
    server.handle_update(private_message(ADMIN, "bonus")).await;
    assert_eq!(
        server.topics().get("gift").unwrap().keywords,
        vec!["promo", "sale"]
    );
}

#[tokio::test]
async fn reselecting_manage_keywords_discards_pending_flow() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "Add Keyword")).await;
    server.handle_update(private_message(ADMIN, "Manage Keywords")).await;
    server.handle_update(private_message(ADMIN, "gift")).await;
    assert_eq!(
        server.topics().get("gift").unwrap().keywords,
        vec!["promo", "sale"]
    );
}

#[tokio::test]
async fn ban_silences_a_user_and_unban_restores_them() {
    let (_dir, mut server) = seeded_server().await;
    let user = 555;

    server.handle_update(private_message(ADMIN, "/ban 555")).await;
    assert!(server.api().last_sent().unwrap().contains("Banned user 555"));

    server.handle_update(private_message(user, "hello")).await;
    assert_eq!(server.api().sent_to(user), vec!["You are banned."]);

    server.handle_update(private_message(ADMIN, "/unban 555")).await;
    server.handle_update(private_message(user, "hello again")).await;
    // Unbanned but unverified in a private chat: challenge reminder.
    assert_eq!(
        server.api().sent_to(user).last().unwrap(),
        "Please complete verification using /start."
    );
}

#[tokio::test]
async fn malformed_ban_argument_is_rejected() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "/ban alice")).await;
    assert_eq!(server.api().last_sent().unwrap(), "Usage: /ban <numeric id>");

    server.handle_update(private_message(ADMIN, "/unban 12x")).await;
    assert_eq!(server.api().last_sent().unwrap(), "Usage: /unban <numeric id>");
}

#[tokio::test]
async fn verified_listing_has_placeholder_when_empty() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "/verified")).await;
    assert_eq!(server.api().last_sent().unwrap(), "Verified users:\nNone");

    server.handle_update(callback(77, "verify_ok")).await;
    server.handle_update(private_message(ADMIN, "/verified")).await;
    assert_eq!(server.api().last_sent().unwrap(), "Verified users:\n77");
}

#[tokio::test]
async fn stats_reports_counts_and_reload_time() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "Stats")).await;
    let stats = server.api().last_sent().unwrap();
    assert!(stats.contains("Topics: 2"));
    assert!(stats.contains("Keywords: 3"));
    assert!(!stats.contains("never"));
}

#[tokio::test]
async fn reload_picks_up_on_disk_edits() {
    let (dir, mut server) = seeded_server().await;

    std::fs::write(
        dir.path().join("topics.json"),
        r#"{"gift": {"thread_id": 42, "keywords": ["fresh"]}}"#,
    )
    .unwrap();
    server.handle_update(private_message(ADMIN, "/reload")).await;
    assert_eq!(server.api().last_sent().unwrap(), "Reloaded topic table.");
    assert_eq!(server.topics().get("gift").unwrap().keywords, vec!["fresh"]);
    assert!(server.topics().get("news").is_none());
}

#[tokio::test]
async fn broadcast_test_sends_into_the_well_known_thread() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "Broadcast Test")).await;
    let outbound = server.api().outbound();
    assert!(outbound.iter().any(|call| matches!(
        call,
        Outbound::Sent { chat: ChatRef::Name(name), thread_id: Some(42), .. } if name == "@hub"
    )));
    assert_eq!(server.api().last_sent().unwrap(), "Test broadcasted.");
}

#[tokio::test]
async fn broadcast_test_errors_when_topic_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(dir.path());
    seed_topics(&config, r#"{"news": {"thread_id": 7, "keywords": []}}"#);
    let mut server = RelayServer::new(config, MockApi::new()).await.unwrap();

    server.handle_update(private_message(ADMIN, "Broadcast Test")).await;
    assert_eq!(server.api().last_sent().unwrap(), "'gift' topic not found.");
    // No group send was attempted.
    assert!(!server
        .api()
        .outbound()
        .iter()
        .any(|call| matches!(call, Outbound::Sent { chat: ChatRef::Name(_), .. })));
}

#[tokio::test]
async fn broadcast_test_failure_is_reported_to_the_invoking_admin() {
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(dir.path());
    seed_topics(&config, DEFAULT_TOPICS);
    let mut server = RelayServer::new(config, MockApi::failing_group_sends())
        .await
        .unwrap();

    server.handle_update(private_message(ADMIN, "Broadcast Test")).await;
    assert!(server.api().last_sent().unwrap().starts_with("Failed:"));
    // Only the invoking admin hears about it.
    assert!(server.api().sent_to(SECOND_ADMIN).is_empty());
}

#[tokio::test]
async fn non_admins_have_no_command_surface() {
    let (_dir, mut server) = seeded_server().await;
    let user = 88;

    server.handle_update(callback(user, "verify_ok")).await;
    let before = server.api().outbound().len();

    // Verified non-admin: commands are silently ignored.
    server.handle_update(private_message(user, "Stats")).await;
    server.handle_update(private_message(user, "/ban 1")).await;
    assert_eq!(server.api().outbound().len(), before);
    assert!(!server.access().is_banned(1));

    // Non-private chat from an unverified user: silent drop.
    server.handle_update(group_message(99, -500, "Stats")).await;
    assert_eq!(server.api().outbound().len(), before);
}

#[tokio::test]
async fn unrecognized_admin_text_is_silently_ignored() {
    let (_dir, mut server) = seeded_server().await;

    server.handle_update(private_message(ADMIN, "what's up?")).await;
    assert!(server.api().outbound().is_empty());
}

//! User views and profile maintenance.

mod common;

use std::time::Duration;

use blog::config::BlogConfig;
use blog::contract::error::BlogError;
use blog::contract::model::{ProfilePatch, UserClass};
use blog::domain::repo::BlogStore;

use common::{setup, setup_with, ALICE, BOB, CAROL, DAVE, GUEST, NOBODY};

#[tokio::test]
async fn only_standard_accounts_are_listed() {
    let fx = setup().await;
    let users = fx.api.list_users().await.unwrap();
    let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec![DAVE, CAROL, BOB, ALICE]);
    assert!(users.iter().all(|u| u.class == UserClass::Standard));

    for id in [GUEST, NOBODY] {
        let err = fx.api.get_user(id).await.unwrap_err();
        assert!(matches!(err, BlogError::NotFound { resource: "user", .. }), "{id}");
    }
}

#[tokio::test]
async fn profile_update_ignores_empty_fields() {
    let fx = setup().await;

    let user = fx
        .api
        .update_profile(
            ALICE,
            ProfilePatch {
                description: Some("writer".into()),
                icon_src: Some("/a.png".into()),
                twitter_id: Some("@alice".into()),
                github_id: Some("alice-gh".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(user.description, "writer");
    assert_eq!(user.github_id, "alice-gh");

    let user = fx
        .api
        .update_profile(
            ALICE,
            ProfilePatch {
                description: Some(String::new()),
                icon_src: None,
                twitter_id: Some("@alice2".into()),
                github_id: Some(String::new()),
            },
        )
        .await
        .unwrap();
    assert_eq!(user.description, "writer");
    assert_eq!(user.icon_src, "/a.png");
    assert_eq!(user.twitter_id, "@alice2");
    assert_eq!(user.github_id, "alice-gh");
    assert_eq!(user.name, "ALICE");
}

#[tokio::test]
async fn profile_update_requires_standard_account() {
    let fx = setup().await;
    for actor in [GUEST, NOBODY] {
        let err = fx
            .api
            .update_profile(actor, ProfilePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::Forbidden { .. }), "{actor}");
    }
}

#[tokio::test]
async fn first_write_provisions_an_empty_profile() {
    let fx = setup().await;
    let repo = fx.repo();
    assert!(repo.find_profile(BOB).await.unwrap().is_none());

    fx.project(BOB, "bobs-blog").await;

    let mut profile = None;
    for _ in 0..50 {
        profile = repo.find_profile(BOB).await.unwrap();
        if profile.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let profile = profile.expect("profile provisioned in background");
    assert_eq!(profile.id, BOB);
    assert!(profile.description.is_empty());

    // Idempotent under repeated triggers.
    assert!(!repo.ensure_profile(BOB).await.unwrap());
}

#[tokio::test]
async fn provisioning_can_be_disabled() {
    let fx = setup_with(BlogConfig {
        provision_profiles: false,
        ..Default::default()
    })
    .await;
    fx.project(CAROL, "no-profile").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fx.repo().find_profile(CAROL).await.unwrap().is_none());

    // The user view still works without a profile row.
    let user = fx.api.get_user(CAROL).await.unwrap();
    assert!(user.description.is_empty());
    assert_eq!(user.project_ids.len(), 1);
}

#[tokio::test]
async fn account_refresh_updates_identity_fields() {
    let fx = setup().await;
    fx.module
        .register_account(blog::contract::model::UserAccount {
            id: GUEST.into(),
            name: "Promoted".into(),
            auth: UserClass::STANDARD_TAG.into(),
        })
        .await
        .unwrap();
    let user = fx.api.get_user(GUEST).await.unwrap();
    assert_eq!(user.name, "Promoted");
    assert_eq!(user.class, UserClass::Standard);
}

//! Comment authorization and visibility.

mod common;

use blog::contract::error::BlogError;
use blog::contract::model::{NewComment, NewPost, PageRequest};
use uuid::Uuid;

use common::{setup, ALICE, BOB, GUEST, NOBODY};

fn text(content: &str) -> NewComment {
    NewComment {
        content: content.to_string(),
    }
}

#[tokio::test]
async fn any_registered_account_may_comment() {
    let fx = setup().await;
    let project = fx.project(ALICE, "open").await;
    let post = fx
        .api
        .create_post(
            ALICE,
            project.id,
            NewPost {
                title: "hello".into(),
                content: "world".into(),
                thumb_src: None,
            },
        )
        .await
        .unwrap();

    let c1 = fx.api.create_comment(GUEST, post.id, text("first")).await.unwrap();
    let c2 = fx.api.create_comment(BOB, post.id, text("second")).await.unwrap();
    assert_eq!(c1.author_id, GUEST);

    let err = fx
        .api
        .create_comment(NOBODY, post.id, text("who?"))
        .await
        .unwrap_err();
    assert!(matches!(err, BlogError::Forbidden { .. }), "got {err:?}");

    let listed = fx
        .api
        .list_post_comments(post.id, PageRequest::new(10, 0))
        .await
        .unwrap();
    assert_eq!(
        listed.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![c2.id, c1.id]
    );
    assert_eq!(fx.api.get_post(post.id).await.unwrap().comment_count, 2);
}

#[tokio::test]
async fn empty_comment_is_rejected() {
    let fx = setup().await;
    let project = fx.project(ALICE, "quiet").await;
    let post = fx
        .api
        .create_post(
            ALICE,
            project.id,
            NewPost {
                title: "t".into(),
                content: "c".into(),
                thumb_src: None,
            },
        )
        .await
        .unwrap();
    let err = fx.api.create_comment(BOB, post.id, text("")).await.unwrap_err();
    assert!(matches!(err, BlogError::Validation { .. }));
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let fx = setup().await;
    let err = fx
        .api
        .create_comment(BOB, Uuid::now_v7(), text("void"))
        .await
        .unwrap_err();
    assert!(matches!(err, BlogError::NotFound { resource: "post", .. }));
}

#[tokio::test]
async fn only_author_deletes_comment() {
    let fx = setup().await;
    let project = fx.project(ALICE, "moderated").await;
    let post = fx
        .api
        .create_post(
            ALICE,
            project.id,
            NewPost {
                title: "t".into(),
                content: "c".into(),
                thumb_src: None,
            },
        )
        .await
        .unwrap();
    let comment = fx.api.create_comment(BOB, post.id, text("mine")).await.unwrap();

    // Neither the post author nor the project owner can remove it.
    let err = fx.api.delete_comment(ALICE, comment.id).await.unwrap_err();
    assert!(matches!(err, BlogError::Forbidden { .. }));
    // Passing the comment's own id as actor grants nothing.
    let err = fx
        .api
        .delete_comment(&comment.id.to_string(), comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BlogError::Forbidden { .. }));

    fx.api.delete_comment(BOB, comment.id).await.unwrap();
    let err = fx.api.get_comment(comment.id).await.unwrap_err();
    assert!(matches!(err, BlogError::NotFound { resource: "comment", .. }));
    assert_eq!(fx.api.get_post(post.id).await.unwrap().comment_count, 0);

    let err = fx.api.delete_comment(BOB, comment.id).await.unwrap_err();
    assert!(matches!(err, BlogError::NotFound { .. }));
}

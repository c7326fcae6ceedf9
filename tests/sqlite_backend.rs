use tempfile::TempDir;

use yipyap_votes::{
    core::manager::OptimisticUpdateManager,
    remote::{VoteClient, sqlite::SqliteVoteClient},
    runtime::handle::{RuntimeConfig, spawn_voting_service},
    types::{CurrentUser, TargetRef, VoteDirection},
    vote::Post,
};

#[tokio::test]
async fn upsert_overwrites_and_delete_removes_single_row() {
    let tmp = TempDir::new().expect("tmp");
    let client = SqliteVoteClient::open(tmp.path().join("votes.db")).expect("open sqlite");
    let target = TargetRef::post("p1");
    let alice = "alice".to_string();
    let bob = "bob".to_string();

    client.upsert_vote(&target, &alice, VoteDirection::Up).await.expect("upsert");
    client.upsert_vote(&target, &bob, VoteDirection::Up).await.expect("upsert");
    assert_eq!(client.score_of(&target).await.expect("score"), 2);

    client.upsert_vote(&target, &alice, VoteDirection::Down).await.expect("switch");
    assert_eq!(client.vote_count(&target).await.expect("count"), 2);
    assert_eq!(client.score_of(&target).await.expect("score"), 0);
    assert_eq!(
        client.vote_of(&target, &alice).await.expect("vote"),
        Some(VoteDirection::Down)
    );

    client.delete_vote(&target, &alice).await.expect("delete");
    client.delete_vote(&target, &alice).await.expect("delete missing");
    assert_eq!(client.vote_of(&target, &alice).await.expect("vote"), None);
    assert_eq!(client.score_of(&target).await.expect("score"), 1);
}

#[tokio::test]
async fn post_and_comment_votes_live_in_separate_tables() {
    let client = SqliteVoteClient::open_in_memory().expect("open sqlite");
    let user = "u1".to_string();

    client
        .upsert_vote(&TargetRef::post("x"), &user, VoteDirection::Up)
        .await
        .expect("post vote");
    client
        .upsert_vote(&TargetRef::comment("x"), &user, VoteDirection::Down)
        .await
        .expect("comment vote");

    assert_eq!(client.score_of(&TargetRef::post("x")).await.expect("score"), 1);
    assert_eq!(client.score_of(&TargetRef::comment("x")).await.expect("score"), -1);
}

#[tokio::test]
async fn votes_persist_across_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("votes.db");
    let target = TargetRef::comment("c1");

    {
        let client = SqliteVoteClient::open(&db_path).expect("open sqlite");
        client
            .upsert_vote(&target, &"u1".to_string(), VoteDirection::Up)
            .await
            .expect("upsert");
    }

    let reopened = SqliteVoteClient::open(&db_path).expect("reopen sqlite");
    assert_eq!(
        reopened.vote_of(&target, &"u1".to_string()).await.expect("vote"),
        Some(VoteDirection::Up)
    );
}

#[tokio::test]
async fn service_writes_through_to_sqlite() {
    let client = SqliteVoteClient::open_in_memory().expect("open sqlite");
    let handle = spawn_voting_service(OptimisticUpdateManager::new(), client.clone(), RuntimeConfig::default());
    let me = CurrentUser::new("device-9");
    let mut post = Post {
        id: "p9".to_string(),
        user_id: "author".to_string(),
        content: "lost cat near the library".to_string(),
        vote_score: 0,
        user_vote: None,
        comment_count: 2,
        created_at_ms: 5,
    };

    for tap in [VoteDirection::Up, VoteDirection::Down, VoteDirection::Down] {
        let outcome = handle.vote_on_post(&post, tap, &me).await.expect("vote");
        assert!(outcome.is_confirmed());
        post.apply_update(&outcome.final_update().expect("update"));

        let target = TargetRef::post("p9");
        assert_eq!(client.score_of(&target).await.expect("score"), post.vote_score);
        assert_eq!(client.vote_of(&target, &me.id).await.expect("vote"), post.user_vote);
    }
    assert_eq!((post.vote_score, post.user_vote), (0, None));

    handle.shutdown().await.expect("shutdown");
}

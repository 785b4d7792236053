//! End-to-end journeys through a wall session: compose and celebrate,
//! quota gating, offerings, editing, and two devices sharing one wall.

use std::sync::Arc;
use std::time::Duration;

use kansha_core::{NewPost, OfferingKind};
use kansha_feed::{InMemoryPostStore, PostStore};
use kansha_ledger::DAILY_POST_LIMIT;
use kansha_storage::{InMemoryKeyValueStore, KeyValueStore};
use kansha_wall::{
    BrowseTab, CELEBRATION_MILLIS, ViewCoordinator, ViewError, ViewState, WallSession,
};

async fn session() -> (Arc<InMemoryPostStore>, WallSession) {
    let posts = Arc::new(InMemoryPostStore::new());
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let session = session_with(kv, posts.clone()).await;
    (posts, session)
}

async fn session_with(kv: Arc<dyn KeyValueStore>, posts: Arc<dyn PostStore>) -> WallSession {
    let session = WallSession::new(kv, posts).await.unwrap();
    session.start().await.unwrap();
    session
}

/// Drive one full submission through the view machine.
async fn submit_via_view(session: &WallSession, author: &str, content: &str) {
    let coord = session.coordinator();
    coord.open_compose().await.unwrap();
    coord.set_draft_author(author).unwrap();
    coord.set_draft_content(content).unwrap();
    coord.submit_draft().await.unwrap();
    coord.dismiss_celebration();
}

/// Poll until the view state satisfies `pred`; time stays paused, so
/// this only yields to let already-woken tasks run.
async fn settle_until(coord: &ViewCoordinator, pred: impl Fn(&ViewState) -> bool) {
    for _ in 0..200 {
        if pred(&coord.current_state()) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("view state never settled, last was {:?}", coord.current_state());
}

#[tokio::test(start_paused = true)]
async fn full_submission_journey() {
    let (posts, session) = session().await;
    let coord = session.coordinator();

    coord.open_compose().await.unwrap();
    coord.set_draft_author("Hana").unwrap();
    coord.set_draft_content("今日もありがとう").unwrap();
    coord.submit_draft().await.unwrap();

    // The celebration is up, scheduled to close five seconds out
    let celebration = match coord.current_state() {
        ViewState::Celebrating { celebration } => celebration,
        other => panic!("expected celebration, got {other:?}"),
    };
    assert_eq!(celebration.offering, None);
    assert_eq!(celebration.reply_text, None);
    let due_in = celebration.expires_at_millis - chrono::Utc::now().timestamp_millis();
    assert!((1_000..=6_000).contains(&due_in), "odd expiry: {due_in}ms");

    // Let the timer elapse; the view falls back to browsing on its own
    tokio::time::sleep(Duration::from_millis(CELEBRATION_MILLIS + 100)).await;
    settle_until(coord, |state| state.is_browse()).await;
    assert_eq!(
        coord.current_state(),
        ViewState::Browse {
            tab: BrowseTab::All
        }
    );

    // The post landed and the ledger moved with it
    assert_eq!(posts.len(), 1);
    let feed = coord.visible_posts().await;
    assert_eq!(feed[0].content, "今日もありがとう");
    let ledger = session.sync().ledger().await;
    assert_eq!(ledger.virtue, 1);
    assert_eq!(ledger.daily_post_count, 1);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn interaction_dismisses_the_celebration_early() {
    let (_posts, session) = session().await;
    let coord = session.coordinator();

    coord.open_compose().await.unwrap();
    coord.set_draft_author("Hana").unwrap();
    coord.set_draft_content("short-lived joy").unwrap();
    coord.submit_draft().await.unwrap();
    assert!(coord.current_state().is_celebrating());

    // Switching tabs counts as an interaction and dismisses immediately
    coord.select_tab(BrowseTab::Mine).unwrap();
    assert_eq!(
        coord.current_state(),
        ViewState::Browse {
            tab: BrowseTab::Mine
        }
    );

    // The disarmed timer must not drag the view anywhere later
    tokio::time::sleep(Duration::from_millis(CELEBRATION_MILLIS * 2)).await;
    tokio::task::yield_now().await;
    assert_eq!(
        coord.current_state(),
        ViewState::Browse {
            tab: BrowseTab::Mine
        }
    );

    session.shutdown().await;
}

#[tokio::test]
async fn quota_gates_the_compose_surface() {
    let (posts, session) = session().await;
    let coord = session.coordinator();

    for i in 0..DAILY_POST_LIMIT {
        submit_via_view(&session, "Hana", &format!("post {i}")).await;
    }
    assert_eq!(posts.len(), DAILY_POST_LIMIT as usize);
    assert!(!coord.can_compose().await);
    assert_eq!(coord.open_compose().await, Err(ViewError::QuotaExhausted));

    // Browsing, favorites, and edits stay available regardless
    let post_id = session.sync().current_feed()[0].id;
    session.sync().toggle_favorite(post_id).await.unwrap();
    coord.select_tab(BrowseTab::Mine).unwrap();
    coord.begin_edit(post_id).await.unwrap();
    coord.set_edit_content("still editable").unwrap();
    coord.save_edit().await.unwrap();
    assert_eq!(
        session
            .sync()
            .current_feed()
            .iter()
            .find(|p| p.id == post_id)
            .unwrap()
            .content,
        "still editable"
    );

    session.shutdown().await;
}

#[tokio::test]
async fn earned_offering_flows_into_the_celebration() {
    let (_posts, session) = session().await;
    let coord = session.coordinator();

    // Three submissions earn the first rice ball
    for i in 0..3 {
        submit_via_view(&session, "Hana", &format!("post {i}")).await;
    }
    assert_eq!(session.sync().ledger().await.tokens.rice_balls, 1);

    // The fourth spends it
    coord.open_compose().await.unwrap();
    coord.set_draft_content("with an offering").unwrap();
    coord.choose_offering(OfferingKind::RiceBall).await.unwrap();
    coord.submit_draft().await.unwrap();

    let celebration = match coord.current_state() {
        ViewState::Celebrating { celebration } => celebration,
        other => panic!("expected celebration, got {other:?}"),
    };
    assert_eq!(celebration.offering, Some(OfferingKind::RiceBall));
    assert_eq!(
        celebration.reply_text.as_deref(),
        Some(OfferingKind::RiceBall.reply_text())
    );
    coord.dismiss_celebration();

    // The reply is on the post itself, and the token is gone
    let feed = session.sync().current_feed();
    assert_eq!(
        feed[0].ai_reply.as_deref(),
        Some(OfferingKind::RiceBall.reply_text())
    );
    assert_eq!(session.sync().ledger().await.tokens.rice_balls, 0);

    session.shutdown().await;
}

#[tokio::test]
async fn blank_draft_is_rejected_quietly() {
    let (posts, session) = session().await;
    let coord = session.coordinator();

    coord.open_compose().await.unwrap();
    coord.set_draft_author("Hana").unwrap();
    coord.set_draft_content("   ").unwrap();
    assert!(!coord.can_submit().await);

    // Submitting anyway changes nothing: no post, no state change
    coord.submit_draft().await.unwrap();
    assert!(coord.current_state().is_composing());
    assert!(posts.is_empty());
    assert_eq!(session.sync().ledger().await.virtue, 0);

    session.shutdown().await;
}

#[tokio::test]
async fn blank_edit_keeps_the_old_wording() {
    let (_posts, session) = session().await;
    let coord = session.coordinator();

    submit_via_view(&session, "Hana", "worth keeping").await;
    let post_id = session.sync().current_feed()[0].id;

    coord.select_tab(BrowseTab::Mine).unwrap();
    coord.begin_edit(post_id).await.unwrap();
    coord.set_edit_content("   ").unwrap();

    // Saving anyway changes nothing: the editor stays open, the post
    // keeps its wording
    coord.save_edit().await.unwrap();
    assert!(coord.current_state().is_editing());
    assert_eq!(session.sync().current_feed()[0].content, "worth keeping");

    coord.cancel_edit().unwrap();
    session.shutdown().await;
}

#[tokio::test]
async fn mine_tab_shows_only_owned_posts() {
    let (posts, session) = session().await;
    let coord = session.coordinator();

    posts
        .insert(NewPost::new("Taro", "someone else was grateful"))
        .await
        .unwrap();
    submit_via_view(&session, "Hana", "so was I").await;

    let all = coord.visible_posts().await;
    assert_eq!(all.len(), 2);

    coord.select_tab(BrowseTab::Mine).unwrap();
    let mine = coord.visible_posts().await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].content, "so was I");

    // The foreign post cannot be edited even from here
    let foreign_id = all
        .iter()
        .find(|p| p.author_name == "Taro")
        .unwrap()
        .id;
    assert_eq!(
        coord.begin_edit(foreign_id).await,
        Err(ViewError::NotOwner)
    );

    session.shutdown().await;
}

#[tokio::test]
async fn remembered_name_prefills_the_next_session() {
    let posts: Arc<InMemoryPostStore> = Arc::new(InMemoryPostStore::new());
    let kv: Arc<InMemoryKeyValueStore> = Arc::new(InMemoryKeyValueStore::new());

    let first = session_with(kv.clone(), posts.clone()).await;
    submit_via_view(&first, "Hana", "remember me").await;
    first.shutdown().await;
    drop(first);

    let second = session_with(kv, posts).await;
    let coord = second.coordinator();
    coord.open_compose().await.unwrap();
    match coord.current_state() {
        ViewState::Composing { draft } => assert_eq!(draft.author_name, "Hana"),
        other => panic!("expected compose mode, got {other:?}"),
    }

    second.shutdown().await;
}

#[tokio::test]
async fn two_sessions_share_one_wall() {
    let posts = Arc::new(InMemoryPostStore::new());

    let a = session_with(Arc::new(InMemoryKeyValueStore::new()), posts.clone()).await;
    let b = session_with(Arc::new(InMemoryKeyValueStore::new()), posts.clone()).await;

    submit_via_view(&a, "Hana", "from A").await;
    let post_id = a.sync().current_feed()[0].id;

    // B converges through the change notice
    let mut b_feed = b.sync().feed();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                if b_feed.borrow().iter().any(|p| p.id == post_id) {
                    break;
                }
            }
            b_feed.changed().await.unwrap();
        }
    })
    .await
    .expect("B never saw A's post");

    // B may favorite it but not edit it, and earned nothing from it
    assert!(b.sync().toggle_favorite(post_id).await.unwrap());
    b.coordinator().select_tab(BrowseTab::Mine).unwrap();
    assert_eq!(
        b.coordinator().begin_edit(post_id).await,
        Err(ViewError::NotOwner)
    );
    assert_eq!(b.sync().ledger().await.virtue, 0);
    assert!(b.coordinator().visible_posts().await.is_empty());

    a.shutdown().await;
    b.shutdown().await;
}

//! Live feed for one user's profile
//!
//! Opens the `Users` and `Posts` queries for a uid and merges them into a
//! single stream. Dropping the feed cancels both queries.

use futures::stream::{select, LocalBoxStream};
use futures::StreamExt;

use crate::stores::document_store::{DocumentStore, Query, Snapshot, StoreError};
use crate::stores::profile_view::{ProfileError, ProfileView, POSTS_COLLECTION, USERS_COLLECTION};

/// One snapshot from either side of the feed
#[derive(Clone, Debug)]
pub enum FeedEvent {
    User(Snapshot),
    Posts(Snapshot),
}

impl FeedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedEvent::User(_) => "user",
            FeedEvent::Posts(_) => "posts",
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        match self {
            FeedEvent::User(snapshot) | FeedEvent::Posts(snapshot) => snapshot,
        }
    }

    /// Apply this event to `view`
    pub fn apply(&self, view: &mut ProfileView) -> Result<(), ProfileError> {
        log::debug!("Applying {} snapshot from {}", self.kind(), self.snapshot().received_at);
        match self {
            FeedEvent::User(snapshot) => view.apply_user_snapshot(snapshot),
            FeedEvent::Posts(snapshot) => {
                view.apply_posts_snapshot(snapshot);
                Ok(())
            }
        }
    }
}

pub struct ProfileFeed {
    uid: String,
    events: LocalBoxStream<'static, FeedEvent>,
}

impl ProfileFeed {
    /// Open both live queries for `uid`
    pub fn open(store: &dyn DocumentStore, uid: &str) -> Result<Self, StoreError> {
        let users = store.subscribe(Query::collection(USERS_COLLECTION).where_eq("uid", uid))?;
        // If this fails `users` is dropped and cancelled with it
        let posts = store.subscribe(Query::collection(POSTS_COLLECTION).where_eq("userUID", uid))?;

        log::info!(
            "Opened profile feed on {} store: {} and {}",
            store.name(),
            users.query(),
            posts.query()
        );

        let events = select(users.map(FeedEvent::User), posts.map(FeedEvent::Posts)).boxed_local();
        Ok(Self {
            uid: uid.to_string(),
            events,
        })
    }

    #[allow(dead_code)]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Next snapshot from either query, `None` once both have closed
    #[allow(dead_code)]
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.events.next().await
    }

    /// Consume the feed as a stream
    pub fn into_stream(self) -> LocalBoxStream<'static, FeedEvent> {
        self.events
    }

    #[allow(dead_code)]
    pub fn cancel(self) {
        log::debug!("Cancelling profile feed for {}", self.uid);
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory_store::MemoryStore;
    use futures::executor::block_on;
    use futures::FutureExt;
    use serde_json::json;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .set_json("Users", "u-ada", json!({
                "uid": "ada", "displayName": "Ada", "followers": ["x", "y", "z"], "postsCount": 9
            }))
            .unwrap();
        store
            .set_json("Users", "u-bob", json!({"uid": "bob", "displayName": "Bob", "following": ["ada"]}))
            .unwrap();
        for i in 0..5 {
            store
                .set_json("Posts", &format!("ada-{}", i), json!({"userUID": "ada", "imageUrl": format!("https://img/ada/{}.jpg", i)}))
                .unwrap();
        }
        store
            .set_json("Posts", "bob-0", json!({"userUID": "bob", "imageUrl": "https://img/bob/0.jpg"}))
            .unwrap();
        store
    }

    /// Apply every event that is ready right now
    fn drain(feed: &mut ProfileFeed, view: &mut ProfileView) -> usize {
        let mut applied = 0;
        while let Some(Some(event)) = feed.next_event().now_or_never() {
            let _ = event.apply(view);
            applied += 1;
        }
        applied
    }

    #[test]
    fn test_initial_snapshots_fill_view() {
        let store = seeded();
        let mut feed = ProfileFeed::open(&store, "ada").unwrap();
        let mut view = ProfileView::default();

        assert_eq!(drain(&mut feed, &mut view), 2);
        assert_eq!(view.display_name, "Ada");
        assert_eq!(view.followers_count, 3);
        assert_eq!(view.following_count, 0);
        // live count beats the stored 9
        assert_eq!(view.posts_count(), 5);
    }

    #[test]
    fn test_deletes_shrink_grid() {
        let store = seeded();
        let mut feed = ProfileFeed::open(&store, "ada").unwrap();
        let mut view = ProfileView::default();
        drain(&mut feed, &mut view);

        store.delete_document("Posts", "ada-3");
        store.delete_document("Posts", "ada-4");
        drain(&mut feed, &mut view);
        assert_eq!(view.posts().len(), 3);
        assert_eq!(view.posts_count(), 3);
    }

    #[test]
    fn test_user_update_arrives_live() {
        let store = seeded();
        let mut feed = ProfileFeed::open(&store, "ada").unwrap();
        let mut view = ProfileView::default();
        drain(&mut feed, &mut view);

        store
            .set_json("Users", "u-ada", json!({"uid": "ada", "displayName": "Ada L.", "following": ["bob"]}))
            .unwrap();
        let event = block_on(feed.next_event()).unwrap();
        assert!(matches!(event, FeedEvent::User(_)));
        event.apply(&mut view).unwrap();
        assert_eq!(view.display_name, "Ada L.");
        assert_eq!(view.followers_count, 0);
        assert_eq!(view.following_count, 1);
        assert_eq!(view.posts_count(), 5);
    }

    #[test]
    fn test_switching_user_shows_only_new_data() {
        let store = seeded();
        let mut view = ProfileView::default();

        let mut feed = ProfileFeed::open(&store, "ada").unwrap();
        drain(&mut feed, &mut view);
        assert_eq!(store.listener_count(), 2);

        feed.cancel();
        view.reset();
        assert_eq!(store.listener_count(), 0);

        // writes for the old user reach nobody
        store
            .set_json("Posts", "ada-9", json!({"userUID": "ada", "imageUrl": "https://img/ada/9.jpg"}))
            .unwrap();

        let mut feed = ProfileFeed::open(&store, "bob").unwrap();
        assert_eq!(view, ProfileView::default());
        drain(&mut feed, &mut view);
        assert_eq!(feed.uid(), "bob");
        assert_eq!(view.display_name, "Bob");
        assert_eq!(view.following_count, 1);
        assert_eq!(view.posts_count(), 1);
        assert!(view.posts().iter().all(|p| p.image_url.contains("/bob/")));
    }

    #[test]
    fn test_post_without_image_still_counts() {
        let store = seeded();
        store
            .set_json("Posts", "bob-1", json!({"userUID": "bob", "imageUrl": null}))
            .unwrap();
        store.set_json("Posts", "bob-2", json!({"userUID": "bob"})).unwrap();

        let mut feed = ProfileFeed::open(&store, "bob").unwrap();
        let mut view = ProfileView::default();
        drain(&mut feed, &mut view);
        assert_eq!(view.posts_count(), 3);
        assert_eq!(view.posts().len(), 3);
    }

    #[test]
    fn test_uid_is_matched_exactly() {
        let store = seeded();
        let mut feed = ProfileFeed::open(&store, " ada").unwrap();
        let mut view = ProfileView::default();
        drain(&mut feed, &mut view);
        assert_eq!(view.display_name, "");
        assert_eq!(view.posts_count(), 0);
    }

    #[test]
    fn test_unknown_user_stays_default() {
        let store = seeded();
        let mut feed = ProfileFeed::open(&store, "nobody").unwrap();
        let mut view = ProfileView::default();
        drain(&mut feed, &mut view);
        assert_eq!(view.display_name, "");
        assert_eq!(view.posts_count(), 0);
    }
}

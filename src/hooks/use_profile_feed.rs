use dioxus::prelude::*;
use dioxus::core::Task;
use futures::StreamExt;

use crate::context::app_context::AppContext;
use crate::services::profile_feed::ProfileFeed;
use crate::stores::profile_view::ProfileView;

/// Keep a `ProfileView` in sync with the live data of `uid`
///
/// Whenever `uid` changes the running feed is cancelled and the view is reset
/// before the new user's queries open, so nothing from the previous user is
/// shown. With no uid no queries are opened. The feed is cancelled on unmount.
pub fn use_profile_feed(uid: Option<String>) -> Signal<ProfileView> {
    let store = use_context::<AppContext>().store;
    let mut view = use_signal(ProfileView::default);
    let mut feed_task = use_signal(|| None::<Task>);

    use_effect(use_reactive(&uid, move |uid| {
        // Cancel the previous feed before anything else
        if let Some(task) = *feed_task.peek() {
            task.cancel();
        }
        feed_task.set(None);
        view.write().reset();

        let Some(uid) = uid else {
            log::debug!("No uid, profile feed idle");
            return;
        };

        let feed = match ProfileFeed::open(&*store, &uid) {
            Ok(feed) => feed,
            Err(e) => {
                log::error!("Failed to open profile feed for {}: {}", uid, e);
                return;
            }
        };

        let task = spawn(async move {
            let mut events = feed.into_stream();
            while let Some(event) = events.next().await {
                if let Err(e) = event.apply(&mut view.write()) {
                    log::warn!("Profile {}: {}", uid, e);
                }
            }
            log::debug!("Profile feed for {} closed", uid);
        });
        feed_task.set(Some(task));
    }));

    use_drop(move || {
        if let Some(task) = *feed_task.peek() {
            task.cancel();
        }
    });

    view
}

use dioxus::prelude::*;
use dioxus::core::Task;
use futures::StreamExt;

use crate::components::icons::UserIcon;
use crate::components::ProfileModal;
use crate::context::app_context::AppContext;
use crate::routes::Route;
use crate::stores::document_store::{Query, Snapshot};
use crate::stores::profile_view::{UserIdentity, UserRecord, USERS_COLLECTION};
use crate::utils::truncate_name;

/// One row of the people directory
#[derive(Clone, Debug, PartialEq)]
pub struct DirectoryEntry {
    pub uid: String,
    pub avatar: String,
    pub identity: UserIdentity,
    pub display_name: String,
    pub followers_count: usize,
}

/// Build directory rows from a `Users` snapshot, sorted by name
pub fn directory_entries(snapshot: &Snapshot) -> Vec<DirectoryEntry> {
    let mut entries: Vec<DirectoryEntry> = snapshot
        .documents
        .iter()
        .filter_map(|doc| match doc.decode::<UserRecord>() {
            Ok(record) => record.identity().map(|identity| DirectoryEntry {
                uid: identity.query_uid().unwrap_or_default().to_string(),
                avatar: identity.avatar_src().to_string(),
                display_name: record.display_name.clone().unwrap_or_default(),
                followers_count: record.followers_count(),
                identity,
            }),
            Err(e) => {
                log::warn!("Skipping user in directory: {}", e);
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.uid.cmp(&b.uid))
    });
    entries
}

#[component]
pub fn Home() -> Element {
    rsx! {
        Directory { open_uid: None }
    }
}

/// Deep link that opens the profile modal for `uid`
#[component]
pub fn UserProfile(uid: String) -> Element {
    rsx! {
        Directory { open_uid: Some(uid) }
    }
}

#[component]
fn Directory(#[props(!optional)] open_uid: Option<String>) -> Element {
    let store = use_context::<AppContext>().store;
    let mut people = use_signal(Vec::<DirectoryEntry>::new);
    let mut loading = use_signal(|| true);
    let mut selected_uid = use_signal(|| None::<String>);
    let mut modal_open = use_signal(|| false);
    let mut directory_task = use_signal(|| None::<Task>);
    let nav = use_navigator();

    // Live list of all users
    use_effect(move || {
        let subscription = match store.subscribe(Query::collection(USERS_COLLECTION)) {
            Ok(subscription) => subscription,
            Err(e) => {
                log::error!("Failed to load people directory: {}", e);
                loading.set(false);
                return;
            }
        };
        let task = spawn(async move {
            let mut snapshots = subscription;
            while let Some(snapshot) = snapshots.next().await {
                people.set(directory_entries(&snapshot));
                loading.set(false);
            }
        });
        directory_task.set(Some(task));
    });

    use_drop(move || {
        if let Some(task) = *directory_task.peek() {
            task.cancel();
        }
    });

    // Deep link opens the modal
    use_effect(use_reactive(&open_uid, move |uid| {
        if let Some(uid) = uid {
            selected_uid.set(Some(uid));
            modal_open.set(true);
        }
    }));

    // Prefer the directory's identity so the avatar shows
    let selected_user = selected_uid.read().as_ref().map(|uid| {
        people
            .read()
            .iter()
            .find(|entry| &entry.uid == uid)
            .map(|entry| entry.identity.clone())
            .unwrap_or_else(|| UserIdentity::new(uid.clone()))
    });

    let deep_linked = open_uid.is_some();
    let entries = people.read().clone();

    rsx! {
        div {
            class: "max-w-2xl mx-auto p-4",

            h1 {
                class: "text-2xl font-bold mb-4",
                "People"
            }

            if *loading.read() {
                div {
                    class: "text-muted-foreground",
                    "Loading people..."
                }
            } else if entries.is_empty() {
                div {
                    class: "text-muted-foreground",
                    "No one here yet."
                }
            } else {
                ul {
                    class: "divide-y divide-border border border-border rounded-lg",
                    for entry in entries {
                        li {
                            key: "{entry.uid}",
                            class: "flex items-center gap-3 p-3 hover:bg-accent cursor-pointer transition",
                            onclick: {
                                let uid = entry.uid.clone();
                                move |_| {
                                    selected_uid.set(Some(uid.clone()));
                                    modal_open.set(true);
                                }
                            },
                            if entry.avatar.is_empty() {
                                div {
                                    class: "w-10 h-10 rounded-full bg-muted flex items-center justify-center text-muted-foreground",
                                    UserIcon { class: "w-5 h-5".to_string() }
                                }
                            } else {
                                img {
                                    class: "w-10 h-10 rounded-full object-cover",
                                    src: "{entry.avatar}",
                                    alt: "avatar",
                                }
                            }
                            div {
                                class: "flex flex-col",
                                span {
                                    class: "font-semibold",
                                    {truncate_name(&entry.display_name, 32)}
                                }
                                span {
                                    class: "text-sm text-muted-foreground",
                                    "{entry.followers_count} Followers"
                                }
                            }
                        }
                    }
                }
            }

            ProfileModal {
                is_open: *modal_open.read(),
                on_close: move |_| {
                    modal_open.set(false);
                    if deep_linked {
                        nav.push(Route::Home {});
                    }
                },
                user: selected_user,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::document_store::Document;
    use serde_json::{json, Value};

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_directory_sorted_and_filtered() {
        let snapshot = Snapshot::new(vec![
            doc("1", json!({"uid": "g", "displayName": "grace", "followers": ["a"]})),
            doc("2", json!({"displayName": "No uid"})),
            doc("3", json!({"uid": "a", "displayName": "Ada"})),
            doc("4", json!({"uid": "x", "displayName": 5})),
        ]);
        let entries = directory_entries(&snapshot);
        let uids: Vec<&str> = entries.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "g"]);
        assert_eq!(entries[1].followers_count, 1);
    }
}

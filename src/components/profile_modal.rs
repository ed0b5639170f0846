use dioxus::prelude::*;

use crate::components::icons::{MenuIcon, UserIcon, XIcon};
use crate::components::PostTile;
use crate::context::app_context::AppContext;
use crate::hooks::use_profile_feed;
use crate::stores::profile_view::UserIdentity;
use crate::utils::format_counts_line;

/// Modal showing a user's avatar, name, counts and post grid, kept live
///
/// The live queries follow `user`, not `is_open`: they start as soon as a user
/// with a uid is given and stop when the user changes or the modal unmounts.
#[component]
pub fn ProfileModal(
    is_open: bool,
    on_close: EventHandler<()>,
    #[props(!optional)] user: Option<UserIdentity>,
) -> Element {
    let fallback_url = use_context::<AppContext>().fallback_image_url().to_string();
    let uid = user.as_ref().and_then(|u| u.query_uid()).map(str::to_string);
    let view = use_profile_feed(uid);

    if !is_open {
        return rsx! {};
    }

    let avatar_src = user.as_ref().map(|u| u.avatar_src().to_string()).unwrap_or_default();
    let state = view.read();
    let counts = format_counts_line(state.posts_count(), state.followers_count, state.following_count);
    let display_name = state.display_name.clone();
    let posts = state.posts().to_vec();
    drop(state);

    rsx! {
        // Modal overlay - clicking outside closes
        div {
            class: "fixed inset-0 bg-black/50 z-50 flex items-start justify-center p-4 overflow-y-auto",
            onclick: move |_| on_close.call(()),
            onkeydown: move |e| {
                if e.key() == Key::Escape {
                    on_close.call(());
                }
            },

            // Modal content
            div {
                class: "relative bg-card border border-border rounded-xl shadow-xl w-full max-w-5xl flex flex-col items-center justify-center",
                role: "dialog",
                aria_modal: "true",
                aria_labelledby: "profile-modal-name",
                onclick: move |e| e.stop_propagation(),

                button {
                    class: "absolute top-3 right-3 p-1 rounded hover:bg-accent transition",
                    "aria-label": "Close profile",
                    onclick: move |_| on_close.call(()),
                    XIcon { class: "w-5 h-5".to_string() }
                }

                // Header
                div {
                    class: "flex items-center m-5",
                    if avatar_src.is_empty() {
                        div {
                            class: "w-20 h-20 mr-4 rounded-full bg-muted flex items-center justify-center text-muted-foreground",
                            UserIcon { class: "w-10 h-10".to_string() }
                        }
                    } else {
                        img {
                            class: "w-20 h-20 mr-4 rounded-full object-cover",
                            src: "{avatar_src}",
                            alt: "avatar",
                        }
                    }
                    div {
                        class: "flex flex-col",
                        div {
                            class: "flex items-center",
                            span {
                                id: "profile-modal-name",
                                class: "text-xl font-semibold mr-2",
                                "{display_name}"
                            }
                        }
                        p {
                            class: "mt-4 mb-2 whitespace-pre",
                            "{counts}"
                        }
                    }
                }

                // Divider
                div {
                    class: "w-[90%] border-t border-gray-300 flex justify-center",
                    MenuIcon { class: "w-5 h-5 mt-2".to_string() }
                }

                // Post grid
                div {
                    class: "flex flex-wrap justify-center",
                    for post in posts {
                        PostTile {
                            key: "{post.id}",
                            post: post.clone(),
                            fallback_url: fallback_url.clone(),
                        }
                    }
                }
            }
        }
    }
}

use dioxus::prelude::*;

pub mod home;

use home::{Home, UserProfile};

/// App routes
#[derive(Clone, Routable, Debug, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/")]
        Home {},

        #[route("/u/:uid")]
        UserProfile { uid: String },
    #[end_layout]

    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div {
            class: "min-h-screen bg-background text-foreground",
            header {
                class: "border-b border-border px-4 py-3",
                Link {
                    to: Route::Home {},
                    class: "text-lg font-bold",
                    "photoshare"
                }
            }
            main {
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div {
            class: "max-w-2xl mx-auto p-4",
            h1 { class: "text-2xl font-bold mb-2", "Page not found" }
            p { class: "text-muted-foreground mb-4", "Nothing lives at /{path}" }
            Link { to: Route::Home {}, class: "underline", "Back to people" }
        }
    }
}

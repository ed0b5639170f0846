use dioxus::prelude::*;

use crate::stores::profile_view::Post;

/// Image source of one tile, with a single swap to the fallback on error
#[derive(Clone, Debug, PartialEq)]
pub struct TileImage {
    original: String,
    src: String,
    fallback_applied: bool,
}

impl TileImage {
    pub fn new(url: &str) -> Self {
        Self {
            original: url.to_string(),
            src: url.to_string(),
            fallback_applied: false,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback_applied
    }

    /// Handle a load error. Switches to `fallback` the first time only and
    /// reports whether the source changed.
    pub fn on_load_error(&mut self, fallback: &str) -> bool {
        if self.fallback_applied {
            return false;
        }
        self.fallback_applied = true;
        self.src = fallback.to_string();
        true
    }
}

/// Fixed-size 420x300 rounded image tile for one post
#[component]
pub fn PostTile(post: Post, fallback_url: String) -> Element {
    let mut image = use_signal(|| TileImage::new(&post.image_url));

    // Same post id with a new image url starts over
    use_effect(use_reactive(&post.image_url, move |url| {
        if image.peek().original() != url {
            image.set(TileImage::new(&url));
        }
    }));

    let src = image.read().src().to_string();
    let post_id = post.id.clone();

    rsx! {
        div {
            class: "m-2.5 flex items-center justify-center",
            div {
                class: "relative",
                style: "width: 420px; height: 300px;",
                img {
                    src: "{src}",
                    alt: "Post",
                    class: "w-full h-full object-cover rounded-lg",
                    loading: "lazy",
                    onerror: move |_| {
                        let fallback = fallback_url.clone();
                        if image.write().on_load_error(&fallback) {
                            log::warn!("Image for post {} failed to load, using fallback", post_id);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_applied_once() {
        let mut image = TileImage::new("https://img/broken.jpg");
        assert_eq!(image.src(), "https://img/broken.jpg");

        assert!(image.on_load_error("/fallback.svg"));
        assert_eq!(image.src(), "/fallback.svg");
        assert!(image.is_fallback());

        // the fallback failing too must not loop
        assert!(!image.on_load_error("/other.svg"));
        assert_eq!(image.src(), "/fallback.svg");
        assert_eq!(image.original(), "https://img/broken.jpg");
    }
}

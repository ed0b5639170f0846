use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::stores::document_store::{Document, Snapshot};

pub const USERS_COLLECTION: &str = "Users";
pub const POSTS_COLLECTION: &str = "Posts";

/// Who to show. Supplied by the caller.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            photo_url: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_photo(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    /// The uid to query by, exactly as given; `None` when missing or empty
    pub fn query_uid(&self) -> Option<&str> {
        self.uid.as_deref().filter(|uid| !uid.is_empty())
    }

    /// Avatar source; empty string when the caller has none
    pub fn avatar_src(&self) -> &str {
        self.photo_url.as_deref().unwrap_or("")
    }
}

/// Fields we read from a `Users` document
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub followers: Option<Value>,
    #[serde(default)]
    pub following: Option<Value>,
    #[serde(rename = "postsCount", default)]
    pub posts_count: Option<Value>,
}

impl UserRecord {
    pub fn followers_count(&self) -> usize {
        relation_len(self.followers.as_ref())
    }

    pub fn following_count(&self) -> usize {
        relation_len(self.following.as_ref())
    }

    /// Stored `postsCount`; anything that isn't a non-negative number counts as 0
    pub fn stored_posts_count(&self) -> usize {
        self.posts_count
            .as_ref()
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)))
            .unwrap_or(0) as usize
    }

    /// Identity to hand to the profile modal, if the record has a uid
    pub fn identity(&self) -> Option<UserIdentity> {
        let uid = self.uid.as_deref().filter(|uid| !uid.is_empty())?;
        Some(UserIdentity {
            uid: Some(uid.to_string()),
            photo_url: self.photo_url.clone().filter(|url| !url.trim().is_empty()),
        })
    }
}

fn relation_len(value: Option<&Value>) -> usize {
    value.and_then(Value::as_array).map(Vec::len).unwrap_or(0)
}

const IMAGE_URL_FIELD: &str = "imageUrl";

/// A post from the `Posts` collection. Unknown fields ride along in `extra`.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub id: String,
    pub image_url: String,
    pub extra: Map<String, Value>,
}

impl Post {
    /// Every document is a post. A missing or non-string `imageUrl` becomes an
    /// empty source, which the tile replaces with the fallback image.
    pub fn from_document(document: &Document) -> Self {
        let mut extra = document.fields.clone();
        let image_url = match extra.remove(IMAGE_URL_FIELD) {
            Some(Value::String(url)) => url,
            Some(other) => {
                log::debug!("Post {} has a non-string imageUrl: {}", document.id, other);
                extra.insert(IMAGE_URL_FIELD.to_string(), other);
                String::new()
            }
            None => String::new(),
        };
        Self {
            id: document.id.clone(),
            image_url,
            extra,
        }
    }
}

/// Raised when a user snapshot needed validation to be applied
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// More than one `Users` document carries the same uid
    DuplicateUid { chosen_id: String, count: usize },
    /// The chosen user document could not be decoded
    InvalidUser(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateUid { chosen_id, count } => {
                write!(f, "{} user documents share one uid, using {}", count, chosen_id)
            }
            Self::InvalidUser(msg) => write!(f, "Invalid user document: {}", msg),
        }
    }
}

impl std::error::Error for ProfileError {}

/// What the profile modal renders
///
/// Built from two independent feeds. The posts count shown is the live length
/// of the post list once the posts feed has delivered, and the user document's
/// stored `postsCount` only until then, whatever order snapshots arrive in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileView {
    pub display_name: String,
    pub followers_count: usize,
    pub following_count: usize,
    stored_posts_count: usize,
    posts: Option<Vec<Post>>,
}

impl ProfileView {
    pub fn posts(&self) -> &[Post] {
        self.posts.as_deref().unwrap_or(&[])
    }

    pub fn posts_count(&self) -> usize {
        match &self.posts {
            Some(posts) => posts.len(),
            None => self.stored_posts_count,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a `Users` snapshot
    ///
    /// An empty snapshot leaves the view as it is. With several matches the
    /// document with the smallest id is applied and `DuplicateUid` is returned.
    pub fn apply_user_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), ProfileError> {
        let Some(chosen) = snapshot.documents.iter().min_by(|a, b| a.id.cmp(&b.id)) else {
            return Ok(());
        };

        let record: UserRecord = chosen
            .decode()
            .map_err(|e| ProfileError::InvalidUser(e.to_string()))?;

        self.display_name = record.display_name.clone().unwrap_or_default();
        self.followers_count = record.followers_count();
        self.following_count = record.following_count();
        self.stored_posts_count = record.stored_posts_count();

        if snapshot.len() > 1 {
            return Err(ProfileError::DuplicateUid {
                chosen_id: chosen.id.clone(),
                count: snapshot.len(),
            });
        }
        Ok(())
    }

    /// Apply a `Posts` snapshot, replacing the post list wholesale
    pub fn apply_posts_snapshot(&mut self, snapshot: &Snapshot) {
        self.posts = Some(snapshot.documents.iter().map(Post::from_document).collect());
    }
}

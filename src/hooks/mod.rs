pub mod use_profile_feed;

pub use use_profile_feed::use_profile_feed;

// Services
// Data plumbing that sits between the stores and the components

pub mod profile_feed;

// UI Components
// This module contains all reusable UI components

pub mod icons;
pub mod post_tile;
pub mod profile_modal;

pub use post_tile::PostTile;
pub use profile_modal::ProfileModal;

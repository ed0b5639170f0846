// Utility functions
// Helper functions for common operations

pub mod format;

pub use format::{format_counts_line, truncate_name};

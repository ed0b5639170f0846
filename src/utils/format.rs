/// Header counts line: "3 Posts  10 Followers  2 Following"
pub fn format_counts_line(posts: usize, followers: usize, following: usize) -> String {
    format!("{} Posts  {} Followers  {} Following", posts, followers, following)
}

/// Shorten long display names for the directory list, keeping whole characters
pub fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let head: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}\u{2026}", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_line() {
        assert_eq!(format_counts_line(0, 0, 0), "0 Posts  0 Followers  0 Following");
        assert_eq!(format_counts_line(5, 3, 1), "5 Posts  3 Followers  1 Following");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Ada", 10), "Ada");
        assert_eq!(truncate_name("Ada Lovelace", 5), "Ada\u{2026}");
        assert_eq!(truncate_name("ÅÅÅÅÅÅ", 3), "ÅÅ\u{2026}");
    }
}

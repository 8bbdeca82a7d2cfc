//! Named site/substation groups.
//!
//! Each group maps a wind-farm nickname to the column substrings that select
//! its generation columns in a SCADA export. Keys match exactly.

/// Group name -> column selectors.
pub const SITE_GROUPS: &[(&str, &[&str])] = &[
    ("West Wind", &["WWD"]),
    ("Tararua", &["TWF", "TWC"]),
    ("North Island", &["TWF", "TWC", "TUK", "TRH", "TAP", "WWD"]),
    ("Tararua Sth", &["TWF", "TWC"]),
    ("Tararua Nth", &["TAP", "TRH"]),
    ("Te Apiti", &["TAP"]),
    ("All Tararua", &["TWF", "TWC", "TRH", "TAP"]),
    ("South Island", &["MAH", "WHL"]),
    ("Te Uku", &["TUK"]),
    ("Mahinerangi", &["MAH"]),
    ("White Hill", &["WHL"]),
    ("New Zealand", &["GENERAT"]),
];

/// Selectors for `group`, or `None` when the name is not in the table.
pub fn group_selectors(group: &str) -> Option<&'static [&'static str]> {
    SITE_GROUPS
        .iter()
        .find(|(name, _)| *name == group)
        .map(|(_, selectors)| *selectors)
}

pub fn group_names() -> impl Iterator<Item = &'static str> {
    SITE_GROUPS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_groups_resolve() {
        assert_eq!(group_selectors("Te Apiti"), Some(&["TAP"][..]));
        assert_eq!(
            group_selectors("North Island"),
            Some(&["TWF", "TWC", "TUK", "TRH", "TAP", "WWD"][..])
        );
        assert_eq!(group_selectors("New Zealand"), Some(&["GENERAT"][..]));
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(group_selectors("te apiti"), None);
        assert_eq!(group_selectors("Te Apiti "), None);
        assert_eq!(group_selectors("Hawke's Bay"), None);
    }

    #[test]
    fn table_has_twelve_unique_names() {
        let mut names: Vec<_> = group_names().collect();
        assert_eq!(names.len(), 12);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 12);
    }
}

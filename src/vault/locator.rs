//! Prefix search and adjacency grouping over a decoded vault.
//!
//! Both operations work on the records in store order and never reorder
//! them.

use super::record::Record;

/// A run of consecutive records sharing one group value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordGroup {
    pub key: String,
    pub records: Vec<Record>,
}

/// Case-insensitive `starts_with`.
fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// The first record whose name starts with `query`, ignoring case.
///
/// An empty query matches the first record. Later records with the same
/// prefix are never returned ahead of an earlier one.
pub fn find_by_name<'a>(records: &'a [Record], query: &str) -> Option<&'a Record> {
    records
        .iter()
        .find(|r| starts_with_ignore_case(&r.name, query))
}

/// Records whose group starts with `filter` (ignoring case), split into
/// runs of adjacent records with an identical group.
///
/// Groups A, A, B, A yield three runs: A(2), B(1), A(1).
pub fn list_by_group(records: &[Record], filter: &str) -> Vec<RecordGroup> {
    let mut groups: Vec<RecordGroup> = Vec::new();

    for record in records
        .iter()
        .filter(|r| filter.is_empty() || starts_with_ignore_case(&r.group, filter))
    {
        match groups.last_mut() {
            Some(run) if run.key == record.group => run.records.push(record.clone()),
            _ => groups.push(RecordGroup {
                key: record.group.clone(),
                records: vec![record.clone()],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, group: &str) -> Record {
        Record::new(name, "user", "pw", group, "")
    }

    fn scenario() -> Vec<Record> {
        vec![
            Record::new("github", "alice", "pw1", "Dev", ""),
            Record::new("gitlab", "alice", "pw2", "Dev", "work"),
        ]
    }

    #[test]
    fn first_prefix_match_wins() {
        let records = scenario();
        assert_eq!(find_by_name(&records, "git").unwrap().name, "github");
        assert_eq!(find_by_name(&records, "gitl").unwrap().name, "gitlab");
        assert!(find_by_name(&records, "bit").is_none());
    }

    #[test]
    fn empty_query_matches_first_record() {
        let records = scenario();
        assert_eq!(find_by_name(&records, "").unwrap().name, "github");
        assert!(find_by_name(&[], "").is_none());
    }

    #[test]
    fn lookup_ignores_case() {
        let records = vec![rec("GitHub", "Dev"), rec("Mail", "Home")];
        for q in ["git", "GIT", "Git", "gItHuB"] {
            assert_eq!(find_by_name(&records, q).unwrap().name, "GitHub");
        }
        assert_eq!(find_by_name(&records, "MAIL").unwrap().name, "Mail");
    }

    #[test]
    fn duplicate_names_resolve_to_earliest() {
        let records = vec![
            Record::new("bank", "old", "pw-old", "Money", ""),
            Record::new("bank", "new", "pw-new", "Money", ""),
        ];
        assert_eq!(find_by_name(&records, "bank").unwrap().username, "old");
    }

    #[test]
    fn no_match_when_query_is_not_a_prefix() {
        let records = vec![rec("mygithub", "Dev")];
        assert!(find_by_name(&records, "github").is_none());
    }

    #[test]
    fn grouping_is_by_adjacency() {
        let records = vec![rec("a1", "A"), rec("a2", "A"), rec("b1", "B"), rec("a3", "A")];
        let groups = list_by_group(&records, "");
        let shape: Vec<(&str, usize)> = groups
            .iter()
            .map(|g| (g.key.as_str(), g.records.len()))
            .collect();
        assert_eq!(shape, [("A", 2), ("B", 1), ("A", 1)]);
        assert_eq!(groups[2].records[0].name, "a3");
    }

    #[test]
    fn filter_applies_before_grouping() {
        let records = vec![
            rec("w1", "Work"),
            rec("h1", "Home"),
            rec("w2", "Work"),
            rec("w3", "workshop"),
        ];
        let groups = list_by_group(&records, "WOR");
        let shape: Vec<(&str, usize)> = groups
            .iter()
            .map(|g| (g.key.as_str(), g.records.len()))
            .collect();
        // Removing "Home" makes the two "Work" records adjacent.
        assert_eq!(shape, [("Work", 2), ("workshop", 1)]);
    }

    #[test]
    fn group_keys_compare_exactly() {
        let records = vec![rec("a", "Dev"), rec("b", "dev")];
        assert_eq!(list_by_group(&records, "").len(), 2);
    }

    #[test]
    fn scenario_lists_one_group_in_order() {
        let groups = list_by_group(&scenario(), "");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "Dev");
        let names: Vec<&str> = groups[0].records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["github", "gitlab"]);
    }

    #[test]
    fn empty_vault_lists_nothing() {
        assert!(list_by_group(&[], "").is_empty());
        assert!(list_by_group(&scenario(), "Home").is_empty());
    }
}

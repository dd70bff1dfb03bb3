use super::*;

use std::fs;

fn entry(name: &str, size: u64) -> FileEntry {
    FileEntry::new(name, size)
}

fn sizes(plan: &GroupPlan) -> Vec<Vec<u64>> {
    plan.groups
        .iter()
        .map(|g| g.entries.iter().map(|e| e.size).collect())
        .collect()
}

#[test]
fn test_empty_input_produces_empty_plan() {
    let plan = group_files(vec![], 100);
    assert!(plan.groups.is_empty());
    assert!(plan.skipped.is_empty());
}

#[test]
fn test_small_files_merge_into_one_group() {
    let plan = group_files(vec![entry("a", 5), entry("b", 5), entry("c", 5)], 100);
    assert_eq!(sizes(&plan), vec![vec![5, 5, 5]]);
}

#[test]
fn test_groups_stay_strictly_under_limit() {
    let plan = group_files(
        vec![
            entry("a", 10),
            entry("b", 10),
            entry("c", 5),
            entry("d", 10),
            entry("e", 29),
        ],
        30,
    );
    for group in &plan.groups {
        assert!(group.total_size() < 30, "group reached the limit");
        assert!(!group.is_empty(), "empty group emitted");
    }
}

#[test]
fn test_exact_fit_counts_as_not_fitting() {
    // 10 + 20 == 30: the second file must not join the first group.
    let plan = group_files(vec![entry("a", 10), entry("b", 20)], 30);
    assert_eq!(sizes(&plan), vec![vec![10], vec![20]]);
    assert!(plan.skipped.is_empty());
}

#[test]
fn test_trigger_file_seeds_next_group() {
    // The file that closes a group is re-attempted against the fresh one
    // instead of being dropped.
    let plan = group_files(vec![entry("a", 10), entry("b", 20), entry("c", 15)], 30);
    assert_eq!(sizes(&plan), vec![vec![10], vec![20], vec![15]]);
    assert!(plan.skipped.is_empty());
}

#[test]
fn test_oversized_file_is_skipped_with_no_groups() {
    let plan = group_files(vec![entry("big", 50)], 30);
    assert!(plan.groups.is_empty());
    assert_eq!(plan.skipped, vec![entry("big", 50)]);
}

#[test]
fn test_oversized_file_mid_list_never_appears_in_a_group() {
    let plan = group_files(vec![entry("a", 5), entry("big", 50), entry("b", 5)], 30);
    assert_eq!(plan.skipped, vec![entry("big", 50)]);
    for group in &plan.groups {
        assert!(group.entries.iter().all(|e| e.size < 30));
    }
}

#[test]
fn test_file_exactly_at_limit_is_skipped() {
    let plan = group_files(vec![entry("edge", 30)], 30);
    assert!(plan.groups.is_empty());
    assert_eq!(plan.skipped.len(), 1);
}

#[test]
fn test_concatenation_preserves_input_order_minus_skipped() {
    let input = vec![
        entry("a", 12),
        entry("b", 40),
        entry("c", 7),
        entry("d", 25),
        entry("e", 1),
    ];
    let plan = group_files(input.clone(), 30);

    let grouped: Vec<FileEntry> = plan
        .groups
        .iter()
        .flat_map(|g| g.entries.iter().cloned())
        .collect();
    let expected: Vec<FileEntry> = input.into_iter().filter(|e| e.size < 30).collect();
    assert_eq!(grouped, expected);
}

#[test]
fn test_grouping_is_deterministic() {
    let input = vec![entry("a", 3), entry("b", 28), entry("c", 14), entry("d", 99)];
    let first = group_files(input.clone(), 30);
    let second = group_files(input, 30);
    assert_eq!(first, second);
}

#[test]
fn test_zero_max_size_skips_everything() {
    let plan = group_files(vec![entry("a", 1), entry("b", 2)], 0);
    assert!(plan.groups.is_empty());
    assert_eq!(plan.skipped.len(), 2);
}

#[test]
fn test_greedy_fill_then_new_group() {
    let plan = group_files(
        vec![entry("a", 10), entry("b", 10), entry("c", 5), entry("d", 10)],
        30,
    );
    // 10 + 10 + 5 = 25 < 30; adding 10 would exceed, so "d" seeds group 2.
    assert_eq!(sizes(&plan), vec![vec![10, 10, 5], vec![10]]);
}

#[test]
fn test_file_count_excludes_skipped() {
    let plan = group_files(vec![entry("a", 5), entry("big", 60), entry("b", 5)], 30);
    assert_eq!(plan.file_count(), 2);
}

#[test]
fn test_file_name_strips_directory() {
    let e = FileEntry::new("/data/backups/photo.jpg", 10);
    assert_eq!(e.file_name(), "photo.jpg");
}

#[test]
fn test_scan_lists_only_immediate_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.txt"), b"12345").unwrap();
    fs::write(dir.path().join("a.txt"), b"123").unwrap();
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("deep.txt"), b"ignored").unwrap();

    let entries = scan_directory(dir.path()).unwrap();
    let names: Vec<String> = entries.iter().map(|e| e.file_name()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(entries[0].size, 3);
    assert_eq!(entries[1].size, 5);
}

#[test]
fn test_scan_rejects_non_directory() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let err = scan_directory(file.path()).unwrap_err();
    assert!(matches!(err, ScanError::NotADirectory(_)));
}

use log::warn;

use super::{FileEntry, Group, GroupPlan};

/// Partition `entries` into groups whose total size stays strictly below
/// `max_size`, in a single left-to-right pass with no reordering or
/// backtracking.
///
/// A file whose addition would reach or exceed `max_size` closes the
/// current group and is re-attempted against the fresh one: it is placed
/// if it fits alone, otherwise skipped with a warning (a file of
/// `max_size` or more can never be sent). An exact fit counts as not
/// fitting, so every emitted group's total is `< max_size`.
///
/// `max_size == 0` is not special-cased: every file is oversized and ends
/// up skipped.
pub fn group_files(entries: Vec<FileEntry>, max_size: u64) -> GroupPlan {
    let mut plan = GroupPlan::default();
    let mut current = Group::default();
    let mut current_size: u64 = 0;

    for entry in entries {
        if current_size.saturating_add(entry.size) < max_size {
            current_size += entry.size;
            current.entries.push(entry);
            continue;
        }

        if !current.is_empty() {
            plan.groups.push(std::mem::take(&mut current));
            current_size = 0;
        }

        if entry.size < max_size {
            current_size = entry.size;
            current.entries.push(entry);
        } else {
            warn!(
                "skipping '{}': its size ({} bytes) reaches the {} byte limit",
                entry.path.display(),
                entry.size,
                max_size
            );
            plan.skipped.push(entry);
        }
    }

    if !current.is_empty() {
        plan.groups.push(current);
    }

    plan
}

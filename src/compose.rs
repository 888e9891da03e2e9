//! Batch name composition.
//!
//! Turns a prefix and a reserved sequence block into final names, and
//! double-checks the whole batch against both registries before anything is
//! persisted. The check is deliberately redundant with the allocator's scan:
//! it is the last line against stale state, and it enforces the
//! cross-registry uniqueness invariant for the exact composed strings.

use crate::error::{AllocError, AllocResult};
use crate::prefix::Prefix;
use crate::registry::Store;
use crate::sequence::SequenceFamily;

/// Compose `count` consecutive names under `prefix`, reserving their
/// numbers in `family`.
pub fn compose_block(prefix: &Prefix, count: u32, family: &mut SequenceFamily) -> Vec<String> {
	let start = family.reserve_block(count);
	(start..start + count).map(|n| prefix.render(n)).collect()
}

/// Reject the batch if any composed name already exists, case-insensitively,
/// in either registry. Returns [`AllocError::Duplicate`] naming every
/// offender; on error nothing may be committed.
pub fn check_collisions(names: &[&str], store: &Store) -> AllocResult<()> {
	let mut clashes = Vec::new();
	for name in names {
		if store.contains(name)? {
			clashes.push(name.to_string());
		}
	}
	if clashes.is_empty() {
		Ok(())
	} else {
		Err(AllocError::Duplicate { names: clashes })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::registry::{timestamp_now, HostnameRow};
	use pretty_assertions::assert_eq;
	use std::time::Duration;
	use tempfile::tempdir;

	fn prefix() -> Prefix {
		Prefix {
			text: "l-vny01dqqaaaa".to_string(),
			width: 4,
		}
	}

	#[test]
	fn test_compose_block_from_empty_family() {
		let mut family = SequenceFamily::new("l-vny01dqqaaaa");
		let names = compose_block(&prefix(), 3, &mut family);
		assert_eq!(
			names,
			vec![
				"l-vny01dqqaaaa0001",
				"l-vny01dqqaaaa0002",
				"l-vny01dqqaaaa0003",
			]
		);
	}

	#[test]
	fn test_compose_block_gap_fills() {
		let mut family = SequenceFamily::new("l-vny01dqqaaaa");
		family.observe("l-vny01dqqaaaa0001");
		family.observe("l-vny01dqqaaaa0042");
		let names = compose_block(&prefix(), 1, &mut family);
		assert_eq!(names, vec!["l-vny01dqqaaaa0002"]);
	}

	#[test]
	fn test_compose_blocks_never_repeat_within_a_batch() {
		let mut family = SequenceFamily::new("l-vny01dqqaaaa");
		let first = compose_block(&prefix(), 2, &mut family);
		let second = compose_block(&prefix(), 2, &mut family);
		for name in &second {
			assert!(!first.contains(name));
		}
	}

	#[test]
	fn test_check_collisions_rejects_differently_cased_duplicates() {
		let temp = tempdir().unwrap();
		let store = Store::open(temp.path(), Duration::from_secs(1));
		store.ensure_files().unwrap();
		store
			.add_hostname(HostnameRow {
				name: "L-VNY01DQQAAAA0001".to_string(),
				datacenter: "NYC".to_string(),
				cluster_name: String::new(),
				created_at: timestamp_now(),
			})
			.unwrap();

		let err =
			check_collisions(&["l-vny01dqqaaaa0001", "l-vny01dqqaaaa0002"], &store).unwrap_err();
		match err {
			AllocError::Duplicate { names } => {
				assert_eq!(names, vec!["l-vny01dqqaaaa0001"])
			}
			other => panic!("expected Duplicate, got {other:?}"),
		}
	}

	#[test]
	fn test_check_collisions_passes_fresh_names() {
		let temp = tempdir().unwrap();
		let store = Store::open(temp.path(), Duration::from_secs(1));
		store.ensure_files().unwrap();
		assert!(check_collisions(&["l-vny01dqqaaaa0001"], &store).is_ok());
	}
}

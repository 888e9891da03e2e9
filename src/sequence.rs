//! Sequence number allocation with gap filling.
//!
//! Existing names are grouped into families by stripping their trailing
//! digit run; the allocator hands out the lowest number (or lowest
//! consecutive block) not used anywhere in the family. Family matching is
//! case-insensitive and independent of the digit width a name was written
//! with, so `foo01` and `foo0042` belong to the same family.

use std::collections::BTreeSet;

/// Split a name into its family stem and trailing sequence number.
///
/// The stem is everything before the final maximal run of ASCII digits.
/// Names without trailing digits (or with a digit run too large for `u32`)
/// have no sequence number.
pub fn split_family(name: &str) -> (&str, Option<u32>) {
	let stem_len = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
	let (stem, digits) = name.split_at(stem_len);
	if digits.is_empty() {
		return (name, None);
	}
	(stem, digits.parse::<u32>().ok())
}

/// The set of sequence numbers in use under one prefix.
///
/// Tentatively reserved numbers live in the same set, so one batch can
/// reserve several numbers without re-scanning the registries and without
/// ever issuing a duplicate.
#[derive(Debug, Clone)]
pub struct SequenceFamily {
	prefix: String,
	used: BTreeSet<u32>,
}

impl SequenceFamily {
	/// Create an empty family for `prefix`.
	pub fn new(prefix: &str) -> Self {
		Self {
			prefix: prefix.to_string(),
			used: BTreeSet::new(),
		}
	}

	/// Record `name` if it belongs to this family.
	///
	/// A name belongs when its stem equals the prefix case-insensitively and
	/// it carries a trailing digit run.
	pub fn observe(&mut self, name: &str) {
		let (stem, number) = split_family(name);
		if let Some(n) = number {
			if stem.eq_ignore_ascii_case(&self.prefix) {
				self.used.insert(n);
			}
		}
	}

	/// Record every matching name from `names`.
	pub fn observe_all<I, S>(&mut self, names: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for name in names {
			self.observe(name.as_ref());
		}
	}

	/// Numbers currently used (or reserved), ascending.
	pub fn used(&self) -> impl Iterator<Item = u32> + '_ {
		self.used.iter().copied()
	}

	/// The lowest available sequence number, gap-filling.
	///
	/// Empty family → 1. Smallest used number above 1 → 1. Otherwise the
	/// first gap between adjacent used numbers, or max + 1 when there is
	/// none.
	pub fn next_sequence(&self) -> u32 {
		self.first_free_block(1)
	}

	/// Reserve `count` consecutive numbers, returning the first.
	///
	/// The block is the lowest start whose entire run is free, so a batch
	/// never overlaps an existing number. Reserved numbers stay in the used
	/// set for the lifetime of this value.
	pub fn reserve_block(&mut self, count: u32) -> u32 {
		let start = self.first_free_block(count);
		for n in start..start + count {
			self.used.insert(n);
		}
		start
	}

	/// Lowest start such that `start..start + count` contains no used
	/// number.
	fn first_free_block(&self, count: u32) -> u32 {
		debug_assert!(count >= 1);
		let mut start: u32 = 1;
		loop {
			match self.used.range(start..start + count).next() {
				None => return start,
				Some(&conflict) => start = conflict + 1,
			}
		}
	}
}

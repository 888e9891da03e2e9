//! Prefix builders for the naming conventions.
//!
//! Pure functions from validated answers to a deterministic prefix plus the
//! zero-padding width of its sequence suffix. Three conventions exist: DMZ
//! hostnames (3 digits), non-DMZ hostnames (4 digits) and cluster names
//! (2 digits).

use crate::answers::ValidatedAnswers;

/// Suffix width of the DMZ hostname convention.
pub const DMZ_WIDTH: usize = 3;
/// Suffix width of the non-DMZ hostname convention.
pub const STANDARD_WIDTH: usize = 4;
/// Suffix width of the cluster name convention.
pub const CLUSTER_WIDTH: usize = 2;

/// A naming prefix and the fixed digit width of names issued under it.
///
/// Every issued name is `text` followed by exactly `width` digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
	pub text: String,
	pub width: usize,
}

impl Prefix {
	/// Render `number` under this prefix, zero-padded to the convention
	/// width. Numbers wider than the convention keep all their digits.
	pub fn render(&self, number: u32) -> String {
		format!("{}{:0width$}", self.text, number, width = self.width)
	}
}

/// Build the hostname prefix for a validated answer set.
///
/// DMZ hosts: `v<site>u111swea`, width 3. Other hosts:
/// `l-v<site><hw><cloud[..3]><zone_type[..3]>`, width 4, where the hardware
/// letter is `d` for Dell, `h` for HP and `x` when unknown.
pub fn hostname_prefix(answers: &ValidatedAnswers) -> Prefix {
	if answers.is_dmz {
		Prefix {
			text: format!("v{}u111swea", answers.site_code.to_lowercase()),
			width: DMZ_WIDTH,
		}
	} else {
		let hardware = answers.hardware_type.map(|h| h.code()).unwrap_or('x');
		Prefix {
			text: format!(
				"l-v{}{}{}{}",
				answers.site_code.to_lowercase(),
				hardware,
				truncate(&answers.cloud_code.to_lowercase(), 3),
				truncate(&answers.zone_type.to_lowercase(), 3),
			),
			width: STANDARD_WIDTH,
		}
	}
}

/// Build the cluster name prefix, or `None` when the request joins an
/// existing cluster.
///
/// Format: `CLS-<cloud>-<zone_type>-<arch>-<zone>-<site>-<purpose>`, width 2.
/// The purpose code is `HA` for DMZ clusters and `PR` otherwise.
pub fn cluster_prefix(answers: &ValidatedAnswers) -> Option<Prefix> {
	let cluster = answers.new_cluster.as_ref()?;
	let purpose = if answers.is_dmz { "HA" } else { "PR" };
	Some(Prefix {
		text: format!(
			"CLS-{}-{}-{}-{}-{}-{}",
			answers.cloud_code,
			answers.zone_type,
			cluster.architecture.code(),
			cluster.zone.code(),
			answers.site_code,
			purpose,
		),
		width: CLUSTER_WIDTH,
	})
}

/// First `max` characters of `s` (the questionnaire already bounds these
/// fields, but the prefix must never exceed the convention length).
fn truncate(s: &str, max: usize) -> &str {
	match s.char_indices().nth(max) {
		Some((idx, _)) => &s[..idx],
		None => s,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::answers::{Architecture, HardwareType, NewCluster, ValidatedAnswers, Zone};
	use pretty_assertions::assert_eq;

	fn answers() -> ValidatedAnswers {
		ValidatedAnswers {
			is_dmz: false,
			hardware_type: Some(HardwareType::Dell),
			cloud_code: "QQA".to_string(),
			zone_type: "AAA".to_string(),
			datacenter: "NYC".to_string(),
			site_code: "NY01".to_string(),
			hostname_count: 1,
			new_cluster: Some(NewCluster {
				architecture: Architecture::Osa,
				zone: Zone::B,
			}),
		}
	}

	#[test]
	fn test_dmz_prefix() {
		let mut a = answers();
		a.is_dmz = true;
		a.hardware_type = None;
		let p = hostname_prefix(&a);
		assert_eq!(p.text, "vny01u111swea");
		assert_eq!(p.width, DMZ_WIDTH);
	}

	#[test]
	fn test_standard_prefix() {
		let p = hostname_prefix(&answers());
		assert_eq!(p.text, "l-vny01dqqaaaa");
		assert_eq!(p.width, STANDARD_WIDTH);
	}

	#[test]
	fn test_hp_hardware_letter() {
		let mut a = answers();
		a.hardware_type = Some(HardwareType::Hp);
		assert_eq!(hostname_prefix(&a).text, "l-vny01hqqaaaa");
	}

	#[test]
	fn test_missing_hardware_maps_to_x() {
		let mut a = answers();
		a.hardware_type = None;
		assert_eq!(hostname_prefix(&a).text, "l-vny01xqqaaaa");
	}

	#[test]
	fn test_long_codes_are_truncated() {
		let mut a = answers();
		a.cloud_code = "LONGCODE".to_string();
		a.zone_type = "ZZZ".to_string();
		assert_eq!(hostname_prefix(&a).text, "l-vny01dlonzzz");
	}

	#[test]
	fn test_cluster_prefix_new_cluster() {
		let p = cluster_prefix(&answers()).unwrap();
		assert_eq!(p.text, "CLS-QQA-AAA-OSA-B-NY01-PR");
		assert_eq!(p.width, CLUSTER_WIDTH);
	}

	#[test]
	fn test_cluster_prefix_dmz_purpose() {
		let mut a = answers();
		a.is_dmz = true;
		let p = cluster_prefix(&a).unwrap();
		assert!(p.text.ends_with("-HA"));
	}

	#[test]
	fn test_cluster_prefix_existing_cluster() {
		let mut a = answers();
		a.new_cluster = None;
		assert!(cluster_prefix(&a).is_none());
	}

	#[test]
	fn test_prefix_is_deterministic() {
		assert_eq!(hostname_prefix(&answers()), hostname_prefix(&answers()));
	}

	#[test]
	fn test_render_pads_to_width() {
		let p = hostname_prefix(&answers());
		assert_eq!(p.render(7), "l-vny01dqqaaaa0007");
		assert_eq!(p.render(12345), "l-vny01dqqaaaa12345");
	}
}

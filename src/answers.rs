//! Questionnaire answers and their validation rules.
//!
//! The allocator only accepts a fully validated answer set; every categorical
//! field is checked against its domain and the conditional requirements
//! (architecture/zone for new clusters, hardware type for non-DMZ hosts)
//! before any prefix is built.

use crate::datacenters::DatacenterTable;
use crate::error::{AllocError, AllocResult};
use clap::ValueEnum;

/// Maximum hostnames allocatable in one request.
pub const MAX_HOSTNAME_COUNT: u32 = 100;

/// Physical hardware vendor of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HardwareType {
	Dell,
	Hp,
}

impl HardwareType {
	/// Single-letter code used in non-DMZ hostname prefixes.
	pub fn code(&self) -> char {
		match self {
			HardwareType::Dell => 'd',
			HardwareType::Hp => 'h',
		}
	}
}

/// Service architecture of a new cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Architecture {
	Osa,
	Esa,
}

impl Architecture {
	pub fn code(&self) -> &'static str {
		match self {
			Architecture::Osa => "OSA",
			Architecture::Esa => "ESA",
		}
	}
}

/// Availability zone letter of a new cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Zone {
	A,
	B,
	C,
	D,
	E,
}

impl Zone {
	pub fn code(&self) -> &'static str {
		match self {
			Zone::A => "A",
			Zone::B => "B",
			Zone::C => "C",
			Zone::D => "D",
			Zone::E => "E",
		}
	}
}

/// Raw questionnaire answers, as collected from the caller.
///
/// `cloud_code` may be the literal `"custom"`, in which case
/// `custom_cloud_code` supplies the real value (mirroring the questionnaire's
/// free-text escape hatch).
#[derive(Debug, Clone)]
pub struct Answers {
	pub existing_cluster: bool,
	pub service_architecture: Option<Architecture>,
	pub zone: Option<Zone>,
	pub hostname_count: u32,
	pub datacenter: String,
	pub is_dmz: bool,
	pub hardware_type: Option<HardwareType>,
	pub cloud_code: String,
	pub custom_cloud_code: Option<String>,
	pub zone_type: String,
}

/// Architecture/zone pair, present only when a new cluster name is needed.
#[derive(Debug, Clone, Copy)]
pub struct NewCluster {
	pub architecture: Architecture,
	pub zone: Zone,
}

/// Answers that passed validation, with the datacenter resolved to its site
/// code and the custom cloud code folded in.
///
/// `hardware_type` is `Some` only for non-DMZ hosts; `new_cluster` is `Some`
/// only when the request creates a cluster.
#[derive(Debug, Clone)]
pub struct ValidatedAnswers {
	pub is_dmz: bool,
	pub hardware_type: Option<HardwareType>,
	pub cloud_code: String,
	pub zone_type: String,
	pub datacenter: String,
	pub site_code: String,
	pub hostname_count: u32,
	pub new_cluster: Option<NewCluster>,
}

impl Answers {
	/// Validate the answer set against the questionnaire rules and resolve
	/// the datacenter through the reference table.
	pub fn validate(&self, datacenters: &DatacenterTable) -> AllocResult<ValidatedAnswers> {
		if self.hostname_count < 1 || self.hostname_count > MAX_HOSTNAME_COUNT {
			return Err(AllocError::Validation(format!(
				"hostname count must be between 1 and {}, got {}",
				MAX_HOSTNAME_COUNT, self.hostname_count
			)));
		}

		let new_cluster = if self.existing_cluster {
			None
		} else {
			let architecture = self.service_architecture.ok_or_else(|| {
				AllocError::Validation(
					"service architecture is required when creating a new cluster".to_string(),
				)
			})?;
			let zone = self.zone.ok_or_else(|| {
				AllocError::Validation("zone is required when creating a new cluster".to_string())
			})?;
			Some(NewCluster { architecture, zone })
		};

		let hardware_type = if self.is_dmz {
			// Hardware type is irrelevant in the DMZ convention.
			None
		} else {
			Some(self.hardware_type.ok_or_else(|| {
				AllocError::Validation("hardware type is required for non-DMZ hosts".to_string())
			})?)
		};

		let cloud_code = if self.cloud_code.eq_ignore_ascii_case("custom") {
			match self.custom_cloud_code.as_deref().map(str::trim) {
				Some(code) if !code.is_empty() => code.to_string(),
				_ => {
					return Err(AllocError::Validation(
						"a custom cloud code was selected but none was given".to_string(),
					))
				}
			}
		} else {
			self.cloud_code.trim().to_string()
		};
		if cloud_code.is_empty() {
			return Err(AllocError::Validation("cloud code must not be empty".to_string()));
		}
		if cloud_code.len() > 10 {
			return Err(AllocError::Validation(format!(
				"cloud code '{}' is longer than 10 characters",
				cloud_code
			)));
		}

		let zone_type = self.zone_type.trim().to_string();
		if zone_type.is_empty() || zone_type.len() > 3 {
			return Err(AllocError::Validation(format!(
				"zone type must be 1-3 characters, got '{}'",
				self.zone_type
			)));
		}
		// The zone type ends the hostname prefix; a trailing digit would
		// blur into the sequence number and split the name family.
		if zone_type.ends_with(|c: char| c.is_ascii_digit()) {
			return Err(AllocError::Validation(format!(
				"zone type must not end in a digit, got '{}'",
				zone_type
			)));
		}

		let site_code = datacenters
			.site_code(&self.datacenter)
			.ok_or_else(|| {
				AllocError::Validation(format!("unknown datacenter '{}'", self.datacenter))
			})?
			.to_string();

		Ok(ValidatedAnswers {
			is_dmz: self.is_dmz,
			hardware_type,
			cloud_code,
			zone_type,
			datacenter: self.datacenter.clone(),
			site_code,
			hostname_count: self.hostname_count,
			new_cluster,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base_answers() -> Answers {
		Answers {
			existing_cluster: false,
			service_architecture: Some(Architecture::Osa),
			zone: Some(Zone::A),
			hostname_count: 2,
			datacenter: "NYC".to_string(),
			is_dmz: false,
			hardware_type: Some(HardwareType::Dell),
			cloud_code: "QQA".to_string(),
			custom_cloud_code: None,
			zone_type: "AAA".to_string(),
		}
	}

	#[test]
	fn test_valid_answers_resolve_site_code() {
		let v = base_answers().validate(&DatacenterTable::builtin()).unwrap();
		assert_eq!(v.site_code, "NY01");
		assert_eq!(v.cloud_code, "QQA");
		assert!(v.new_cluster.is_some());
	}

	#[test]
	fn test_count_out_of_range() {
		let mut a = base_answers();
		a.hostname_count = 0;
		assert!(a.validate(&DatacenterTable::builtin()).is_err());
		a.hostname_count = 101;
		assert!(a.validate(&DatacenterTable::builtin()).is_err());
	}

	#[test]
	fn test_new_cluster_requires_architecture_and_zone() {
		let mut a = base_answers();
		a.service_architecture = None;
		assert!(a.validate(&DatacenterTable::builtin()).is_err());

		let mut a = base_answers();
		a.zone = None;
		assert!(a.validate(&DatacenterTable::builtin()).is_err());

		// Existing cluster: neither is required.
		let mut a = base_answers();
		a.existing_cluster = true;
		a.service_architecture = None;
		a.zone = None;
		let v = a.validate(&DatacenterTable::builtin()).unwrap();
		assert!(v.new_cluster.is_none());
	}

	#[test]
	fn test_non_dmz_requires_hardware() {
		let mut a = base_answers();
		a.hardware_type = None;
		assert!(a.validate(&DatacenterTable::builtin()).is_err());

		// DMZ hosts never need a hardware type.
		a.is_dmz = true;
		let v = a.validate(&DatacenterTable::builtin()).unwrap();
		assert!(v.hardware_type.is_none());
	}

	#[test]
	fn test_custom_cloud_code_resolution() {
		let mut a = base_answers();
		a.cloud_code = "custom".to_string();
		assert!(a.validate(&DatacenterTable::builtin()).is_err());

		a.custom_cloud_code = Some("zz9".to_string());
		let v = a.validate(&DatacenterTable::builtin()).unwrap();
		assert_eq!(v.cloud_code, "zz9");
	}

	#[test]
	fn test_zone_type_length() {
		let mut a = base_answers();
		a.zone_type = "AAAA".to_string();
		assert!(a.validate(&DatacenterTable::builtin()).is_err());
		a.zone_type = String::new();
		assert!(a.validate(&DatacenterTable::builtin()).is_err());
	}

	#[test]
	fn test_zone_type_must_not_end_in_digit() {
		let mut a = base_answers();
		a.zone_type = "zz1".to_string();
		let err = a.validate(&DatacenterTable::builtin()).unwrap_err();
		assert!(err.to_string().contains("zz1"));

		// Digits elsewhere are fine.
		a.zone_type = "z1z".to_string();
		assert!(a.validate(&DatacenterTable::builtin()).is_ok());
	}

	#[test]
	fn test_unknown_datacenter() {
		let mut a = base_answers();
		a.datacenter = "ATLANTIS".to_string();
		let err = a.validate(&DatacenterTable::builtin()).unwrap_err();
		assert!(err.to_string().contains("ATLANTIS"));
	}
}

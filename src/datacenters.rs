//! Datacenter reference table.
//!
//! Maps human-readable datacenter names to site codes. Loaded read-only from
//! a CSV file (`datacenter,site_code`, header mandatory), with a built-in
//! seed table used when no file exists yet.

use crate::error::AllocResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One row of the reference table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datacenter {
	pub datacenter: String,
	pub site_code: String,
}

/// Read-only datacenter → site-code lookup table.
#[derive(Debug, Clone)]
pub struct DatacenterTable {
	rows: Vec<Datacenter>,
}

/// Seed rows used when no reference file is available.
const SEED: &[(&str, &str)] = &[
	("NYC", "NY01"),
	("SFO", "SF01"),
	("CHI", "CH01"),
	("DAL", "DL01"),
	("MIA", "MI01"),
	("LON", "LO01"),
	("PAR", "PA01"),
	("SYD", "SY01"),
	("TOK", "TK01"),
];

impl DatacenterTable {
	/// Load the table from a CSV file with a `datacenter,site_code` header.
	pub fn load(path: &Path) -> AllocResult<Self> {
		let mut reader = csv::Reader::from_path(path)?;
		let mut rows = Vec::new();
		for row in reader.deserialize() {
			rows.push(row?);
		}
		Ok(Self { rows })
	}

	/// Load from `path`, falling back to the built-in seed table when the
	/// file does not exist.
	pub fn load_or_builtin(path: &Path) -> AllocResult<Self> {
		if path.exists() {
			Self::load(path)
		} else {
			debug!(path = %path.display(), "no datacenter file, using built-in table");
			Ok(Self::builtin())
		}
	}

	/// The built-in seed table.
	pub fn builtin() -> Self {
		Self {
			rows: SEED
				.iter()
				.map(|(datacenter, site_code)| Datacenter {
					datacenter: datacenter.to_string(),
					site_code: site_code.to_string(),
				})
				.collect(),
		}
	}

	/// Write the built-in seed table to `path` (header included).
	pub fn write_seed(path: &Path) -> AllocResult<()> {
		let mut writer = csv::Writer::from_path(path)?;
		for row in Self::builtin().rows {
			writer.serialize(row)?;
		}
		writer.flush().map_err(csv::Error::from)?;
		Ok(())
	}

	/// Resolve a datacenter name to its site code. Name comparison is
	/// case-insensitive.
	pub fn site_code(&self, datacenter: &str) -> Option<&str> {
		self.rows
			.iter()
			.find(|row| row.datacenter.eq_ignore_ascii_case(datacenter))
			.map(|row| row.site_code.as_str())
	}

	/// All known datacenters, in table order.
	pub fn iter(&self) -> impl Iterator<Item = &Datacenter> {
		self.rows.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::fs;
	use tempfile::tempdir;

	#[test]
	fn test_builtin_lookup() {
		let table = DatacenterTable::builtin();
		assert_eq!(table.site_code("NYC"), Some("NY01"));
		assert_eq!(table.site_code("nyc"), Some("NY01"));
		assert_eq!(table.site_code("NOWHERE"), None);
	}

	#[test]
	fn test_load_from_csv() {
		let temp = tempdir().unwrap();
		let path = temp.path().join("datacenters.csv");
		fs::write(&path, "datacenter,site_code\nBER,BE01\nOSL,OS01\n").unwrap();

		let table = DatacenterTable::load(&path).unwrap();
		assert_eq!(table.site_code("BER"), Some("BE01"));
		assert_eq!(table.site_code("osl"), Some("OS01"));
		assert_eq!(table.iter().count(), 2);
	}

	#[test]
	fn test_load_or_builtin_falls_back() {
		let temp = tempdir().unwrap();
		let table = DatacenterTable::load_or_builtin(&temp.path().join("missing.csv")).unwrap();
		assert_eq!(table.site_code("CHI"), Some("CH01"));
	}

	#[test]
	fn test_write_seed_round_trips() {
		let temp = tempdir().unwrap();
		let path = temp.path().join("datacenters.csv");
		DatacenterTable::write_seed(&path).unwrap();

		let content = fs::read_to_string(&path).unwrap();
		assert!(content.starts_with("datacenter,site_code\n"));

		let table = DatacenterTable::load(&path).unwrap();
		assert_eq!(table.site_code("TOK"), Some("TK01"));
	}
}

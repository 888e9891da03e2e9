//! Hostname Sequence Allocator Library
//!
//! Allocates unique, policy-compliant ESXi hostnames and cluster names from
//! categorical questionnaire answers. A deterministic prefix is derived from
//! the answers, the lowest available sequence number under that prefix is
//! found by scanning both name registries (gap-filling, case-insensitive,
//! width-independent), and the composed names are committed atomically under
//! an exclusive registry lock.

pub mod answers;
pub mod compose;
pub mod datacenters;
pub mod error;
pub mod prefix;
pub mod registry;
pub mod sequence;

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub use answers::{Answers, Architecture, HardwareType, ValidatedAnswers, Zone};
pub use datacenters::DatacenterTable;
pub use error::{AllocError, AllocResult};
pub use prefix::Prefix;
pub use registry::{ClusterRow, HostnameRow, Store};
pub use sequence::SequenceFamily;

use registry::timestamp_now;

/// Configuration for the allocator.
#[derive(Debug, Clone)]
pub struct Config {
	/// Directory holding the registry tables and the datacenter file.
	pub data_dir: PathBuf,
	/// How long to wait for the registry lock before failing as busy.
	pub lock_timeout: Duration,
	/// Compute and return names without persisting anything.
	pub dry_run: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("data"),
			lock_timeout: Duration::from_secs(5),
			dry_run: false,
		}
	}
}

/// Names issued by one allocation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
	pub hostnames: Vec<String>,
	/// The freshly created cluster name, when the request was not for an
	/// existing cluster.
	pub cluster_name: Option<String>,
}

/// Main allocation engine: owns the registry pair and the datacenter table.
pub struct Allocator {
	config: Config,
	store: Store,
	datacenters: DatacenterTable,
}

impl Allocator {
	/// Open an allocator over `config.data_dir`, creating the registry
	/// tables if needed and loading the datacenter reference file (or its
	/// built-in fallback).
	pub fn new(config: Config) -> AllocResult<Self> {
		let store = Store::open(&config.data_dir, config.lock_timeout);
		store.ensure_files()?;
		let datacenters =
			DatacenterTable::load_or_builtin(&config.data_dir.join("datacenters.csv"))?;
		Ok(Self {
			config,
			store,
			datacenters,
		})
	}

	pub fn store(&self) -> &Store {
		&self.store
	}

	pub fn datacenters(&self) -> &DatacenterTable {
		&self.datacenters
	}

	/// Run one allocation: validate answers, derive prefixes, pick sequence
	/// numbers, double-check for collisions and persist.
	///
	/// The registry lock is held from the registry scan through the final
	/// append, so concurrent callers can never be issued the same number.
	pub fn allocate(&self, answers: &Answers) -> AllocResult<Allocation> {
		let validated = answers.validate(&self.datacenters)?;
		let host_prefix = prefix::hostname_prefix(&validated);
		let cluster_prefix = prefix::cluster_prefix(&validated);
		debug!(prefix = %host_prefix.text, count = validated.hostname_count, "allocating");

		let _lock = self.store.lock()?;
		let existing = self.store.all_names()?;

		let mut host_family = SequenceFamily::new(&host_prefix.text);
		host_family.observe_all(existing.iter());
		let hostnames =
			compose::compose_block(&host_prefix, validated.hostname_count, &mut host_family);

		let cluster_name = cluster_prefix.map(|p| {
			let mut family = SequenceFamily::new(&p.text);
			family.observe_all(existing.iter());
			p.render(family.reserve_block(1))
		});

		let mut all_names: Vec<&str> = hostnames.iter().map(String::as_str).collect();
		if let Some(ref name) = cluster_name {
			all_names.push(name);
		}
		compose::check_collisions(&all_names, &self.store)?;

		if self.config.dry_run {
			info!(count = hostnames.len(), "dry run, nothing persisted");
			return Ok(Allocation {
				hostnames,
				cluster_name,
			});
		}

		self.persist(&validated, &hostnames, cluster_name.as_deref())?;
		info!(
			count = hostnames.len(),
			cluster = cluster_name.as_deref().unwrap_or("-"),
			"allocation committed"
		);
		Ok(Allocation {
			hostnames,
			cluster_name,
		})
	}

	/// Append the batch to the registries, reporting exactly which names
	/// reached disk when a write fails partway.
	fn persist(
		&self,
		validated: &ValidatedAnswers,
		hostnames: &[String],
		cluster_name: Option<&str>,
	) -> AllocResult<()> {
		let created_at = timestamp_now();
		let rows: Vec<HostnameRow> = hostnames
			.iter()
			.map(|name| HostnameRow {
				name: name.clone(),
				datacenter: validated.datacenter.clone(),
				cluster_name: cluster_name.unwrap_or_default().to_string(),
				created_at: created_at.clone(),
			})
			.collect();

		if let Err(failure) = self.store.hostnames.append_rows(&rows) {
			let mut missing: Vec<String> = hostnames[failure.committed..].to_vec();
			missing.extend(cluster_name.map(str::to_string));
			return Err(AllocError::Persistence {
				committed: hostnames[..failure.committed].to_vec(),
				missing,
				source: failure.error,
			});
		}

		if let Some(name) = cluster_name {
			let row = ClusterRow {
				name: name.to_string(),
				created_at,
			};
			if let Err(failure) = self.store.clusters.append_rows(std::slice::from_ref(&row)) {
				return Err(AllocError::Persistence {
					committed: hostnames.to_vec(),
					missing: vec![name.to_string()],
					source: failure.error,
				});
			}
		}

		Ok(())
	}
}

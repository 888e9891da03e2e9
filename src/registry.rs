//! CSV-backed name registries.
//!
//! Two append-only tables hold every name ever issued: `hostnames.csv`
//! (name, datacenter, cluster_name, created_at) and `cluster_names.csv`
//! (name, created_at). Column order is fixed, the header row is mandatory
//! and name lookups are case-insensitive. A single advisory file lock
//! guards the read + duplicate-check + append critical section for both
//! tables, so two concurrent allocations cannot pick the same number.
//! Reads taken outside the lock may be stale.

use crate::error::{AllocError, AllocResult};
use chrono::Utc;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Poll interval while waiting for the registry lock.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Registry timestamp in the table's `%Y-%m-%d %H:%M:%S` format.
pub fn timestamp_now() -> String {
	Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// A row type persisted in a registry table.
pub trait RegistryRow: Serialize + DeserializeOwned {
	/// Column names, in the order they appear on disk.
	fn headers() -> &'static [&'static str];
	/// The unique name column.
	fn name(&self) -> &str;
}

/// One issued hostname.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostnameRow {
	pub name: String,
	pub datacenter: String,
	pub cluster_name: String,
	pub created_at: String,
}

impl RegistryRow for HostnameRow {
	fn headers() -> &'static [&'static str] {
		&["name", "datacenter", "cluster_name", "created_at"]
	}

	fn name(&self) -> &str {
		&self.name
	}
}

/// One issued cluster name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRow {
	pub name: String,
	pub created_at: String,
}

impl RegistryRow for ClusterRow {
	fn headers() -> &'static [&'static str] {
		&["name", "created_at"]
	}

	fn name(&self) -> &str {
		&self.name
	}
}

/// An append failure partway through a batch: `committed` rows were
/// persisted before `error` occurred.
#[derive(Debug)]
pub struct AppendFailure {
	pub committed: usize,
	pub error: csv::Error,
}

/// Held exclusive lock over the registry pair.
///
/// Advisory `flock`-style lock on a dedicated lock file; released on drop.
#[derive(Debug)]
pub struct RegistryLock {
	file: File,
}

impl RegistryLock {
	/// Acquire the lock at `path`, retrying until `timeout` elapses.
	pub fn acquire(path: &Path, timeout: Duration) -> AllocResult<Self> {
		let file = OpenOptions::new().create(true).write(true).open(path)?;
		let started = Instant::now();
		loop {
			match file.try_lock_exclusive() {
				Ok(()) => {
					trace!(path = %path.display(), "registry lock acquired");
					return Ok(Self { file });
				}
				Err(err) if err.kind() == ErrorKind::WouldBlock => {
					if started.elapsed() >= timeout {
						return Err(AllocError::Busy {
							waited: started.elapsed(),
						});
					}
					thread::sleep(LOCK_RETRY_INTERVAL);
				}
				Err(err) => return Err(err.into()),
			}
		}
	}
}

impl Drop for RegistryLock {
	fn drop(&mut self) {
		let _ = self.file.unlock();
	}
}

/// One append-only CSV table of issued names.
#[derive(Debug, Clone)]
pub struct Registry<R> {
	path: PathBuf,
	_row: PhantomData<R>,
}

/// Lazy, insertion-ordered stream of names from one table. Restart by
/// calling [`Registry::names`] again.
pub struct Names<R: RegistryRow> {
	inner: csv::DeserializeRecordsIntoIter<File, R>,
}

impl<R: RegistryRow> Iterator for Names<R> {
	type Item = AllocResult<String>;

	fn next(&mut self) -> Option<Self::Item> {
		let row: Result<R, csv::Error> = self.inner.next()?;
		Some(row.map(|r| r.name().to_string()).map_err(AllocError::from))
	}
}

impl<R: RegistryRow> Registry<R> {
	/// Open (without creating) the table at `path`.
	pub fn open(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			_row: PhantomData,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Create the table file with its header row if it does not exist yet.
	///
	/// Creation is atomic (`create_new`): a concurrent creator loses the
	/// race harmlessly and an existing table is never touched, so rows
	/// already committed under the lock cannot be truncated.
	pub fn ensure_exists(&self) -> AllocResult<()> {
		let file = match OpenOptions::new()
			.write(true)
			.create_new(true)
			.open(&self.path)
		{
			Ok(file) => file,
			Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(()),
			Err(err) => return Err(err.into()),
		};
		debug!(path = %self.path.display(), "creating registry table");
		let mut writer = csv::Writer::from_writer(file);
		writer.write_record(R::headers())?;
		writer.flush().map_err(csv::Error::from)?;
		Ok(())
	}

	/// Stream all names in insertion order.
	pub fn names(&self) -> AllocResult<Names<R>> {
		let reader = csv::Reader::from_path(&self.path)?;
		Ok(Names {
			inner: reader.into_deserialize(),
		})
	}

	/// Whether `name` exists in this table, compared case-insensitively.
	pub fn contains(&self, name: &str) -> AllocResult<bool> {
		for existing in self.names()? {
			if existing?.eq_ignore_ascii_case(name) {
				return Ok(true);
			}
		}
		Ok(false)
	}

	/// Append `rows`, flushing after each one so a failure reports exactly
	/// which rows reached disk. Callers must hold the registry lock.
	pub fn append_rows(&self, rows: &[R]) -> Result<(), AppendFailure> {
		let file = match OpenOptions::new().append(true).open(&self.path) {
			Ok(file) => file,
			Err(err) => {
				return Err(AppendFailure {
					committed: 0,
					error: err.into(),
				})
			}
		};
		let mut writer = csv::WriterBuilder::new()
			.has_headers(false)
			.from_writer(file);
		for (idx, row) in rows.iter().enumerate() {
			let written = writer
				.serialize(row)
				.and_then(|()| writer.flush().map_err(csv::Error::from));
			if let Err(error) = written {
				return Err(AppendFailure {
					committed: idx,
					error,
				});
			}
		}
		Ok(())
	}
}

/// The registry pair plus the lock that makes check-then-append atomic.
#[derive(Debug)]
pub struct Store {
	pub hostnames: Registry<HostnameRow>,
	pub clusters: Registry<ClusterRow>,
	lock_path: PathBuf,
	lock_timeout: Duration,
}

impl Store {
	/// Open the store rooted at `data_dir`.
	pub fn open(data_dir: &Path, lock_timeout: Duration) -> Self {
		Self {
			hostnames: Registry::open(data_dir.join("hostnames.csv")),
			clusters: Registry::open(data_dir.join("cluster_names.csv")),
			lock_path: data_dir.join("registry.lock"),
			lock_timeout,
		}
	}

	/// Create both table files (with headers) if missing.
	pub fn ensure_files(&self) -> AllocResult<()> {
		self.hostnames.ensure_exists()?;
		self.clusters.ensure_exists()
	}

	/// Take the exclusive allocation lock. Times out with
	/// [`AllocError::Busy`].
	pub fn lock(&self) -> AllocResult<RegistryLock> {
		RegistryLock::acquire(&self.lock_path, self.lock_timeout)
	}

	/// Every name from both tables: hostnames first, then cluster names,
	/// each in insertion order. Stale unless the lock is held.
	pub fn all_names(&self) -> AllocResult<Vec<String>> {
		let mut names = Vec::new();
		for name in self.hostnames.names()? {
			names.push(name?);
		}
		for name in self.clusters.names()? {
			names.push(name?);
		}
		Ok(names)
	}

	/// Whether `name` exists in either table, case-insensitively.
	pub fn contains(&self, name: &str) -> AllocResult<bool> {
		Ok(self.hostnames.contains(name)? || self.clusters.contains(name)?)
	}

	/// Insert one hostname, holding the lock for the duplicate check and
	/// the append. Fails with [`AllocError::Duplicate`] if the name exists
	/// in either table.
	pub fn add_hostname(&self, row: HostnameRow) -> AllocResult<()> {
		let _lock = self.lock()?;
		if self.contains(&row.name)? {
			return Err(AllocError::Duplicate {
				names: vec![row.name],
			});
		}
		self.hostnames
			.append_rows(std::slice::from_ref(&row))
			.map_err(|failure| AllocError::Persistence {
				committed: Vec::new(),
				missing: vec![row.name.clone()],
				source: failure.error,
			})
	}

	/// Insert one cluster name; same contract as [`Store::add_hostname`].
	pub fn add_cluster(&self, row: ClusterRow) -> AllocResult<()> {
		let _lock = self.lock()?;
		if self.contains(&row.name)? {
			return Err(AllocError::Duplicate {
				names: vec![row.name],
			});
		}
		self.clusters
			.append_rows(std::slice::from_ref(&row))
			.map_err(|failure| AllocError::Persistence {
				committed: Vec::new(),
				missing: vec![row.name.clone()],
				source: failure.error,
			})
	}
}

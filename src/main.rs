//! Hostname Sequence Allocator CLI
//!
//! Answers the naming questionnaire from the command line and prints the
//! allocated hostnames (and cluster name, when a new cluster is created).

use anyhow::{Context, Result};
use clap::Parser;
use hostseq::datacenters::DatacenterTable;
use hostseq::{Allocator, Answers, Architecture, Config, HardwareType, Zone};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hostseq")]
#[command(version)]
#[command(about = "Allocate sequential ESXi hostnames and cluster names", long_about = None)]
struct Args {
	/// Directory holding hostnames.csv, cluster_names.csv and datacenters.csv
	#[arg(long, default_value = "data")]
	data_dir: PathBuf,

	/// Host lives in the DMZ
	#[arg(long)]
	dmz: bool,

	/// Join an existing cluster instead of creating a new one
	#[arg(long)]
	existing_cluster: bool,

	/// Hardware vendor (required for non-DMZ hosts)
	#[arg(long, value_enum)]
	hardware: Option<HardwareType>,

	/// Cloud code (or "custom" together with --custom-cloud-code)
	#[arg(long)]
	cloud_code: String,

	/// Free-text cloud code used when --cloud-code is "custom"
	#[arg(long)]
	custom_cloud_code: Option<String>,

	/// Zone type code (1-3 characters)
	#[arg(long)]
	zone_type: String,

	/// Service architecture (required for a new cluster)
	#[arg(long, value_enum)]
	architecture: Option<Architecture>,

	/// Zone letter (required for a new cluster)
	#[arg(long, value_enum)]
	zone: Option<Zone>,

	/// Datacenter name, resolved via the reference table
	#[arg(long)]
	datacenter: String,

	/// How many hostnames to allocate (1-100)
	#[arg(short, long, default_value = "1")]
	count: u32,

	/// Seconds to wait for the registry lock before giving up
	#[arg(long, default_value = "5")]
	lock_timeout: u64,

	/// Show what would be allocated without writing the registries
	#[arg(short = 'n', long)]
	dry_run: bool,

	/// Print detailed progress
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> Result<()> {
	let args = Args::parse();
	let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
	FmtSubscriber::builder()
		.with_max_level(log_level)
		.with_target(false)
		.compact()
		.init();

	// Seed the data directory on first run: registry headers plus the
	// built-in datacenter table.
	fs::create_dir_all(&args.data_dir)
		.with_context(|| format!("Failed to create {}", args.data_dir.display()))?;
	let datacenters_path = args.data_dir.join("datacenters.csv");
	if !datacenters_path.exists() {
		DatacenterTable::write_seed(&datacenters_path)
			.with_context(|| format!("Failed to seed {}", datacenters_path.display()))?;
	}

	let config = Config {
		data_dir: args.data_dir,
		lock_timeout: Duration::from_secs(args.lock_timeout),
		dry_run: args.dry_run,
	};

	let answers = Answers {
		existing_cluster: args.existing_cluster,
		service_architecture: args.architecture,
		zone: args.zone,
		hostname_count: args.count,
		datacenter: args.datacenter,
		is_dmz: args.dmz,
		hardware_type: args.hardware,
		cloud_code: args.cloud_code,
		custom_cloud_code: args.custom_cloud_code,
		zone_type: args.zone_type,
	};

	let allocator = Allocator::new(config).context("Failed to open registries")?;
	let allocation = match allocator.allocate(&answers) {
		Ok(allocation) => allocation,
		Err(hostseq::AllocError::Persistence {
			committed, missing, source,
		}) => {
			eprintln!("Partial write: {} name(s) persisted, {} missing.", committed.len(), missing.len());
			for name in &committed {
				eprintln!("  persisted: {}", name);
			}
			for name in &missing {
				eprintln!("  missing:   {}", name);
			}
			return Err(anyhow::Error::new(source)
				.context("Registry append failed partway; retry only the missing names"));
		}
		Err(err) => return Err(err.into()),
	};

	if args.dry_run {
		println!("Dry run, nothing written.");
	}
	for hostname in &allocation.hostnames {
		println!("{}", hostname);
	}
	if let Some(cluster) = &allocation.cluster_name {
		println!("cluster: {}", cluster);
	}

	Ok(())
}

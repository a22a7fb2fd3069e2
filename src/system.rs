use bytesize::ByteSize;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sysinfo::System;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
	pub timestamp: i64,
	pub hostname: String,
	pub os_name: String,
	pub os_version: String,
	pub kernel_version: String,
	pub cpu_cores: usize,
	pub cpu_physical_cores: usize,
	pub cpu_arch: String,
	pub total_memory: u64,
	pub available_memory: u64,
}

pub fn collect() -> SystemInfo {
	SystemInfo::collect()
}

impl SystemInfo {
	pub fn collect() -> Self {
		// Create a new system instance
		let mut sys = System::new();
		// Only memory figures are needed
		sys.refresh_memory();
		// Get the system details
		let timestamp = chrono::Utc::now().timestamp();
		let hostname = System::host_name().unwrap_or_else(|| "unknown".to_string());
		let os_name = System::name().unwrap_or_else(|| "unknown".to_string());
		let os_version = System::os_version().unwrap_or_else(|| "unknown".to_string());
		let kernel_version = System::kernel_version().unwrap_or_else(|| "unknown".to_string());
		// Get the CPU details
		let cpu_arch = System::cpu_arch();
		let cpu_cores = num_cpus::get();
		let cpu_physical_cores = num_cpus::get_physical();
		// Get the memory details
		let total_memory = sys.total_memory();
		let available_memory = sys.available_memory();
		debug!(
			"Host {hostname}: {} total, {} available, {cpu_cores} cores",
			ByteSize(total_memory),
			ByteSize(available_memory)
		);
		// Return the system information
		Self {
			timestamp,
			hostname,
			os_name,
			os_version,
			kernel_version,
			cpu_cores,
			cpu_physical_cores,
			cpu_arch,
			total_memory,
			available_memory,
		}
	}
}

/// How a recommended footprint compares with the memory of this host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum HostFit {
	Fits,
	ExceedsAvailable,
	ExceedsTotal,
	/// The host did not report its memory
	Unknown,
}

/// Compare the recommended total with the host memory and log the outcome
pub(crate) fn check_fit(total_mb: u64, host: &SystemInfo) -> HostFit {
	let required = total_mb.saturating_mul(MB);
	let fit = if host.total_memory == 0 {
		HostFit::Unknown
	} else if required > host.total_memory {
		HostFit::ExceedsTotal
	} else if required > host.available_memory {
		HostFit::ExceedsAvailable
	} else {
		HostFit::Fits
	};
	match fit {
		HostFit::ExceedsTotal => warn!(
			"Recommended memory of {total_mb} MB exceeds the {} of memory on {}",
			ByteSize(host.total_memory),
			host.hostname
		),
		HostFit::ExceedsAvailable => info!(
			"Recommended memory of {total_mb} MB exceeds the {} currently available on {}",
			ByteSize(host.available_memory),
			host.hostname
		),
		HostFit::Unknown => debug!("Host memory is unknown, skipping the fit check"),
		HostFit::Fits => debug!("Recommended memory of {total_mb} MB fits on {}", host.hostname),
	}
	fit
}

#[cfg(test)]
mod test {
	use super::*;

	fn host(total_mb: u64, available_mb: u64) -> SystemInfo {
		SystemInfo {
			timestamp: 0,
			hostname: "test".to_string(),
			os_name: "linux".to_string(),
			os_version: "1".to_string(),
			kernel_version: "1".to_string(),
			cpu_cores: 4,
			cpu_physical_cores: 2,
			cpu_arch: "x86_64".to_string(),
			total_memory: total_mb * MB,
			available_memory: available_mb * MB,
		}
	}

	#[test]
	fn fit_levels() {
		assert_eq!(check_fit(776, &host(4096, 2048)), HostFit::Fits);
		assert_eq!(check_fit(3000, &host(4096, 2048)), HostFit::ExceedsAvailable);
		assert_eq!(check_fit(8192, &host(4096, 2048)), HostFit::ExceedsTotal);
		assert_eq!(check_fit(776, &host(0, 0)), HostFit::Unknown);
	}

	#[test]
	fn collecting_host_info_does_not_fail() {
		let info = collect();
		assert!(info.cpu_cores >= 1);
		assert!(info.available_memory <= info.total_memory);
	}
}

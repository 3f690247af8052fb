use log::info;
use psutil::process::os::linux::ProcessExt;

const BYTES_IN_GB: f64 = 1024_f64 * 1024_f64 * 1024_f64;

/// Logs this process's memory footprint at a driver phase boundary.
#[allow(clippy::cast_precision_loss)]
pub fn print_memory_usage(phase: &str) {
    let process = psutil::process::Process::new(std::process::id()).expect("Error getting process");
    let mem = process.procfs_statm().expect("Error getting memory details");
    info!(
        "Memory usage after {}: total = {:.3} GB, rss = {:.3} GB",
        phase,
        mem.size as f64 / BYTES_IN_GB,
        mem.resident as f64 / BYTES_IN_GB,
    );
}

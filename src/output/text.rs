//! Human-readable console output

use crate::config::ReplayConfig;
use crate::stats::RunSummary;
use crate::trace::Schedule;
use crate::util::time::{format_latency_ms, per_second};

/// Print the effective configuration before a run
pub fn print_configuration(config: &ReplayConfig) {
    println!("Configuration:");
    println!("  Trace:         {}", config.trace_path.display());
    println!("  Device:        {}", config.device_path.display());
    println!("  Block size:    {} bytes", config.block_size_bytes);
    println!(
        "  Max transfer:  {} blocks ({})",
        config.max_transfer_size_blocks,
        format_bytes(config.max_transfer_bytes())
    );
    println!("  Alignment:     {} bytes", config.alignment_bytes);
    println!("  Workers:       {}", config.worker_count);
    println!(
        "  Open flags:    direct={} sync={}",
        config.direct, config.sync
    );
    println!(
        "  Timing:        {}",
        if config.respect_timing { "respect arrival times" } else { "as fast as possible" }
    );
    if config.record_latency {
        println!(
            "  Metrics:       {} (max {} requests)",
            config.metrics_path.display(),
            config.max_requests
        );
    } else {
        println!("  Metrics:       disabled");
    }
}

/// Print what the parsed trace contains
pub fn print_schedule(schedule: &Schedule) {
    println!("Trace:");
    println!(
        "  Requests:      {} ({} reads, {} writes)",
        schedule.len(),
        schedule.read_count(),
        schedule.write_count()
    );
    println!("  Total bytes:   {}", format_bytes(schedule.total_bytes()));
    println!("  Device span:   {}", format_bytes(schedule.device_span()));
    println!("  Duration:      {:.3} ms", schedule.duration_ms());
}

/// Print the run summary
///
/// The late rate is only shown when arrival times were respected.
pub fn print_summary(summary: &RunSummary) {
    println!("Total run time: {:.3} ms", summary.elapsed_ms());
    if summary.respect_timing {
        println!("Late rate: {:.2}%", summary.late_percent());
    }

    println!();
    println!(
        "Requests: {} completed ({} reads, {} writes, {})",
        summary.completed,
        summary.reads,
        summary.writes,
        format_bytes(summary.bytes)
    );
    println!(
        "  {:.0} IOPS, {}/s",
        per_second(summary.completed, summary.elapsed),
        format_bytes(per_second(summary.bytes, summary.elapsed) as u64)
    );

    if !summary.latency.is_empty() {
        println!("Latency:");
        println!("  min:  {}", format_latency_ms(summary.latency.min()));
        println!("  mean: {}", format_latency_ms(summary.latency.mean()));
        for p in [50.0, 95.0, 99.0] {
            if let Some(value) = summary.latency.percentile(p) {
                println!("  p{:<3} {}", format!("{}:", p as u32), format_latency_ms(value));
            }
        }
        println!("  max:  {}", format_latency_ms(summary.latency.max()));
    }
}

/// Format bytes in human-readable form (B, KiB, MiB, GiB)
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(32 * 1024 * 1024), "32.00 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }
}

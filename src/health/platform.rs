//! Host-level collaborators: `/proc` sampling, `df`, and outbound HEAD requests.

use std::fs;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use url::Url;

use crate::health::collaborators::{CpuTimes, DiskStats, DiskUsage, HeapUsage, HttpProber, SystemSampler};
use crate::health::error::{BoxError, ProbeError};

/// Samples process memory and CPU counters from procfs.
///
/// "Heap used" is the process resident set (`VmRSS`); "heap total" is host
/// memory (`MemTotal`).
#[derive(Debug, Clone)]
pub struct ProcSampler {
    root: String,
}

impl ProcSampler {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, file: &str) -> Result<String, BoxError> {
        Ok(fs::read_to_string(format!("{}/{}", self.root, file))?)
    }
}

impl Default for ProcSampler {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl SystemSampler for ProcSampler {
    fn memory(&self) -> Result<HeapUsage, BoxError> {
        let status = self.read("self/status")?;
        let meminfo = self.read("meminfo")?;
        let used_bytes = parse_kb_field(&status, "VmRSS:")
            .ok_or_else(|| ProbeError::Unknown("VmRSS missing from /proc/self/status".into()))?;
        let total_bytes = parse_kb_field(&meminfo, "MemTotal:")
            .ok_or_else(|| ProbeError::Unknown("MemTotal missing from /proc/meminfo".into()))?;
        Ok(HeapUsage {
            used_bytes,
            total_bytes,
        })
    }

    fn cpu_times(&self) -> Result<Vec<CpuTimes>, BoxError> {
        Ok(parse_proc_stat(&self.read("stat")?))
    }

    fn load_average(&self) -> Option<[f64; 3]> {
        let raw = self.read("loadavg").ok()?;
        let mut fields = raw.split_whitespace().map(|f| f.parse::<f64>().ok());
        Some([fields.next()??, fields.next()??, fields.next()??])
    }

    fn uptime(&self) -> Option<Duration> {
        let raw = self.read("uptime").ok()?;
        let secs = raw.split_whitespace().next()?.parse::<f64>().ok()?;
        Some(Duration::from_secs_f64(secs))
    }
}

/// Value of a `Name:   1234 kB` line, in bytes.
fn parse_kb_field(content: &str, field: &str) -> Option<u64> {
    content
        .lines()
        .find(|line| line.starts_with(field))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

/// Per-core counters from `/proc/stat` (`cpuN` lines, the aggregate `cpu`
/// line is skipped).
pub fn parse_proc_stat(content: &str) -> Vec<CpuTimes> {
    content
        .lines()
        .filter(|line| {
            line.strip_prefix("cpu")
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        })
        .map(|line| {
            let fields: Vec<u64> = line
                .split_whitespace()
                .skip(1)
                .map(|f| f.parse().unwrap_or(0))
                .collect();
            let at = |i: usize| fields.get(i).copied().unwrap_or(0);
            CpuTimes {
                user: at(0),
                nice: at(1),
                system: at(2),
                idle: at(3) + at(4),
                irq: at(5) + at(6),
            }
        })
        .collect()
}

/// Disk usage via `df -kP <path>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfDiskUsage;

#[async_trait]
impl DiskUsage for DfDiskUsage {
    async fn usage(&self, path: &str) -> Result<DiskStats, BoxError> {
        let output = Command::new("df").arg("-kP").arg(path).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Unknown(format!("df exited with {}: {}", output.status, stderr.trim())).into());
        }
        parse_df_output(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| ProbeError::Unknown("unrecognised df output".into()).into())
    }
}

/// Parse POSIX `df -kP` output (header plus one data line).
pub fn parse_df_output(stdout: &str) -> Option<DiskStats> {
    let line = stdout.lines().nth(1)?;
    let mut fields = line.split_whitespace().skip(1);
    let total_kb: u64 = fields.next()?.parse().ok()?;
    let used_kb: u64 = fields.next()?.parse().ok()?;
    Some(DiskStats {
        total_bytes: total_kb * 1024,
        used_bytes: used_kb * 1024,
    })
}

/// HEAD requests over reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestProber {
    client: reqwest::Client,
}

impl ReqwestProber {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("health-aggregator/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestProber {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl HttpProber for ReqwestProber {
    async fn head(&self, url: &Url) -> Result<u16, BoxError> {
        let response = self.client.head(url.clone()).send().await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_stat_skips_aggregate_line() {
        let stat = "\
cpu  200 0 100 1600 0 0 0 0 0 0
cpu0 100 0 50 800 50 0 0 0 0 0
cpu1 100 0 50 700 100 25 25 0 0 0
intr 12345
";
        let cores = parse_proc_stat(stat);
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[0].idle, 850);
        assert_eq!(cores[1].irq, 50);
        assert_eq!(cores[1].total(), 1000);
    }

    #[test]
    fn test_parse_df_output() {
        let stdout = "\
Filesystem     1024-blocks     Used Available Capacity Mounted on
/dev/sda1        100000000 91000000   9000000      91% /
";
        let stats = parse_df_output(stdout).unwrap();
        assert_eq!(stats.total_bytes, 100_000_000 * 1024);
        assert_eq!(stats.used_bytes, 91_000_000 * 1024);
        assert!(parse_df_output("Filesystem only\n").is_none());
    }

    #[test]
    fn test_proc_sampler_reads_fixture_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("self")).unwrap();
        fs::write(root.join("self/status"), "Name:\tapp\nVmRSS:\t  2048 kB\n").unwrap();
        fs::write(root.join("meminfo"), "MemTotal:       8192 kB\n").unwrap();
        fs::write(root.join("loadavg"), "0.50 0.25 0.10 1/100 999\n").unwrap();
        fs::write(root.join("uptime"), "120.5 300.0\n").unwrap();

        let sampler = ProcSampler::new(root.to_string_lossy());
        let memory = sampler.memory().unwrap();
        assert_eq!(memory.used_bytes, 2048 * 1024);
        assert_eq!(memory.total_bytes, 8192 * 1024);
        assert_eq!(sampler.load_average(), Some([0.5, 0.25, 0.1]));
        assert_eq!(sampler.uptime(), Some(Duration::from_secs_f64(120.5)));
        assert!(sampler.cpu_times().is_err());
    }
}

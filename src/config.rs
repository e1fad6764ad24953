use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Session file holding the incident store between commands
    #[arg(long, global = true, env = "HAZARD_STORE", default_value = "incidents.json")]
    pub store: PathBuf,

    /// Simulated network latency for report and route requests
    #[arg(long, global = true, env = "HAZARD_LATENCY_MS", default_value_t = 250)]
    pub latency_ms: u64,

    /// Give up on a request after this long
    #[arg(long, global = true, env = "HAZARD_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Reporter recorded on submitted reports
    #[arg(long, global = true, env = "HAZARD_REPORTER", default_value = "anonymous")]
    pub reporter: String,
}

impl Settings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

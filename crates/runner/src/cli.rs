use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;

use digest_core::Config;

/// Build the daily DDoS anomaly report and deliver it to the customer.
///
/// Settings come from the environment (and `.env`); flags override them
/// for a single run.
#[derive(Parser, Debug, Default)]
#[command(name = "anomaly-digest", about = "Daily DDoS anomaly report")]
pub struct CliArgs {
    /// Config profile: keys are read as `{PROFILE}_{KEY}` before `{KEY}`
    #[arg(long, env = "DIGEST_PROFILE")]
    pub profile: Option<String>,

    /// Delivery channel override: messaging or ftp
    #[arg(long)]
    pub channel: Option<String>,

    /// Report date (YYYY-MM-DD); the window ends at 21:00Z on this day
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Directory for the temporary report file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl CliArgs {
    /// Load the profile's config and apply flag overrides.
    pub fn load_config(&self) -> Config {
        let mut config = Config::for_profile(self.profile.as_deref().unwrap_or(""));
        self.apply(&mut config);
        config
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(channel) = &self.channel {
            config.delivery.channel = channel.to_lowercase();
        }
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
    }

    /// The explicit `--date`, or today's local date.
    pub fn report_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

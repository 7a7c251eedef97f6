//! Configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. `config.toml` (`~/.config/calcast/config.toml`, or `--config`)
//! 3. command-line flags and their environment variables (a `.env` file in
//!    the working directory is loaded into the environment first)
//!
//! ```toml
//! [calendar]
//! url = "webcal://example.com/team.ics"
//! day_range = 7
//! timezone = "America/New_York"
//!
//! [schedule]
//! freq_hours = 1
//!
//! [discord]
//! channel_id = "123"
//! message_id = "456"
//! bot_token = "..."
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use calcast_core::parse_timezone;
use calcast_providers::discord::DiscordConfig;
use calcast_providers::feed::FeedConfig;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{ServerError, ServerResult};
use crate::scheduler::SchedulerConfig;

/// Default lookahead in days.
pub const DEFAULT_DAY_RANGE: u32 = 7;

/// Default hours between runs.
pub const DEFAULT_FREQ_HOURS: u32 = 1;

/// Default display timezone.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Calendar feed settings.
    pub calendar: CalendarSettings,

    /// Scheduling settings.
    pub schedule: ScheduleSettings,

    /// Discord destination settings.
    pub discord: DiscordSettings,
}

/// Calendar feed settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Feed URL.
    pub url: Option<String>,

    /// Days to look ahead.
    pub day_range: Option<u32>,

    /// Display timezone (IANA name).
    pub timezone: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Scheduling settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Hours between runs.
    pub freq_hours: Option<u32>,

    /// Run once at startup.
    pub run_immediately: bool,
}

/// Discord destination settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// API base path.
    pub basepath: Option<String>,

    /// Channel holding the digest message.
    pub channel_id: Option<String>,

    /// Message to overwrite.
    pub message_id: Option<String>,

    /// Bot token.
    pub bot_token: Option<String>,
}

impl ServerSettings {
    /// Loads settings from the default path, or defaults if it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> ServerResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads settings from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::config_file(path, format!("failed to read config: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| ServerError::config_file(path, format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calcast")
            .join("config.toml")
    }

    /// Overlays command-line and environment values.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        fn overlay<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        overlay(&mut self.calendar.url, &cli.calendar_url);
        overlay(&mut self.calendar.day_range, &cli.day_range);
        overlay(&mut self.calendar.timezone, &cli.timezone);
        overlay(&mut self.schedule.freq_hours, &cli.freq_hours);
        overlay(&mut self.discord.basepath, &cli.discord_basepath);
        overlay(&mut self.discord.channel_id, &cli.discord_channel_id);
        overlay(&mut self.discord.message_id, &cli.discord_message_id);
        overlay(&mut self.discord.bot_token, &cli.discord_bot_token);
        self.schedule.run_immediately |= cli.immediate;
        self
    }
}

/// Where the digest goes.
#[derive(Debug, Clone)]
pub enum PublishTarget {
    /// Edit a Discord message.
    Discord(DiscordConfig),
    /// Print to stdout.
    DryRun,
}

/// Fully resolved configuration for the digest job and its scheduler.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Feed to read.
    pub feed: FeedConfig,
    /// Days to look ahead.
    pub day_range: u32,
    /// Display timezone.
    pub timezone: Tz,
    /// Scheduler settings.
    pub schedule: SchedulerConfig,
    /// Destination.
    pub target: PublishTarget,
}

impl DigestConfig {
    /// Validates settings and fills in defaults.
    ///
    /// Discord settings are only required when `dry_run` is false.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for missing or invalid values.
    pub fn from_settings(settings: &ServerSettings, dry_run: bool) -> ServerResult<Self> {
        let url = non_blank(&settings.calendar.url)
            .ok_or_else(|| ServerError::config("calendar URL is not set (CALENDAR_URL)"))?;
        let mut feed = FeedConfig::new(url).map_err(|e| ServerError::config(e.message()))?;
        if let Some(secs) = settings.calendar.timeout_secs {
            feed = feed.with_timeout(Duration::from_secs(secs));
        }

        let zone_name = non_blank(&settings.calendar.timezone).unwrap_or(DEFAULT_TIMEZONE);
        // POSIX allows a leading colon in TZ.
        let timezone = parse_timezone(zone_name.trim_start_matches(':'))
            .map_err(|e| ServerError::config(e.to_string()))?;

        let freq_hours = settings.schedule.freq_hours.unwrap_or(DEFAULT_FREQ_HOURS);
        if freq_hours == 0 {
            return Err(ServerError::config(
                "update frequency must be at least 1 hour (FREQ_HOURS_INTERVAL)",
            ));
        }
        let schedule = SchedulerConfig::every_hours(freq_hours)
            .with_run_immediately(settings.schedule.run_immediately);

        let target = if dry_run {
            PublishTarget::DryRun
        } else {
            PublishTarget::Discord(discord_config(&settings.discord)?)
        };

        Ok(Self {
            feed,
            day_range: settings.calendar.day_range.unwrap_or(DEFAULT_DAY_RANGE),
            timezone,
            schedule,
            target,
        })
    }
}

fn discord_config(settings: &DiscordSettings) -> ServerResult<DiscordConfig> {
    let missing = |what: &str, var: &str| ServerError::config(format!("Discord {what} is not set ({var})"));

    let channel_id = non_blank(&settings.channel_id)
        .ok_or_else(|| missing("channel id", "DISCORD_CHANNEL_ID"))?;
    let message_id = non_blank(&settings.message_id)
        .ok_or_else(|| missing("message id", "DISCORD_MESSAGE_ID"))?;
    let bot_token = non_blank(&settings.bot_token)
        .ok_or_else(|| missing("bot token", "DISCORD_BOT_TOKEN"))?;
    let basepath = non_blank(&settings.basepath).unwrap_or(DiscordConfig::DEFAULT_BASE_PATH);

    DiscordConfig::new(basepath, channel_id, message_id, bot_token)
        .map_err(|e| ServerError::config(e.message()))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete_settings() -> ServerSettings {
        ServerSettings {
            calendar: CalendarSettings {
                url: Some("https://example.com/cal.ics".to_string()),
                day_range: Some(14),
                timezone: Some("America/New_York".to_string()),
                timeout_secs: None,
            },
            schedule: ScheduleSettings::default(),
            discord: DiscordSettings {
                basepath: None,
                channel_id: Some("111".to_string()),
                message_id: Some("222".to_string()),
                bot_token: Some("token".to_string()),
            },
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[calendar]
url = "webcal://example.com/team.ics"
day_range = 10
timezone = "Europe/Berlin"
timeout_secs = 5

[schedule]
freq_hours = 3
run_immediately = true

[discord]
channel_id = "111"
message_id = "222"
bot_token = "token"
"#
        )
        .unwrap();

        let settings = ServerSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.calendar.url.as_deref(), Some("webcal://example.com/team.ics"));
        assert_eq!(settings.calendar.day_range, Some(10));
        assert_eq!(settings.schedule.freq_hours, Some(3));
        assert!(settings.schedule.run_immediately);
        assert!(settings.discord.basepath.is_none());

        let config = DigestConfig::from_settings(&settings, false).unwrap();
        assert_eq!(config.feed.url_str(), "https://example.com/team.ics");
        assert_eq!(config.feed.timeout, Duration::from_secs(5));
        assert_eq!(config.day_range, 10);
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.schedule.interval, Duration::from_secs(3 * 60 * 60));
        assert!(config.schedule.run_immediately);
        match config.target {
            PublishTarget::Discord(discord) => {
                assert_eq!(
                    discord.message_url(),
                    "https://discord.com/api/v10/channels/111/messages/222"
                );
            }
            PublishTarget::DryRun => panic!("expected Discord target"),
        }
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = ServerSettings::load_from(file.path()).unwrap();
        assert!(settings.calendar.url.is_none());
        assert!(!settings.schedule.run_immediately);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[calendar\nurl = ").unwrap();

        let err = ServerSettings::load_from(file.path()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerSettings::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ServerError::ConfigFile { .. }));
    }

    #[test]
    fn cli_overrides_file() {
        let cli = Cli {
            day_range: Some(3),
            timezone: Some("Asia/Tokyo".to_string()),
            discord_message_id: Some("999".to_string()),
            immediate: true,
            ..Default::default()
        };

        let settings = complete_settings().merge_cli(&cli);

        assert_eq!(settings.calendar.day_range, Some(3));
        assert_eq!(settings.calendar.timezone.as_deref(), Some("Asia/Tokyo"));
        assert_eq!(settings.discord.message_id.as_deref(), Some("999"));
        // Untouched values survive.
        assert_eq!(settings.discord.channel_id.as_deref(), Some("111"));
        assert_eq!(settings.calendar.url.as_deref(), Some("https://example.com/cal.ics"));
        assert!(settings.schedule.run_immediately);
    }

    #[test]
    fn defaults_fill_gaps() {
        let mut settings = complete_settings();
        settings.calendar.day_range = None;
        settings.calendar.timezone = None;

        let config = DigestConfig::from_settings(&settings, false).unwrap();
        assert_eq!(config.day_range, DEFAULT_DAY_RANGE);
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.schedule.interval, Duration::from_secs(60 * 60));
        assert!(!config.schedule.run_immediately);
    }

    #[test]
    fn missing_url_rejected() {
        let mut settings = complete_settings();
        settings.calendar.url = Some("   ".to_string());

        let err = DigestConfig::from_settings(&settings, false).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("CALENDAR_URL"));
    }

    #[test]
    fn invalid_timezone_rejected() {
        let mut settings = complete_settings();
        settings.calendar.timezone = Some("Eastern".to_string());

        let err = DigestConfig::from_settings(&settings, false).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Eastern"));
    }

    #[test]
    fn posix_colon_prefix_accepted() {
        let mut settings = complete_settings();
        settings.calendar.timezone = Some(":Europe/Paris".to_string());

        let config = DigestConfig::from_settings(&settings, false).unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Paris);
    }

    #[test]
    fn zero_frequency_rejected() {
        let mut settings = complete_settings();
        settings.schedule.freq_hours = Some(0);

        let err = DigestConfig::from_settings(&settings, false).unwrap_err();
        assert!(err.to_string().contains("FREQ_HOURS_INTERVAL"));
    }

    #[test]
    fn discord_required_unless_dry_run() {
        let mut settings = complete_settings();
        settings.discord.bot_token = None;

        let err = DigestConfig::from_settings(&settings, false).unwrap_err();
        assert!(err.to_string().contains("DISCORD_BOT_TOKEN"));

        let config = DigestConfig::from_settings(&settings, true).unwrap();
        assert!(matches!(config.target, PublishTarget::DryRun));
    }

    #[test]
    fn default_path_is_under_calcast() {
        let path = ServerSettings::default_path();
        assert!(path.ends_with("calcast/config.toml"));
    }
}

//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// calcast - Post your upcoming calendar events to a Discord message
#[derive(Debug, Default, Parser)]
#[command(name = "calcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, env = "CALCAST_LOG_FORMAT")]
    pub log_format: Option<String>,

    // --- Calendar ---
    /// iCalendar feed URL (http, https or webcal)
    #[arg(long, env = "CALENDAR_URL")]
    pub calendar_url: Option<String>,

    /// Number of days to look ahead
    #[arg(long, env = "DAY_RANGE")]
    pub day_range: Option<u32>,

    /// Timezone used to display event times (IANA name)
    #[arg(long = "tz", env = "TZ")]
    pub timezone: Option<String>,

    // --- Schedule ---
    /// Hours between digest updates
    #[arg(long = "freq-hours", env = "FREQ_HOURS_INTERVAL")]
    pub freq_hours: Option<u32>,

    /// Publish once at startup instead of waiting for the first interval
    #[arg(long)]
    pub immediate: bool,

    /// Publish a single digest and exit
    #[arg(long)]
    pub once: bool,

    /// Print the digest to stdout instead of publishing it
    #[arg(long)]
    pub dry_run: bool,

    // --- Discord ---
    /// Discord API base path
    #[arg(long = "discord-basepath", env = "DISCORD_BASEPATH")]
    pub discord_basepath: Option<String>,

    /// Channel holding the digest message
    #[arg(long, env = "DISCORD_CHANNEL_ID")]
    pub discord_channel_id: Option<String>,

    /// Message to overwrite with the digest
    #[arg(long, env = "DISCORD_MESSAGE_ID")]
    pub discord_message_id: Option<String>,

    /// Discord bot token
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    pub discord_bot_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::try_parse_from([
            "calcast",
            "--calendar-url",
            "https://example.com/cal.ics",
            "--day-range",
            "14",
            "--tz",
            "America/Chicago",
            "--freq-hours",
            "6",
            "--discord-channel-id",
            "111",
            "--discord-message-id",
            "222",
            "--once",
            "--dry-run",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.calendar_url.as_deref(), Some("https://example.com/cal.ics"));
        assert_eq!(cli.day_range, Some(14));
        assert_eq!(cli.timezone.as_deref(), Some("America/Chicago"));
        assert_eq!(cli.freq_hours, Some(6));
        assert_eq!(cli.discord_channel_id.as_deref(), Some("111"));
        assert_eq!(cli.discord_message_id.as_deref(), Some("222"));
        assert!(cli.once);
        assert!(cli.dry_run);
        assert!(cli.debug);
        assert!(!cli.immediate);
    }

    #[test]
    fn negative_day_range_rejected() {
        let result = Cli::try_parse_from(["calcast", "--day-range", "-3"]);
        assert!(result.is_err());
    }
}

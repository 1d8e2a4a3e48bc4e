//! Command-line interface definitions for the digest pipeline.
//!
//! All options can be provided via command-line flags; the API key and the
//! target date can also come from environment variables.

use clap::Parser;

/// Command-line arguments for the daily collection run.
///
/// # Examples
///
/// ```sh
/// # Collect today's digest into the site data directory
/// ai_daily_digest -d ./client/public/data
///
/// # Rebuild a specific day with a different model
/// ai_daily_digest -d ./data --date 2026-01-02 --model gpt-4o
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the digest and index JSON files
    #[arg(short = 'd', long)]
    pub data_output_dir: String,

    /// Digest date (YYYY-MM-DD); defaults to today in UTC
    #[arg(long, env = "TARGET_DATE")]
    pub date: Option<String>,

    /// OpenAI API key; when absent the fallback editor is used
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Model used for the editorial step
    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    /// How many stories the digest carries
    #[arg(long, default_value_t = 9)]
    pub max_stories: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["ai_daily_digest", "--data-output-dir", "./data"]);
        assert_eq!(cli.data_output_dir, "./data");
        assert_eq!(cli.model, "gpt-4o-mini");
        assert_eq!(cli.max_stories, 9);
    }

    #[test]
    fn test_cli_short_flag_and_date() {
        let cli = Cli::parse_from([
            "ai_daily_digest",
            "-d",
            "/tmp/data",
            "--date",
            "2026-01-02",
            "--max-stories",
            "5",
        ]);
        assert_eq!(cli.data_output_dir, "/tmp/data");
        assert_eq!(cli.date.as_deref(), Some("2026-01-02"));
        assert_eq!(cli.max_stories, 5);
    }
}

use std::env;
use std::time::Duration;

use tracing::info;

/// How the process runs after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// One scrape run, then exit.
    Once,
    /// Scrape on an interval until interrupted. Shutdown is only observed
    /// between runs; an in-flight run completes.
    Continuous { interval: Duration },
}

/// Knobs for one scrape run. Separate from the connection settings so the
/// controller can be tested without an instance or credentials.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Hard cap on posts processed per source per run.
    pub max_posts_per_run: u32,
    /// Stop paginating after a streak of already-seen posts.
    pub stop_at_seen_posts: bool,
    /// Skip already-seen posts but keep paginating.
    pub skip_seen_posts: bool,
    /// Streak length that triggers the stop.
    pub seen_posts_threshold: u32,
    /// Fetch pages beyond the first.
    pub enable_pagination: bool,
    /// Lemmy sort order, e.g. "Hot", "New", "TopDay".
    pub sort_type: String,
    pub include_images: bool,
    pub include_videos: bool,
    pub include_other_media: bool,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Instance hostname, e.g. "lemmy.ml".
    pub instance: String,
    pub username: String,
    pub password: String,

    /// Root directory for downloaded media, one subdirectory per community.
    pub media_dir: String,
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Communities to scrape. Empty means the instance feed.
    pub communities: Vec<String>,

    pub scraper: ScraperConfig,
    pub run_mode: RunMode,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        let enable_pagination = env_bool("ENABLE_PAGINATION", true);
        let mut max_posts_per_run = env_u32("MAX_POSTS_PER_RUN", 50);
        // Without pagination a single request can never return more than 50.
        if !enable_pagination && max_posts_per_run > 50 {
            max_posts_per_run = 50;
        }

        let include_images = env_bool("INCLUDE_IMAGES", false);
        let include_videos = env_bool("INCLUDE_VIDEOS", false);
        let include_other = env_bool("INCLUDE_OTHER_MEDIA", false);
        // All types disabled means nothing was configured; download everything.
        let (include_images, include_videos, include_other) =
            if !include_images && !include_videos && !include_other {
                (true, true, true)
            } else {
                (include_images, include_videos, include_other)
            };

        let run_mode = match env::var("RUN_MODE").as_deref() {
            Ok("continuous") => RunMode::Continuous {
                interval: Duration::from_secs(env_u32("RUN_INTERVAL_SECS", 3600) as u64),
            },
            Ok("once") | Err(_) => RunMode::Once,
            Ok(other) => panic!("RUN_MODE must be 'once' or 'continuous', got '{other}'"),
        };

        Self {
            instance: required_env("LEMMY_INSTANCE"),
            username: required_env("LEMMY_USERNAME"),
            password: required_env("LEMMY_PASSWORD"),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./lemmyvault.db".to_string()),
            communities: env::var("COMMUNITIES")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            scraper: ScraperConfig {
                max_posts_per_run,
                stop_at_seen_posts: env_bool("STOP_AT_SEEN_POSTS", true),
                skip_seen_posts: env_bool("SKIP_SEEN_POSTS", false),
                seen_posts_threshold: env_u32("SEEN_POSTS_THRESHOLD", 5),
                enable_pagination,
                sort_type: normalize_sort_type(
                    &env::var("SORT_TYPE").unwrap_or_else(|_| "Hot".to_string()),
                ),
                include_images,
                include_videos,
                include_other_media: include_other,
            },
            run_mode,
        }
    }

    /// Log the effective configuration without credentials.
    pub fn log_redacted(&self) {
        info!(
            instance = self.instance.as_str(),
            username = self.username.as_str(),
            media_dir = self.media_dir.as_str(),
            database_path = self.database_path.as_str(),
            communities = self.communities.len(),
            max_posts_per_run = self.scraper.max_posts_per_run,
            sort = self.scraper.sort_type.as_str(),
            pagination = self.scraper.enable_pagination,
            run_mode = ?self.run_mode,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got '{v}'")),
        Err(_) => default,
    }
}

/// Map user-friendly sort names onto the API's SortType casing.
pub fn normalize_sort_type(sort: &str) -> String {
    match sort.to_lowercase().as_str() {
        "hot" => "Hot",
        "new" => "New",
        "active" => "Active",
        "topday" => "TopDay",
        "topweek" => "TopWeek",
        "topmonth" => "TopMonth",
        "topyear" => "TopYear",
        "topall" => "TopAll",
        _ => return sort.to_string(),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_type_normalizes_known_values() {
        assert_eq!(normalize_sort_type("hot"), "Hot");
        assert_eq!(normalize_sort_type("TOPWEEK"), "TopWeek");
        assert_eq!(normalize_sort_type("New"), "New");
    }

    #[test]
    fn sort_type_passes_unknown_values_through() {
        assert_eq!(normalize_sort_type("MostComments"), "MostComments");
    }
}

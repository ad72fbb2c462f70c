pub mod downloader;
pub mod locator;
pub mod scraper;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use downloader::{Downloader, HttpFetcher};
pub use scraper::{RunStats, Scraper, SeenPolicy};

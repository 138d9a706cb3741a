use std::{
    fs::{self, File},
    io,
    path::Path,
    sync::Arc,
    time::{Duration, SystemTime},
};

use jiff::{
    civil::DateTime,
    tz::{self, TimeZone},
    Timestamp,
};
use log::{info, warn};
use reqwest::{
    blocking::Client,
    header::{
        HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, REFERER, UPGRADE_INSECURE_REQUESTS,
        USER_AGENT,
    },
    StatusCode, Url,
};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use thiserror::Error;

/// Visiting this page sets the session cookies the data endpoint wants.
pub const AUTH_COOKIE_URL: &str =
    "https://aemo.com.au/energy-systems/electricity/national-electricity-market-nem/data-nem/aggregated-data";

pub const PRICE_AND_DEMAND_URL: &str = "https://aemo.com.au/aemo/data/nem/priceanddemand";

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Cannot download {url}, HTTP status {status}")]
    Status { url: String, status: StatusCode },
    #[error("Unexpected data format in {path}, missing column {column}")]
    MissingColumn { path: String, column: String },
    #[error("Invalid url {0}")]
    Url(String),
    #[error("Cookie store error: {0}")]
    Cookie(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(
        REFERER,
        HeaderValue::from_static("https://aemo.com.au/aemo/apps/visualisation/index.html"),
    );
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:84.0) Gecko/20100101 Firefox/84.0",
        ),
    );
    headers
}

/// Make a client with browser headers and the cookies AEMO expects.  One
/// request to the aggregated data page fills the cookie store, then the
/// privacy notification is marked as accepted.
pub fn cookied_client() -> Result<Client, DownloadError> {
    let jar = Arc::new(CookieStoreMutex::new(CookieStore::default()));
    let client = Client::builder()
        .default_headers(browser_headers())
        .cookie_provider(Arc::clone(&jar))
        .build()?;

    let response = client.get(AUTH_COOKIE_URL).send()?;
    info!("Cookie page returned HTTP status {}", response.status());

    let url = Url::parse(AUTH_COOKIE_URL).map_err(|e| DownloadError::Url(e.to_string()))?;
    {
        let mut store = jar
            .lock()
            .map_err(|e| DownloadError::Cookie(e.to_string()))?;
        store
            .parse("privacy-notification=1; Path=/", &url)
            .map_err(|e| DownloadError::Cookie(e.to_string()))?;
    }
    Ok(client)
}

/// Download `url` into `file_path`, creating the parent directory if needed.
/// Any status outside `200..=320` is an error.
pub fn download_file(client: &Client, url: &str, file_path: &Path) -> Result<(), DownloadError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !(200..=320).contains(&status.as_u16()) {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status,
        });
    }
    info!("Server status is {}", status);

    if let Some(dir) = file_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let body = response.bytes()?;
    let mut out = File::create(file_path)?;
    io::copy(&mut body.as_ref(), &mut out)?;
    Ok(())
}

/// A cached file can be reused if it is not older than `max_age`.
pub fn is_fresh(file_path: &Path, max_age: Duration) -> bool {
    let modified = match fs::metadata(file_path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default();
    info!(
        "Cached file {} age is {} s.",
        file_path.display(),
        age.as_secs()
    );
    age <= max_age
}

/// Current NEM market time (UTC+10, no daylight saving).
pub fn nem_now() -> DateTime {
    Timestamp::now()
        .to_zoned(TimeZone::fixed(tz::offset(10)))
        .datetime()
}

/// Remove a download that failed validation.  Return false if it's still there.
pub fn discard_file(file_path: &Path) -> bool {
    match fs::remove_file(file_path) {
        Ok(_) => {
            info!("Removed invalid file {}", file_path.display());
            true
        }
        Err(e) => {
            warn!(
                "Failed to remove invalid file {}: {}",
                file_path.display(),
                e
            );
            false
        }
    }
}

/// Check that the csv header of the file has all the given columns.
pub fn check_columns(file_path: &Path, columns: &[&str]) -> Result<(), DownloadError> {
    let mut rdr = csv::Reader::from_path(file_path)?;
    let headers = rdr.headers()?;
    for column in columns {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(DownloadError::MissingColumn {
                path: file_path.display().to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;

/// GETs `url` through `client` and returns the body, failing on non-2xx.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// `true` when `source` should be fetched over HTTP rather than read from disk.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://data.calgary.ca/boundaries.geojson"));
        assert!(is_remote("http://localhost:8000/Modes_of_Travel.csv"));
        assert!(!is_remote("data/Modes_of_Travel.csv"));
        assert!(!is_remote("httpdocs/Modes_of_Travel.csv"));
    }
}

//! HTTP client for the NWS points and grid data endpoints.

use std::time::Duration;
use std::{env, fmt};

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::location::Coordinates;

const HTTPS_PROXY_ENV: &str = "HTTPS_PROXY";
const NWS_API_BASE: &str = "https://api.weather.gov";
const GEO_JSON: &str = "application/geo+json";
const USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION")
);

#[derive(Debug)]
pub enum FetchError {
    Request(reqwest::Error),
    Decode(serde_json::Error),
    NoAttempts,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "Unexpected response body: {err}"),
            Self::NoAttempts => f.write_str("Request attempts were not performed"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::NoAttempts => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    #[serde(rename = "forecastGridData")]
    forecast_grid_data: String,
}

/// Builds a client that identifies itself (required by the NWS API) and
/// honours `HTTPS_PROXY`.
pub fn build_client() -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GEO_JSON));
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers);

    match env::var(HTTPS_PROXY_ENV) {
        Ok(val) => {
            info!(proxy = %val, "Using HTTPS proxy");
            builder = builder.proxy(reqwest::Proxy::https(val)?);
        }
        Err(err) => debug!(error = %err, "No HTTPS proxy configured"),
    }
    builder.build()
}

pub fn points_url(coordinates: Coordinates) -> String {
    format!("{NWS_API_BASE}/points/{coordinates}")
}

/// GETs `url`, retrying network and HTTP errors up to `max_retries` times.
pub async fn fetch_url(
    client: &Client,
    url: &str,
    max_retries: u32,
    delay: Duration,
) -> Result<Bytes, FetchError> {
    let mut last_error: Option<reqwest::Error> = None;
    for attempt in 1..=max_retries {
        let outcome = match client.get(url).send().await {
            Ok(response) => response.error_for_status(),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(response) => return response.bytes().await.map_err(FetchError::Request),
            Err(err) => {
                match err.status() {
                    Some(status) => {
                        warn!(attempt, status = %status, error = %err, url, "HTTP request failed");
                    }
                    None => warn!(attempt, error = %err, url, "HTTP request failed"),
                }
                last_error = Some(err);
            }
        }

        if attempt < max_retries {
            debug!(attempt, delay_secs = delay.as_secs_f64(), "Retrying request");
            tokio::time::sleep(delay).await;
        }
    }

    last_error.map_or(Err(FetchError::NoAttempts), |err| {
        Err(FetchError::Request(err))
    })
}

/// Resolves the grid data URL for `coordinates` via the points endpoint.
pub async fn get_grid_data_url(
    client: &Client,
    coordinates: Coordinates,
    max_retries: u32,
    delay: Duration,
) -> Result<String, FetchError> {
    let body = fetch_url(client, &points_url(coordinates), max_retries, delay).await?;
    let points: PointsResponse = serde_json::from_slice(&body).map_err(FetchError::Decode)?;
    Ok(points.properties.forecast_grid_data)
}

/// Downloads the raw `forecastGridData` body for `coordinates`.
pub async fn get_grid_data(
    client: &Client,
    coordinates: Coordinates,
    max_retries: u32,
    delay: Duration,
) -> Result<Bytes, FetchError> {
    let url = get_grid_data_url(client, coordinates, max_retries, delay).await?;
    info!(url = %url, "Fetching grid data");
    fetch_url(client, &url, max_retries, delay).await
}

//! Region metadata from the instance metadata service.

use std::time::Duration;

use async_trait::async_trait;
use ocisdk_core::{CoreError, CoreResult, RegionMetadata, RegionMetadataSource};
use tracing::debug;

/// Default region info endpoint of the instance metadata service.
pub const DEFAULT_REGION_INFO_URL: &str = "http://169.254.169.254/opc/v2/instance/regionInfo/";

const IMDS_TIMEOUT: Duration = Duration::from_secs(10);

/// Learns the current region from the instance metadata service.
///
/// Only reachable from inside a compute instance.
#[derive(Debug, Clone)]
pub struct InstanceMetadataRegionSource {
    url: String,
    client: reqwest::Client,
}

impl Default for InstanceMetadataRegionSource {
    fn default() -> Self {
        Self::with_url(DEFAULT_REGION_INFO_URL)
    }
}

impl InstanceMetadataRegionSource {
    /// Query a different endpoint.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(IMDS_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl RegionMetadataSource for InstanceMetadataRegionSource {
    fn name(&self) -> &'static str {
        "instance metadata service"
    }

    async fn fetch(&self) -> CoreResult<Vec<RegionMetadata>> {
        debug!(url = %self.url, "Querying instance metadata for region info");
        let response = self
            .client
            .get(&self.url)
            .header(http::header::AUTHORIZATION, "Bearer Oracle")
            .send()
            .await
            .map_err(|e| CoreError::RegionMetadata(format!("instance metadata request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::RegionMetadata(format!(
                "instance metadata returned HTTP {status}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CoreError::RegionMetadata(format!("instance metadata read failed: {e}")))?;
        let record: RegionMetadata = serde_json::from_str(&text)?;
        Ok(vec![record])
    }
}

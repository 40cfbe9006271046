//! Region and realm resolution.
//!
//! Every region belongs to a realm, and every realm has a second-level
//! domain. Service endpoints are formed as
//! `https://<service>.<region>.<domain>`.
//!
//! [`RegionRegistry`] starts from a static table of known regions and realms.
//! Regions missing from the table are learned at runtime from a chain of
//! [`RegionMetadataSource`]s, tried in order:
//!
//! 1. a local metadata file ([`FileRegionSource`]),
//! 2. an environment variable ([`EnvRegionSource`]),
//! 3. the instance metadata service (provided by the HTTP layer).
//!
//! Each source is consulted at most once per registry. Learned regions are
//! never removed. When no source knows a region, the default realm's domain
//! is used.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};

/// Realm used when nothing else is known about a region.
pub const DEFAULT_REALM: &str = "oc1";

/// Environment variable holding a single region metadata record.
pub const REGION_METADATA_ENV_VAR: &str = "OCI_REGION_METADATA";

const KNOWN_REALMS: &[(&str, &str)] = &[
    ("oc1", "oraclecloud.com"),
    ("oc2", "oraclegovcloud.com"),
    ("oc3", "oraclegovcloud.com"),
    ("oc4", "oraclegovcloud.uk"),
    ("oc8", "oraclecloud8.com"),
    ("oc9", "oraclecloud9.com"),
    ("oc10", "oraclecloud10.com"),
];

/// (region identifier, short code, realm key)
const KNOWN_REGIONS: &[(&str, &str, &str)] = &[
    ("ap-chuncheon-1", "yny", "oc1"),
    ("ap-hyderabad-1", "hyd", "oc1"),
    ("ap-melbourne-1", "mel", "oc1"),
    ("ap-mumbai-1", "bom", "oc1"),
    ("ap-osaka-1", "kix", "oc1"),
    ("ap-seoul-1", "icn", "oc1"),
    ("ap-sydney-1", "syd", "oc1"),
    ("ap-tokyo-1", "nrt", "oc1"),
    ("ca-montreal-1", "yul", "oc1"),
    ("ca-toronto-1", "yyz", "oc1"),
    ("eu-amsterdam-1", "ams", "oc1"),
    ("eu-frankfurt-1", "fra", "oc1"),
    ("eu-zurich-1", "zrh", "oc1"),
    ("me-jeddah-1", "jed", "oc1"),
    ("me-dubai-1", "dxb", "oc1"),
    ("sa-saopaulo-1", "gru", "oc1"),
    ("uk-cardiff-1", "cwl", "oc1"),
    ("uk-london-1", "lhr", "oc1"),
    ("us-ashburn-1", "iad", "oc1"),
    ("us-phoenix-1", "phx", "oc1"),
    ("us-sanjose-1", "sjc", "oc1"),
    ("us-langley-1", "lfi", "oc2"),
    ("us-luke-1", "luf", "oc2"),
    ("us-gov-ashburn-1", "ric", "oc3"),
    ("us-gov-chicago-1", "pia", "oc3"),
    ("us-gov-phoenix-1", "tus", "oc3"),
    ("uk-gov-london-1", "ltn", "oc4"),
    ("uk-gov-cardiff-1", "brs", "oc4"),
    ("ap-chiyoda-1", "nja", "oc8"),
    ("ap-ibaraki-1", "ukb", "oc8"),
    ("me-dcc-muscat-1", "mct", "oc9"),
    ("ap-dcc-canberra-1", "wga", "oc10"),
];

/// A realm: a group of regions sharing one second-level domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Realm {
    /// Realm key, e.g. `oc1`.
    pub key: String,
    /// Second-level domain, e.g. `oraclecloud.com`.
    pub domain: String,
}

/// A region metadata record as published by the fallback sources.
///
/// Wire format:
///
/// ```json
/// {
///   "realmKey": "oc1",
///   "realmDomainComponent": "oraclecloud.com",
///   "regionKey": "PHX",
///   "regionIdentifier": "us-phoenix-1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMetadata {
    /// Realm key, e.g. `oc1`.
    pub realm_key: String,
    /// Realm second-level domain, e.g. `oraclecloud.com`.
    pub realm_domain_component: String,
    /// Region short code, e.g. `PHX`.
    pub region_key: String,
    /// Region identifier, e.g. `us-phoenix-1`.
    pub region_identifier: String,
}

impl RegionMetadata {
    /// Check that every field is present and return a lower-cased copy.
    pub fn normalized(&self) -> CoreResult<Self> {
        let fields = [
            ("realmKey", &self.realm_key),
            ("realmDomainComponent", &self.realm_domain_component),
            ("regionKey", &self.region_key),
            ("regionIdentifier", &self.region_identifier),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CoreError::RegionMetadata(format!("{name} is empty")));
            }
        }

        Ok(Self {
            realm_key: self.realm_key.trim().to_ascii_lowercase(),
            realm_domain_component: self.realm_domain_component.trim().to_ascii_lowercase(),
            region_key: self.region_key.trim().to_ascii_lowercase(),
            region_identifier: self.region_identifier.trim().to_ascii_lowercase(),
        })
    }
}

/// A place unknown regions can be learned from.
#[async_trait]
pub trait RegionMetadataSource: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch every record this source knows about.
    async fn fetch(&self) -> CoreResult<Vec<RegionMetadata>>;
}

/// Reads a JSON array of [`RegionMetadata`] records from a local file.
#[derive(Debug, Clone)]
pub struct FileRegionSource {
    path: PathBuf,
}

impl FileRegionSource {
    /// Create a source reading the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.oci/regions-config.json`, or `None` when `HOME` is unset.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        let home = std::env::var_os("HOME")?;
        Some(Self::new(
            PathBuf::from(home).join(".oci").join("regions-config.json"),
        ))
    }
}

#[async_trait]
impl RegionMetadataSource for FileRegionSource {
    fn name(&self) -> &'static str {
        "regions-config file"
    }

    async fn fetch(&self) -> CoreResult<Vec<RegionMetadata>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(CoreError::SourceUnavailable(self.name()));
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Reads a single [`RegionMetadata`] record from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvRegionSource {
    var: String,
}

impl EnvRegionSource {
    /// Create a source reading the given variable.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvRegionSource {
    fn default() -> Self {
        Self::new(REGION_METADATA_ENV_VAR)
    }
}

#[async_trait]
impl RegionMetadataSource for EnvRegionSource {
    fn name(&self) -> &'static str {
        "region metadata environment variable"
    }

    async fn fetch(&self) -> CoreResult<Vec<RegionMetadata>> {
        let blob = std::env::var(&self.var).map_err(|_| CoreError::SourceUnavailable(self.name()))?;
        let record: RegionMetadata = serde_json::from_str(&blob)?;
        Ok(vec![record])
    }
}

#[derive(Debug)]
struct SourceSlot {
    source: Box<dyn RegionMetadataSource>,
    tried: AtomicBool,
}

/// Thread-safe registry of regions and realms.
///
/// Read-mostly: lookups hit concurrent maps directly, while learning a new
/// region is serialised so that concurrent first use of an unknown region
/// consults each source once and registers the result once.
///
/// # Examples
///
/// ```
/// use ocisdk_core::RegionRegistry;
///
/// # tokio_test::block_on(async {
/// let registry = RegionRegistry::new();
/// let url = registry.resolve("us-phoenix-1", "iaas").await;
/// assert_eq!(url, "https://iaas.us-phoenix-1.oraclecloud.com");
/// # });
/// ```
#[derive(Debug)]
pub struct RegionRegistry {
    regions: DashMap<String, String>,
    short_codes: DashMap<String, String>,
    realms: DashMap<String, String>,
    sources: Vec<SourceSlot>,
    learn_lock: tokio::sync::Mutex<()>,
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionRegistry {
    /// Create a registry preloaded with the static tables and no fallback sources.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            regions: DashMap::new(),
            short_codes: DashMap::new(),
            realms: DashMap::new(),
            sources: Vec::new(),
            learn_lock: tokio::sync::Mutex::new(()),
        };
        for (key, domain) in KNOWN_REALMS {
            registry.realms.insert((*key).to_owned(), (*domain).to_owned());
        }
        for (region, code, realm) in KNOWN_REGIONS {
            registry.regions.insert((*region).to_owned(), (*realm).to_owned());
            registry.short_codes.insert((*code).to_owned(), (*region).to_owned());
        }
        registry
    }

    /// Create a registry with the local file and environment sources.
    ///
    /// The instance metadata source lives in the HTTP layer and is appended
    /// with [`RegionRegistry::with_source`].
    #[must_use]
    pub fn with_default_sources() -> Self {
        let mut registry = Self::new();
        if let Some(file) = FileRegionSource::default_location() {
            registry = registry.with_source(file);
        }
        registry.with_source(EnvRegionSource::default())
    }

    /// Append a fallback source. Sources are consulted in insertion order.
    #[must_use]
    pub fn with_source(mut self, source: impl RegionMetadataSource + 'static) -> Self {
        self.sources.push(SourceSlot {
            source: Box::new(source),
            tried: AtomicBool::new(false),
        });
        self
    }

    /// Register a region. Idempotent; existing entries are left untouched.
    pub fn register(&self, metadata: &RegionMetadata) -> CoreResult<()> {
        let metadata = metadata.normalized()?;
        self.realms
            .entry(metadata.realm_key.clone())
            .or_insert(metadata.realm_domain_component);
        self.short_codes
            .entry(metadata.region_key)
            .or_insert_with(|| metadata.region_identifier.clone());
        self.regions
            .entry(metadata.region_identifier)
            .or_insert(metadata.realm_key);
        Ok(())
    }

    /// Whether the region identifier is known.
    #[must_use]
    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(&region.to_ascii_lowercase())
    }

    /// Number of known regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no regions are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Map a short code such as `phx` to its region identifier.
    #[must_use]
    pub fn region_for_short_code(&self, code: &str) -> Option<String> {
        self.short_codes
            .get(&code.to_ascii_lowercase())
            .map(|r| r.value().clone())
    }

    /// Normalise user input: lower-case, and expand short codes.
    #[must_use]
    pub fn canonical_region(&self, region: &str) -> String {
        let region = region.trim().to_ascii_lowercase();
        if self.regions.contains_key(&region) {
            return region;
        }
        self.region_for_short_code(&region).unwrap_or(region)
    }

    /// The realm of a known region.
    #[must_use]
    pub fn realm_of(&self, region: &str) -> Option<Realm> {
        let key = self.regions.get(region)?.value().clone();
        let domain = self.realms.get(&key)?.value().clone();
        Some(Realm { key, domain })
    }

    /// Resolve the service endpoint for a region.
    ///
    /// Returns `https://<service>.<region>.<domain>`.
    pub async fn resolve(&self, region: &str, service: &str) -> String {
        let region = self.canonical_region(region);
        let realm = self.realm_for(&region).await;
        format!("https://{service}.{region}.{}", realm.domain)
    }

    /// Resolve an endpoint template.
    ///
    /// `{region}` is replaced with the region identifier and
    /// `{secondLevelDomain}` with the realm domain.
    pub async fn resolve_template(&self, region: &str, template: &str) -> String {
        let region = self.canonical_region(region);
        let realm = self.realm_for(&region).await;
        template
            .replace("{region}", &region)
            .replace("{secondLevelDomain}", &realm.domain)
    }

    /// Find the realm for a canonical region id, learning it if necessary.
    async fn realm_for(&self, region: &str) -> Realm {
        if let Some(realm) = self.realm_of(region) {
            return realm;
        }

        let _guard = self.learn_lock.lock().await;

        // Another caller may have learned it while we waited.
        if let Some(realm) = self.realm_of(region) {
            return realm;
        }

        for slot in &self.sources {
            if slot.tried.swap(true, Ordering::SeqCst) {
                continue;
            }

            let name = slot.source.name();
            match slot.source.fetch().await {
                Ok(records) => {
                    for record in &records {
                        match self.register(record) {
                            Ok(()) => info!(
                                source = name,
                                region = %record.region_identifier,
                                realm = %record.realm_key,
                                "learned region metadata"
                            ),
                            Err(e) => debug!(source = name, error = %e, "skipping region record"),
                        }
                    }
                    if let Some(realm) = self.realm_of(region) {
                        return realm;
                    }
                }
                Err(e) => debug!(source = name, error = %e, "region metadata source failed"),
            }
        }

        warn!(
            region,
            realm = DEFAULT_REALM,
            "unknown region, falling back to the default realm domain"
        );
        self.default_realm()
    }

    fn default_realm(&self) -> Realm {
        let domain = self
            .realms
            .get(DEFAULT_REALM)
            .map_or_else(|| "oraclecloud.com".to_owned(), |d| d.value().clone());
        Realm {
            key: DEFAULT_REALM.to_owned(),
            domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Debug)]
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        records: Vec<RegionMetadata>,
    }

    #[async_trait]
    impl RegionMetadataSource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch(&self) -> CoreResult<Vec<RegionMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(self.records.clone())
        }
    }

    #[derive(Debug)]
    struct FailingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RegionMetadataSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self) -> CoreResult<Vec<RegionMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::SourceUnavailable("failing"))
        }
    }

    fn metadata(region: &str, code: &str, realm: &str, domain: &str) -> RegionMetadata {
        RegionMetadata {
            realm_key: realm.to_owned(),
            realm_domain_component: domain.to_owned(),
            region_key: code.to_owned(),
            region_identifier: region.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_should_resolve_known_region() {
        let registry = RegionRegistry::new();
        assert_eq!(
            registry.resolve("us-ashburn-1", "objectstorage").await,
            "https://objectstorage.us-ashburn-1.oraclecloud.com"
        );
        assert_eq!(
            registry.resolve("uk-gov-london-1", "iaas").await,
            "https://iaas.uk-gov-london-1.oraclegovcloud.uk"
        );
    }

    #[tokio::test]
    async fn test_should_expand_short_codes() {
        let registry = RegionRegistry::new();
        assert_eq!(
            registry.region_for_short_code("PHX").as_deref(),
            Some("us-phoenix-1")
        );
        assert_eq!(
            registry.resolve("phx", "iaas").await,
            "https://iaas.us-phoenix-1.oraclecloud.com"
        );
    }

    #[tokio::test]
    async fn test_should_resolve_template() {
        let registry = RegionRegistry::new();
        let url = registry
            .resolve_template(
                "ap-chiyoda-1",
                "https://telemetry-ingestion.{region}.{secondLevelDomain}",
            )
            .await;
        assert_eq!(url, "https://telemetry-ingestion.ap-chiyoda-1.oraclecloud8.com");
    }

    #[tokio::test]
    async fn test_should_learn_unknown_region_from_source() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = RegionRegistry::new().with_source(CountingSource {
            calls: Arc::clone(&calls),
            records: vec![metadata("xx-mars-1", "MRS", "oc42", "marscloud.example")],
        });

        let first = registry.resolve("xx-mars-1", "iaas").await;
        let second = registry.resolve("xx-mars-1", "iaas").await;

        assert_eq!(first, "https://iaas.xx-mars-1.marscloud.example");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            registry.region_for_short_code("mrs").as_deref(),
            Some("xx-mars-1")
        );
    }

    #[tokio::test]
    async fn test_should_try_each_source_once_and_fall_back_to_default_realm() {
        let failing = Arc::new(AtomicUsize::new(0));
        let counting = Arc::new(AtomicUsize::new(0));
        let registry = RegionRegistry::new()
            .with_source(FailingSource {
                calls: Arc::clone(&failing),
            })
            .with_source(CountingSource {
                calls: Arc::clone(&counting),
                records: vec![],
            });

        let first = registry.resolve("xx-unknown-1", "iaas").await;
        let second = registry.resolve("xx-unknown-1", "iaas").await;

        assert_eq!(first, "https://iaas.xx-unknown-1.oraclecloud.com");
        assert_eq!(first, second);
        assert_eq!(failing.load(Ordering::SeqCst), 1);
        assert_eq!(counting.load(Ordering::SeqCst), 1);
        assert!(!registry.contains("xx-unknown-1"));
    }

    #[tokio::test]
    async fn test_should_register_once_under_concurrent_first_use() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(RegionRegistry::new().with_source(CountingSource {
            calls: Arc::clone(&calls),
            records: vec![metadata("xx-venus-1", "VNS", "oc1", "oraclecloud.com")],
        }));
        let before = registry.len();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.resolve("xx-venus-1", "iaas").await
            }));
        }
        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                "https://iaas.xx-venus-1.oraclecloud.com"
            );
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), before + 1);
    }

    #[test]
    fn test_should_keep_existing_entries_on_reregistration() {
        let registry = RegionRegistry::new();
        registry
            .register(&metadata("us-phoenix-1", "PHX", "oc9", "elsewhere.example"))
            .unwrap();
        assert_eq!(registry.realm_of("us-phoenix-1").unwrap().key, "oc1");
    }

    #[test]
    fn test_should_reject_incomplete_metadata() {
        let registry = RegionRegistry::new();
        let err = registry
            .register(&metadata("xx-empty-1", "", "oc1", "oraclecloud.com"))
            .unwrap_err();
        assert!(matches!(err, CoreError::RegionMetadata(_)));
    }

    #[tokio::test]
    async fn test_should_read_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"realmKey":"OC77","realmDomainComponent":"example.cloud","regionKey":"ABC","regionIdentifier":"xx-file-1"}}]"#
        )
        .unwrap();

        let source = FileRegionSource::new(file.path());
        let records = source.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region_identifier, "xx-file-1");

        let registry = RegionRegistry::new().with_source(source);
        assert_eq!(
            registry.resolve("xx-file-1", "iaas").await,
            "https://iaas.xx-file-1.example.cloud"
        );
    }

    #[tokio::test]
    async fn test_should_report_missing_file_as_unavailable() {
        let source = FileRegionSource::new("/definitely/not/here.json");
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CoreError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_should_report_unset_env_var_as_unavailable() {
        let source = EnvRegionSource::new("OCISDK_TEST_REGION_METADATA_NEVER_SET");
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CoreError::SourceUnavailable(_)));
    }
}

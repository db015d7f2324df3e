//! Descriptor resolution: turning a [`ConfigurationDescriptor`] into document bytes.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kestrel_common::ContentHash;

use crate::descriptor::{ConfigurationDescriptor, ConfigurationType};
use crate::error::ResolutionError;
use crate::properties::MapPropertyResolver;
use crate::tokens::untokenise_path;

/// Resource name of the built-in default configuration.
pub const DEFAULT_CONFIG: &str = "/default_checks.xml";

/// Resource name of the built-in strict configuration.
pub const STRICT_CONFIG: &str = "/strict_checks.xml";

/// Property set to the document's directory unless overridden.
pub const CONFIG_LOC_PROPERTY: &str = "config_loc";

/// The raw bytes of a configuration document plus where they came from.
#[derive(Clone, Debug)]
pub struct ResolvedDocument {
    /// The document content.
    pub bytes: Vec<u8>,
    /// Directory relative references inside the document resolve against.
    pub base_dir: Option<PathBuf>,
    /// The file the bytes were read from, for staleness checks.
    pub source_path: Option<PathBuf>,
}

impl ResolvedDocument {
    /// Builds the placeholder resolver for this document.
    ///
    /// The descriptor's override properties win; `config_loc` falls back to
    /// the document's base directory.
    pub fn property_resolver(&self, descriptor: &ConfigurationDescriptor) -> MapPropertyResolver {
        let mut values = BTreeMap::new();
        if let Some(dir) = self.base_dir.as_deref().and_then(Path::to_str) {
            values.insert(CONFIG_LOC_PROPERTY.to_string(), dir.to_string());
        }
        for (name, value) in descriptor.properties() {
            values.insert(name.clone(), value.clone());
        }
        MapPropertyResolver::new(values)
    }
}

/// Fetches configuration documents.
pub trait ConfigurationResolver: Send + Sync {
    /// Reads the document a descriptor names.
    fn resolve(
        &self,
        descriptor: &ConfigurationDescriptor,
    ) -> Result<ResolvedDocument, ResolutionError>;
}

/// Configuration documents compiled into the binary, keyed by resource name.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedDocuments {
    documents: BTreeMap<String, Cow<'static, str>>,
}

impl EmbeddedDocuments {
    /// Returns the built-in documents: [`DEFAULT_CONFIG`] and [`STRICT_CONFIG`].
    pub fn builtin() -> Self {
        let mut docs = Self::default();
        docs.insert(DEFAULT_CONFIG, include_str!("../resources/default_checks.xml"));
        docs.insert(STRICT_CONFIG, include_str!("../resources/strict_checks.xml"));
        docs
    }

    /// Registers a document under `name`.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<Cow<'static, str>>) {
        self.documents.insert(name.into(), text.into());
    }

    /// Returns the document registered under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.documents.get(name).map(|text| text.as_ref())
    }

    /// Returns every registered resource name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

/// Downloads remote documents and keeps a copy on disk.
///
/// Each URL maps to a cache file named by the hash of the URL. An existing
/// cache file is served without touching the network until
/// [`forget`](Self::forget) removes it.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    cache_dir: PathBuf,
    timeout: Duration,
}

impl HttpFetcher {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a fetcher caching into `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the cache file used for `url`.
    pub fn cache_path(&self, url: &str) -> PathBuf {
        let hash = ContentHash::from_bytes(url.as_bytes());
        self.cache_dir.join(format!("{hash}.xml"))
    }

    /// Returns the local copy of `url`, downloading it if needed.
    pub fn fetch(&self, url: &str) -> Result<PathBuf, ResolutionError> {
        let cache_file = self.cache_path(url);
        if cache_file.exists() {
            tracing::debug!(url, path = %cache_file.display(), "serving cached configuration");
            return Ok(cache_file);
        }

        tracing::info!(url, "downloading configuration");
        let http_err = |reason: String| ResolutionError::Http {
            url: url.to_string(),
            reason,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| http_err(e.to_string()))?;
        let response = client
            .get(url)
            .header("Accept", "application/xml, text/xml, */*")
            .send()
            .map_err(|e| http_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(http_err(format!("HTTP {}", response.status())));
        }
        let body = response.bytes().map_err(|e| http_err(e.to_string()))?;

        self.store(&cache_file, &body)?;
        Ok(cache_file)
    }

    /// Writes `body` to `cache_file` through a temporary file in the cache
    /// directory, so readers see either no file or the complete document.
    fn store(&self, cache_file: &Path, body: &[u8]) -> Result<(), ResolutionError> {
        let io_err = |source| ResolutionError::Io {
            path: cache_file.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(&self.cache_dir).map_err(io_err)?;
        let mut staged = tempfile::NamedTempFile::new_in(&self.cache_dir).map_err(io_err)?;
        staged.write_all(body).map_err(io_err)?;
        staged.persist(cache_file).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Drops the cached copy of `url`. Returns `true` if one existed.
    pub fn forget(&self, url: &str) -> std::io::Result<bool> {
        match std::fs::remove_file(self.cache_path(url)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Resolves descriptors from embedded resources, local disk, and HTTP.
#[derive(Clone, Debug)]
pub struct DefaultResolver {
    project_dir: Option<PathBuf>,
    embedded: EmbeddedDocuments,
    http: HttpFetcher,
}

impl DefaultResolver {
    /// Creates a resolver with the built-in documents and a temp-dir HTTP cache.
    pub fn new() -> Self {
        Self {
            project_dir: None,
            embedded: EmbeddedDocuments::builtin(),
            http: HttpFetcher::new(std::env::temp_dir().join("kestrel-http-cache")),
        }
    }

    /// Sets the project directory that tokens and relative paths expand against.
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Registers an additional embedded document.
    pub fn with_embedded(
        mut self,
        name: impl Into<String>,
        text: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.embedded.insert(name, text);
        self
    }

    /// Replaces the HTTP fetcher.
    pub fn with_http(mut self, http: HttpFetcher) -> Self {
        self.http = http;
        self
    }

    /// Returns the HTTP fetcher.
    pub fn http(&self) -> &HttpFetcher {
        &self.http
    }

    /// Returns the embedded documents.
    pub fn embedded(&self) -> &EmbeddedDocuments {
        &self.embedded
    }

    /// Expands a local-file location into an absolute path.
    pub fn expand_location(&self, location: &str) -> Result<PathBuf, ResolutionError> {
        let expanded = untokenise_path(location, self.project_dir.as_deref())
            .ok_or_else(|| ResolutionError::UnresolvedToken(location.to_string()))?;
        let path = PathBuf::from(expanded);
        match &self.project_dir {
            Some(dir) if path.is_relative() => Ok(dir.join(path)),
            _ => Ok(path),
        }
    }

    fn read_file(path: &Path) -> Result<Vec<u8>, ResolutionError> {
        std::fs::read(path).map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationResolver for DefaultResolver {
    fn resolve(
        &self,
        descriptor: &ConfigurationDescriptor,
    ) -> Result<ResolvedDocument, ResolutionError> {
        tracing::debug!(
            kind = %descriptor.kind(),
            location = descriptor.location(),
            "resolving configuration"
        );
        match descriptor.kind() {
            ConfigurationType::Classpath => {
                let text = self.embedded.get(descriptor.location()).ok_or_else(|| {
                    ResolutionError::MissingResource(descriptor.location().to_string())
                })?;
                Ok(ResolvedDocument {
                    bytes: text.as_bytes().to_vec(),
                    base_dir: None,
                    source_path: None,
                })
            }
            ConfigurationType::LocalFile => {
                let path = self.expand_location(descriptor.location())?;
                let bytes = Self::read_file(&path)?;
                Ok(ResolvedDocument {
                    bytes,
                    base_dir: path.parent().map(Path::to_path_buf),
                    source_path: Some(path),
                })
            }
            ConfigurationType::HttpUrl => {
                let path = self.http.fetch(descriptor.location())?;
                let bytes = Self::read_file(&path)?;
                Ok(ResolvedDocument {
                    bytes,
                    base_dir: None,
                    source_path: Some(path),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::PROJECT_DIR_TOKEN;
    use std::fs;

    #[test]
    fn embedded_default_resolves() {
        let resolver = DefaultResolver::new();
        let doc = resolver
            .resolve(&ConfigurationDescriptor::classpath(DEFAULT_CONFIG, "Default"))
            .unwrap();
        let text = String::from_utf8(doc.bytes).unwrap();
        assert!(text.contains(r#"<module name="Checker">"#));
        assert!(doc.base_dir.is_none());
        assert!(doc.source_path.is_none());
    }

    #[test]
    fn missing_embedded_resource() {
        let err = DefaultResolver::new()
            .resolve(&ConfigurationDescriptor::classpath("/nope.xml", ""))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::MissingResource(ref n) if n == "/nope.xml"));
    }

    #[test]
    fn extra_embedded_document() {
        let resolver =
            DefaultResolver::new().with_embedded("/custom.xml", "<module name=\"Checker\"/>");
        let doc = resolver
            .resolve(&ConfigurationDescriptor::classpath("/custom.xml", ""))
            .unwrap();
        assert_eq!(doc.bytes, b"<module name=\"Checker\"/>");
    }

    #[test]
    fn local_file_with_project_token() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        let file = dir.path().join("config/checks.xml");
        fs::write(&file, "<module name=\"Checker\"/>").unwrap();

        let resolver = DefaultResolver::new().with_project_dir(dir.path());
        let descriptor = ConfigurationDescriptor::local_file(
            format!("{PROJECT_DIR_TOKEN}/config/checks.xml"),
            "Project",
        );
        let doc = resolver.resolve(&descriptor).unwrap();
        assert_eq!(doc.source_path.as_deref(), Some(file.as_path()));
        assert_eq!(doc.base_dir.as_deref(), Some(dir.path().join("config").as_path()));
    }

    #[test]
    fn relative_local_file_joins_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rules.xml"), "x").unwrap();
        let resolver = DefaultResolver::new().with_project_dir(dir.path());
        let doc = resolver
            .resolve(&ConfigurationDescriptor::local_file("rules.xml", ""))
            .unwrap();
        assert_eq!(doc.bytes, b"x");
    }

    #[test]
    fn token_without_project_dir() {
        let err = DefaultResolver::new()
            .resolve(&ConfigurationDescriptor::local_file("$PROJECT_DIR$/a.xml", ""))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::UnresolvedToken(_)));
    }

    #[test]
    fn missing_local_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.xml");
        let err = DefaultResolver::new()
            .resolve(&ConfigurationDescriptor::local_file(missing.to_str().unwrap(), ""))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Io { ref path, .. } if path == &missing));
    }

    #[test]
    fn http_cache_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpFetcher::new(dir.path());
        let url = "http://unreachable.invalid/checks.xml";
        fs::write(fetcher.cache_path(url), "<module name=\"Checker\"/>").unwrap();

        let resolver = DefaultResolver::new().with_http(fetcher.clone());
        let doc = resolver
            .resolve(&ConfigurationDescriptor::http_url(url, "Remote"))
            .unwrap();
        assert_eq!(doc.bytes, b"<module name=\"Checker\"/>");
        assert!(fetcher.forget(url).unwrap());
        assert!(!fetcher.forget(url).unwrap());
    }

    #[test]
    fn stored_download_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpFetcher::new(dir.path().join("http"));
        let url = "http://unreachable.invalid/shared.xml";
        let cache_file = fetcher.cache_path(url);

        fetcher.store(&cache_file, b"<module name=\"Checker\"/>").unwrap();
        let newer = b"<module name=\"Checker\"><module name=\"LineLength\"/></module>";
        fetcher.store(&cache_file, newer).unwrap();

        assert_eq!(fs::read(&cache_file).unwrap(), newer);
        let names: Vec<_> = fs::read_dir(dir.path().join("http"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(names, vec![cache_file.clone()]);
        assert_eq!(fetcher.fetch(url).unwrap(), cache_file);
    }

    #[test]
    fn cache_path_is_stable_per_url() {
        let fetcher = HttpFetcher::new("/tmp/c");
        assert_eq!(fetcher.cache_path("http://a/x"), fetcher.cache_path("http://a/x"));
        assert_ne!(fetcher.cache_path("http://a/x"), fetcher.cache_path("http://a/y"));
    }

    #[test]
    fn property_resolver_prefers_overrides() {
        use crate::properties::PropertyResolver;
        let doc = ResolvedDocument {
            bytes: Vec::new(),
            base_dir: Some(PathBuf::from("/rules")),
            source_path: None,
        };
        let plain = ConfigurationDescriptor::local_file("/rules/a.xml", "");
        assert_eq!(doc.property_resolver(&plain).resolve("config_loc").as_deref(), Some("/rules"));

        let overridden = plain.with_property("config_loc", "/elsewhere");
        assert_eq!(
            doc.property_resolver(&overridden).resolve("config_loc").as_deref(),
            Some("/elsewhere")
        );
    }
}

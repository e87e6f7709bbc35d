//! On-disk cache stores keyed by version name
//!
//! Layout under the caches directory:
//!
//! ```text
//! caches/
//!   <hex(store name)>/
//!     store.json          # name + creation time
//!     <entry key>.json    # response metadata
//!     <entry key>.body    # response body
//! ```
//!
//! An entry is only visible once its metadata file exists; the body is
//! written first.

use crate::error::{IdeError, IdeResult};
use crate::fetch::{Method, Request, Response, ResponseType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const STORE_MANIFEST: &str = "store.json";

/// Manifest written into every store directory
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreManifest {
    name: String,
    created_at: DateTime<Utc>,
}

/// Metadata for one cached response
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedEntry {
    method: Method,
    url: String,
    status: u16,
    response_type: ResponseType,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Summary of a store, for status output
#[derive(Debug, Clone, Serialize)]
pub struct StoreInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub entries: usize,
}

/// Collection of named cache stores
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    /// Use `root` as the caches directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Caches directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }

    /// Open a store, creating it if needed
    pub async fn open(&self, name: &str) -> IdeResult<CacheStore> {
        let dir = self.store_dir(name);
        let manifest_path = dir.join(STORE_MANIFEST);

        if !manifest_path.exists() {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| IdeError::io(format!("creating cache store {}", name), e))?;
            let manifest = StoreManifest {
                name: name.to_string(),
                created_at: Utc::now(),
            };
            fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
                .await
                .map_err(|e| IdeError::io(format!("writing manifest of {}", name), e))?;
            debug!("Created cache store {}", name);
        }

        Ok(CacheStore {
            name: name.to_string(),
            dir,
        })
    }

    /// Whether a store with this name exists
    pub fn has(&self, name: &str) -> bool {
        self.store_dir(name).join(STORE_MANIFEST).exists()
    }

    /// Names of all stores, oldest first
    pub async fn keys(&self) -> IdeResult<Vec<String>> {
        Ok(self
            .manifests()
            .await?
            .into_iter()
            .map(|(manifest, _)| manifest.name)
            .collect())
    }

    /// Delete a store. Returns whether it existed.
    pub async fn delete(&self, name: &str) -> IdeResult<bool> {
        let dir = self.store_dir(name);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| IdeError::io(format!("deleting cache store {}", name), e))?;
        debug!("Deleted cache store {}", name);
        Ok(true)
    }

    /// Find a cached response for `request` in any store, oldest store first
    pub async fn match_any(&self, request: &Request) -> IdeResult<Option<Response>> {
        for (manifest, dir) in self.manifests().await? {
            let store = CacheStore {
                name: manifest.name,
                dir,
            };
            if let Some(response) = store.match_request(request).await? {
                debug!("Cache hit for {} in {}", request.url, store.name);
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Describe every store
    pub async fn describe(&self) -> IdeResult<Vec<StoreInfo>> {
        let mut infos = vec![];
        for (manifest, dir) in self.manifests().await? {
            let store = CacheStore {
                name: manifest.name.clone(),
                dir,
            };
            infos.push(StoreInfo {
                name: manifest.name,
                created_at: manifest.created_at,
                entries: store.len().await?,
            });
        }
        Ok(infos)
    }

    async fn manifests(&self) -> IdeResult<Vec<(StoreManifest, PathBuf)>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut found = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| IdeError::io("reading caches directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| IdeError::io("reading cache store entry", e))?
        {
            let dir = entry.path();
            let content = fs::read_to_string(dir.join(STORE_MANIFEST)).await.ok();
            if let Some(content) = content {
                if let Ok(manifest) = serde_json::from_str::<StoreManifest>(&content) {
                    found.push((manifest, dir));
                }
            }
        }

        found.sort_by(|a, b| a.0.created_at.cmp(&b.0.created_at));
        Ok(found)
    }
}

/// A single named store
#[derive(Debug, Clone)]
pub struct CacheStore {
    name: String,
    dir: PathBuf,
}

impl CacheStore {
    /// Store name (the cache version)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response for a request, replacing any previous entry
    pub async fn put(&self, request: &Request, response: &Response) -> IdeResult<()> {
        let key = request.cache_key();
        let body_path = self.dir.join(format!("{}.body", key));
        let meta_path = self.dir.join(format!("{}.json", key));

        fs::write(&body_path, &response.body)
            .await
            .map_err(|e| IdeError::io(format!("writing cached body for {}", request.url), e))?;

        let entry = CachedEntry {
            method: request.method,
            url: request.url.clone(),
            status: response.status,
            response_type: response.response_type,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };
        fs::write(&meta_path, serde_json::to_string_pretty(&entry)?)
            .await
            .map_err(|e| IdeError::io(format!("writing cache entry for {}", request.url), e))?;

        Ok(())
    }

    /// Look up the response cached for a request
    pub async fn match_request(&self, request: &Request) -> IdeResult<Option<Response>> {
        let key = request.cache_key();
        let meta_path = self.dir.join(format!("{}.json", key));
        if !meta_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&meta_path)
            .await
            .map_err(|e| IdeError::io(format!("reading cache entry for {}", request.url), e))?;
        let entry: CachedEntry = serde_json::from_str(&content)?;
        let body = fs::read(self.dir.join(format!("{}.body", key)))
            .await
            .map_err(|e| IdeError::io(format!("reading cached body for {}", request.url), e))?;

        Ok(Some(Response {
            status: entry.status,
            url: entry.url,
            response_type: entry.response_type,
            headers: entry.headers,
            body,
        }))
    }

    /// Number of complete entries
    pub async fn len(&self) -> IdeResult<usize> {
        let mut count = 0;
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| IdeError::io(format!("reading cache store {}", self.name), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| IdeError::io("reading cache entry", e))?
        {
            let path = entry.path();
            let is_entry = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|n| n != STORE_MANIFEST);
            if is_entry {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Whether the store has no entries
    pub async fn is_empty(&self) -> IdeResult<bool> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn html(url: &str, body: &str) -> Response {
        Response {
            status: 200,
            url: url.to_string(),
            response_type: ResponseType::Basic,
            headers: vec![("content-type".into(), "text/html".into())],
            body: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn put_and_match() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let store = storage.open("v1").await.unwrap();

        let request = Request::get("http://localhost:8080/index.html");
        store
            .put(&request, &html(&request.url, "<h1>shell</h1>"))
            .await
            .unwrap();

        let cached = store.match_request(&request).await.unwrap().unwrap();
        assert_eq!(cached.body, b"<h1>shell</h1>");
        assert_eq!(cached.header("Content-Type"), Some("text/html"));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn keys_and_delete() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        storage.open("ide-v1").await.unwrap();
        storage.open("ide/v2").await.unwrap();

        let keys = storage.keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"ide/v2".to_string()));

        assert!(storage.delete("ide-v1").await.unwrap());
        assert!(!storage.delete("ide-v1").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["ide/v2".to_string()]);
    }

    #[tokio::test]
    async fn match_any_searches_all_stores() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let request = Request::get("http://localhost:8080/app.js");

        storage.open("v1").await.unwrap();
        let v2 = storage.open("v2").await.unwrap();
        v2.put(&request, &html(&request.url, "js")).await.unwrap();

        let hit = storage.match_any(&request).await.unwrap().unwrap();
        assert_eq!(hit.body, b"js");

        let miss = storage
            .match_any(&Request::get("http://localhost:8080/other"))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn match_distinguishes_methods() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let store = storage.open("v1").await.unwrap();
        let get = Request::get("http://localhost:8080/exec");
        store.put(&get, &html(&get.url, "page")).await.unwrap();

        let post = Request::post("http://localhost:8080/exec", "{}");
        assert!(store.match_request(&post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_root_has_no_keys() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path().join("missing"));
        assert!(storage.keys().await.unwrap().is_empty());
        assert!(storage.describe().await.unwrap().is_empty());
    }
}

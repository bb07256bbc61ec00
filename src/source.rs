//! Data-source layer: where the raw survey CSV comes from and when it gets
//! re-parsed.
//!
//! Both source kinds produce the same thing, CSV text plus a signature
//! string. The cache keeps the last parsed dataset keyed by that signature,
//! so repeated dashboard interactions against an unchanged source skip both
//! the download and the parse.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::columns::ColumnMap;
use crate::loader;
use crate::types::{LoadReport, SurveyRecord};
use chrono::NaiveDateTime;

/// Where the raw survey CSV lives.
#[derive(Debug, Clone)]
pub enum DataSource {
    Local {
        path: PathBuf,
    },
    Remote {
        url: String,
        /// Re-use the previous fetch without any HTTP request while younger
        /// than this.
        ttl: Duration,
        /// Local file to read when the fetch fails.
        fallback: Option<PathBuf>,
    },
}

/// Canonical records plus the counters from the ingestion pass that
/// produced them.
#[derive(Debug)]
pub struct Dataset {
    pub records: Vec<SurveyRecord>,
    pub report: LoadReport,
}

impl Dataset {
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.records.iter().map(|r| r.timestamp).min()?;
        let max = self.records.iter().map(|r| r.timestamp).max()?;
        Some((min, max))
    }
}

/// How a `load` call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Source content was (re-)parsed.
    Parsed,
    /// Remote TTL not yet expired; previous dataset reused without a fetch.
    CacheFresh,
    /// Source signature unchanged; previous dataset reused without a parse.
    CacheSignature,
}

struct CacheEntry {
    signature: String,
    loaded_at: Instant,
    dataset: Dataset,
}

enum Outcome {
    Cached(LoadStatus),
    Parse { signature: String, text: String },
}

/// Last parsed dataset, keyed by source signature.
#[derive(Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
}

impl DatasetCache {
    pub fn dataset(&self) -> Option<&Dataset> {
        self.entry.as_ref().map(|e| &e.dataset)
    }

    /// Load the dataset through the cache. Returns the dataset and how it
    /// was obtained.
    pub fn load(
        &mut self,
        source: &DataSource,
        columns: &ColumnMap,
    ) -> Result<(&Dataset, LoadStatus)> {
        let status = match self.resolve(source)? {
            Outcome::Cached(status) => status,
            Outcome::Parse { signature, text } => {
                let (records, report) = loader::load_records(&text, columns)?;
                info!(
                    "parsed dataset: {} rows read, {} kept ({})",
                    report.total_rows, report.loaded_rows, signature
                );
                self.entry = Some(CacheEntry {
                    signature,
                    loaded_at: Instant::now(),
                    dataset: Dataset { records, report },
                });
                LoadStatus::Parsed
            }
        };
        match &self.entry {
            Some(e) => Ok((&e.dataset, status)),
            None => anyhow::bail!("no dataset loaded"),
        }
    }

    fn resolve(&mut self, source: &DataSource) -> Result<Outcome> {
        match source {
            DataSource::Local { path } => self.resolve_local(path),
            DataSource::Remote { url, ttl, fallback } => {
                if let Some(e) = &self.entry {
                    if e.loaded_at.elapsed() < *ttl {
                        debug!("remote source within TTL, reusing dataset");
                        return Ok(Outcome::Cached(LoadStatus::CacheFresh));
                    }
                }
                info!("fetching survey data from {}", url);
                match fetch_remote(url) {
                    Ok(body) => {
                        let signature = content_fingerprint(&body);
                        if self.is_current(&signature) {
                            debug!("remote content unchanged ({})", signature);
                            if let Some(e) = &mut self.entry {
                                e.loaded_at = Instant::now();
                            }
                            return Ok(Outcome::Cached(LoadStatus::CacheSignature));
                        }
                        Ok(Outcome::Parse {
                            signature,
                            text: body,
                        })
                    }
                    Err(err) => match fallback {
                        Some(path) => {
                            warn!(
                                "remote fetch failed ({:#}), falling back to {}",
                                err,
                                path.display()
                            );
                            self.resolve_local(path)
                        }
                        None => {
                            Err(err.context(format!("fetching survey data from {}", url)))
                        }
                    },
                }
            }
        }
    }

    fn resolve_local(&self, path: &Path) -> Result<Outcome> {
        let signature = file_signature(path)?;
        if self.is_current(&signature) {
            debug!("file signature unchanged ({})", signature);
            return Ok(Outcome::Cached(LoadStatus::CacheSignature));
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading survey data file {}", path.display()))?;
        Ok(Outcome::Parse { signature, text })
    }

    fn is_current(&self, signature: &str) -> bool {
        self.entry
            .as_ref()
            .map_or(false, |e| e.signature == signature)
    }
}

/// Modification-time signature for a local file.
fn file_signature(path: &Path) -> Result<String> {
    let meta = fs::metadata(path)
        .with_context(|| format!("no survey data file at {}", path.display()))?;
    let mtime = meta
        .modified()
        .context("file modification time unavailable")?;
    let secs = mtime
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    Ok(format!("mtime:{}:len:{}", secs, meta.len()))
}

/// Content fingerprint for fetched bodies.
pub fn content_fingerprint(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

fn fetch_remote(url: &str) -> Result<String> {
    let resp = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .context("HTTP request failed")?;
    resp.text().context("reading HTTP response body")
}

//! Consul KV adapter: implements the `KvStore` port over the HTTP API.

use std::io::Read;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use daybook_common::{BoxError, DaybookError, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{KvEntry, KvStore};

/// Default agent address when neither config nor `CONSUL_HTTP_ADDR` is set.
pub const DEFAULT_CONSUL_ADDR: &str = "http://127.0.0.1:8500";

/// Characters escaped inside one key segment. `/` separates segments and is
/// never part of this set's input.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// One element of a `/v1/kv` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvPair {
    key: String,
    /// Base64, or `null` for keys stored without a value.
    value: Option<String>,
    modify_index: u64,
}

/// `KvStore` backed by a Consul agent.
pub struct ConsulKv {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl ConsulKv {
    /// `addr` may omit the scheme, as `CONSUL_HTTP_ADDR` usually does.
    #[must_use]
    pub fn new(addr: &str, token: Option<String>, timeout: Duration) -> Self {
        let addr = addr.trim_end_matches('/');
        let base_url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/v1/kv/{}", self.base_url, encode_key(key))
    }

    fn request(&self, method: &str, key: &str) -> ureq::Request {
        let req = self
            .agent
            .request(method, &self.url(key))
            .set("User-Agent", concat!("daybook/", env!("CARGO_PKG_VERSION")));
        match &self.token {
            Some(token) => req.set("X-Consul-Token", token),
            None => req,
        }
    }

    /// `Ok(None)` on 404.
    fn read_pairs(&self, key: &str, recurse: bool) -> Result<Option<Vec<KvEntry>>> {
        let operation = format!("reading consul key {key}");
        let req = self.request("GET", key);
        let req = if recurse { req.query("recurse", "true") } else { req };
        match req.call() {
            Ok(resp) => parse_pairs(resp.into_reader())
                .map(Some)
                .map_err(|e| DaybookError::transport(operation, e)),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(err) => Err(DaybookError::transport(operation, err)),
        }
    }

    fn write(&self, key: &str, value: &[u8], cas: Option<u64>) -> Result<bool> {
        let operation = format!("writing consul key {key}");
        let req = self.request("PUT", key);
        let req = match cas {
            Some(index) => req.query("cas", &index.to_string()),
            None => req,
        };
        let resp = req
            .send_bytes(value)
            .map_err(|e| DaybookError::transport(operation.clone(), e))?;
        let body = resp
            .into_string()
            .map_err(|e| DaybookError::transport(operation, e))?;
        Ok(body.trim() == "true")
    }
}

impl KvStore for ConsulKv {
    fn list(&self, prefix: &str) -> Result<Vec<KvEntry>> {
        let entries = self.read_pairs(prefix, true)?.unwrap_or_default();
        debug!(prefix, count = entries.len(), "listed consul keys");
        Ok(entries)
    }

    fn get(&self, key: &str) -> Result<Option<KvEntry>> {
        Ok(self
            .read_pairs(key, false)?
            .and_then(|pairs| pairs.into_iter().find(|entry| entry.key == key)))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        if self.write(key, value, None)? {
            Ok(())
        } else {
            Err(DaybookError::transport(
                format!("writing consul key {key}"),
                "agent refused the write",
            ))
        }
    }

    fn put_if_revision(&self, key: &str, value: &[u8], expected: Option<u64>) -> Result<bool> {
        // Consul treats `cas=0` as "only if the key does not exist".
        self.write(key, value, Some(expected.unwrap_or(0)))
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn parse_pairs(body: impl Read) -> std::result::Result<Vec<KvEntry>, BoxError> {
    let pairs: Vec<KvPair> = serde_json::from_reader(body)?;
    pairs
        .into_iter()
        .map(|pair| -> std::result::Result<KvEntry, BoxError> {
            let value = match pair.value {
                Some(encoded) => STANDARD.decode(encoded)?,
                None => Vec::new(),
            };
            Ok(KvEntry {
                key: pair.key,
                value,
                revision: pair.modify_index,
            })
        })
        .collect()
}

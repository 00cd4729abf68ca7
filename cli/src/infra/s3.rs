//! S3 adapter: implements the blocking `ObjectStore` port on top of the
//! async AWS SDK.
//!
//! The client is built on the command's Tokio runtime and each port call
//! drives one SDK future to completion with [`Handle::block_on`]. Callers
//! must therefore be on a blocking-capable thread, which the command layer
//! guarantees by running services under `tokio::task::block_in_place`.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use daybook_common::{DaybookError, Result};
use tokio::runtime::Handle;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, warn};

use crate::application::ports::{ObjectReader, ObjectStore};

/// Bodies up to this size go up in one `PutObject`; larger ones use a
/// multipart upload with parts of this size.
pub const PART_SIZE: usize = 8 * 1024 * 1024;

/// Static credentials taken from the config file or the environment.
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection settings for [`S3ObjectStore::connect`].
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// Custom endpoint (MinIO, localstack). `None` means AWS for `region`.
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    pub credentials: Credentials,
    /// Connect and read timeout for every request.
    pub timeout: Duration,
}

/// `ObjectStore` backed by one S3 bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    runtime: Handle,
}

impl S3ObjectStore {
    /// Build the SDK client. Must be called from inside a Tokio runtime;
    /// the store keeps a handle to it for the blocking port calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an `http` or `https` URL.
    pub async fn connect(settings: S3Settings) -> anyhow::Result<Self> {
        if let Some(endpoint) = &settings.endpoint {
            let host = endpoint
                .strip_prefix("http://")
                .or_else(|| endpoint.strip_prefix("https://"))
                .ok_or_else(|| anyhow::anyhow!("S3 endpoint '{endpoint}' must be an http(s) URL"))?;
            if host.trim_matches('/').is_empty() {
                anyhow::bail!("S3 endpoint '{endpoint}' has no host");
            }
        }

        let credentials = aws_sdk_s3::config::Credentials::new(
            settings.credentials.access_key,
            settings.credentials.secret_key,
            settings.credentials.session_token,
            None,
            "daybook-config",
        );
        // Failures surface as Transport errors and are never retried.
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(settings.timeout)
                    .read_timeout(settings.timeout)
                    .build(),
            );
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint.trim_end_matches('/'));
        }
        let sdk_config = loader.load().await;

        // Path-style keeps bucket names with dots and custom endpoints working.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: settings.bucket,
            runtime: Handle::current(),
        })
    }

    fn put_single(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let operation = format!("uploading s3://{}/{key}", self.bucket);
        let length = i64::try_from(body.len())
            .map_err(|e| DaybookError::transport(operation.clone(), e))?;
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .content_type(content_type)
                    .content_length(length)
                    .acl(ObjectCannedAcl::Private)
                    .body(ByteStream::from(body))
                    .send(),
            )
            .map_err(|e| DaybookError::transport(operation, e))?;
        Ok(())
    }

    fn put_multipart(
        &self,
        key: &str,
        first: Vec<u8>,
        reader: &mut dyn Read,
        content_type: &str,
    ) -> Result<()> {
        let operation = format!("uploading s3://{}/{key}", self.bucket);
        let created = self
            .runtime
            .block_on(
                self.client
                    .create_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .content_type(content_type)
                    .acl(ObjectCannedAcl::Private)
                    .send(),
            )
            .map_err(|e| DaybookError::transport(operation.clone(), e))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| DaybookError::transport(operation.clone(), "no upload id in response"))?
            .to_string();

        match self.upload_parts(key, &upload_id, first, reader) {
            Ok(parts) => {
                self.runtime
                    .block_on(
                        self.client
                            .complete_multipart_upload()
                            .bucket(&self.bucket)
                            .key(key)
                            .upload_id(&upload_id)
                            .multipart_upload(
                                CompletedMultipartUpload::builder()
                                    .set_parts(Some(parts))
                                    .build(),
                            )
                            .send(),
                    )
                    .map_err(|e| DaybookError::transport(operation, e))?;
                Ok(())
            }
            Err(err) => {
                let aborted = self.runtime.block_on(
                    self.client
                        .abort_multipart_upload()
                        .bucket(&self.bucket)
                        .key(key)
                        .upload_id(&upload_id)
                        .send(),
                );
                if let Err(abort_err) = aborted {
                    warn!(key, %upload_id, error = %abort_err, "failed to abort multipart upload");
                }
                Err(err)
            }
        }
    }

    fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        first: Vec<u8>,
        reader: &mut dyn Read,
    ) -> Result<Vec<CompletedPart>> {
        let operation = format!("uploading s3://{}/{key}", self.bucket);
        let mut parts = Vec::new();
        let mut chunk = first;
        let mut number: i32 = 1;

        while !chunk.is_empty() {
            let out = self
                .runtime
                .block_on(
                    self.client
                        .upload_part()
                        .bucket(&self.bucket)
                        .key(key)
                        .upload_id(upload_id)
                        .part_number(number)
                        .body(ByteStream::from(chunk))
                        .send(),
                )
                .map_err(|e| DaybookError::transport(operation.clone(), e))?;
            parts.push(
                CompletedPart::builder()
                    .set_e_tag(out.e_tag().map(str::to_string))
                    .part_number(number)
                    .build(),
            );
            number += 1;
            chunk = read_chunk(reader, PART_SIZE)
                .map_err(|e| DaybookError::io(format!("reading upload body for {key}"), e))?;
        }
        debug!(key, parts = parts.len(), "uploaded parts");
        Ok(parts)
    }
}

impl ObjectStore for S3ObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let operation = format!("listing s3://{}/{prefix}", self.bucket);
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .runtime
                .block_on(
                    self.client
                        .list_objects_v2()
                        .bucket(&self.bucket)
                        .prefix(prefix)
                        .set_continuation_token(continuation.take())
                        .send(),
                )
                .map_err(|e| DaybookError::transport(operation.clone(), e))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        debug!(prefix, count = keys.len(), "listed objects");
        Ok(keys)
    }

    fn get_reader(&self, key: &str) -> Result<ObjectReader> {
        let operation = format!("fetching s3://{}/{key}", self.bucket);
        let sent = self.runtime.block_on(
            self.client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send(),
        );
        match sent {
            Ok(out) => {
                let body = out.body.into_async_read();
                let reader: ObjectReader =
                    Box::new(SyncIoBridge::new_with_handle(body, self.runtime.clone()));
                Ok(reader)
            }
            Err(err) if is_missing(&err) => Err(DaybookError::not_found(format!("object {key}"))),
            Err(err) => Err(DaybookError::transport(operation, err)),
        }
    }

    fn put_reader(
        &self,
        key: &str,
        mut reader: ObjectReader,
        size: u64,
        content_type: &str,
    ) -> Result<()> {
        let first = read_chunk(&mut reader, PART_SIZE)
            .map_err(|e| DaybookError::io(format!("reading upload body for {key}"), e))?;
        if first.len() < PART_SIZE {
            self.put_single(key, first, content_type)?;
        } else {
            self.put_multipart(key, first, &mut reader, content_type)?;
        }
        debug!(key, size, "uploaded object");
        Ok(())
    }
}

/// A missing key: `NoSuchKey`, or a bare 404 from stores that omit the code.
fn is_missing(err: &SdkError<GetObjectError>) -> bool {
    err.as_service_error().is_some_and(GetObjectError::is_no_such_key)
        || err
            .raw_response()
            .is_some_and(|raw| raw.status().as_u16() == 404)
}

/// Read up to `limit` bytes; shorter only at end of input.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    reader.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

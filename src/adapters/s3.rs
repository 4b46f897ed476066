use std::{future::Future, time::Duration};

use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use crate::{adapters, config::BindingConfig, error::StorageError, model, util};

/// Region used for request signing when none is configured.
const DEFAULT_REGION: &str = "us-east-1";

/// Runtime owned by one client, usable from plain threads and from tasks of
/// a caller's own tokio runtime.
struct BlockingRuntime {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl BlockingRuntime {
    fn new() -> Result<Self, StorageError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("objectbinding-s3")
            .build()
            .map_err(|err| StorageError::new(format!("failed to build runtime: {}", err)))?;

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Runs `fut` to completion on the owned runtime, blocking the caller.
    fn block_on<F>(&self, fut: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        let handle = &self.handle;

        match Handle::try_current() {
            Err(_) => handle.block_on(fut),
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(fut))
            }
            // a current_thread worker cannot block in place
            Ok(_) => std::thread::scope(|s| {
                s.spawn(|| handle.block_on(fut))
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            }),
        }
    }
}

impl Drop for BlockingRuntime {
    fn drop(&mut self) {
        // dropping a runtime blocks, which panics inside an async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// S3-compatible backend driving the async SDK on its own runtime.
pub struct S3Client {
    client: aws_sdk_s3::Client,
    runtime: BlockingRuntime,
    endpoint_url: String,
}

impl S3Client {
    pub fn new(config: &BindingConfig) -> Result<Self, StorageError> {
        let runtime = BlockingRuntime::new()?;

        let endpoint_url = util::endpoint::endpoint_url(&config.endpoint, config.ssl);
        let region = if config.region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            config.region.clone()
        };
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let sdk_config = runtime.block_on(
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(region))
                .credentials_provider(credentials)
                .endpoint_url(&endpoint_url)
                .load(),
        );
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            runtime,
            endpoint_url,
        })
    }

    fn descriptor(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
        size: i64,
    ) -> model::object::ObjectDescriptor {
        model::object::ObjectDescriptor {
            location: util::endpoint::object_location(&self.endpoint_url, bucket, key),
            version_id: version_id.map(str::to_string),
            key: key.to_string(),
            size: size.max(0) as u64,
        }
    }
}

fn storage_error<E: std::error::Error>(call: &str, target: &str, err: E) -> StorageError {
    StorageError::new(format!(
        "failed to {} at: {}, {}",
        call,
        target,
        DisplayErrorContext(err)
    ))
}

impl adapters::ObjectAdapter for S3Client {
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        let req = self.client.head_bucket().bucket(bucket);

        match self.runtime.block_on(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(false);
                    }
                }

                Err(storage_error("head_bucket", bucket, err))
            }
            Ok(_) => Ok(true),
        }
    }

    fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), StorageError> {
        let mut req = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the implicit location and must not be sent as a constraint
        if !region.is_empty() && region != DEFAULT_REGION {
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        self.runtime
            .block_on(req.send())
            .map_err(|err| storage_error("create_bucket", bucket, err))?;

        Ok(())
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<model::object::ObjectDescriptor, StorageError> {
        let size = body.len() as i64;
        let req = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(size)
            .body(ByteStream::from(body));

        let po = self
            .runtime
            .block_on(req.send())
            .map_err(|err| storage_error("put_object", key, err))?;

        Ok(self.descriptor(bucket, key, po.version_id(), size))
    }

    fn get_object<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn adapters::ObjectReader + 'a>, StorageError> {
        let req = self.client.head_object().bucket(bucket).key(key);

        let ho = self
            .runtime
            .block_on(req.send())
            .map_err(|err| storage_error("head_object", key, err))?;

        Ok(Box::new(S3ObjectReader {
            client: self,
            bucket: bucket.to_string(),
            object: self.descriptor(
                bucket,
                key,
                ho.version_id(),
                ho.content_length().unwrap_or(0),
            ),
        }))
    }

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let req = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .bypass_governance_retention(true);

        self.runtime
            .block_on(req.send())
            .map_err(|err| storage_error("delete_object", key, err))?;

        Ok(())
    }

    fn list_objects(
        &self,
        bucket: &str,
    ) -> Vec<Result<model::object::ObjectDescriptor, StorageError>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket);

            if let Some(tok) = continuation_token {
                req = req.continuation_token(tok);
            }

            let lo = match self.runtime.block_on(req.send()) {
                Err(err) => {
                    objects.push(Err(storage_error("list_objects", bucket, err)));
                    break;
                }
                Ok(lo) => lo,
            };

            for o in lo.contents() {
                let entry = match o.key() {
                    Some(key) => Ok(self.descriptor(bucket, key, None, o.size().unwrap_or(0))),
                    None => Err(StorageError::new(format!(
                        "listed object without key in: {}",
                        bucket
                    ))),
                };
                objects.push(entry);
            }

            continuation_token = lo.next_continuation_token().map(|tok| tok.to_string());
            if continuation_token.is_none() {
                break;
            }
        }

        return objects;
    }

    fn presigned_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires)
            .map_err(|err| storage_error("presign", key, err))?;

        let req = self.client.get_object().bucket(bucket).key(key);
        let presigned = self
            .runtime
            .block_on(req.presigned(presigning))
            .map_err(|err| storage_error("presign", key, err))?;

        Ok(presigned.uri().to_string())
    }
}

pub struct S3ObjectReader<'a> {
    client: &'a S3Client,
    bucket: String,
    object: model::object::ObjectDescriptor,
}

impl adapters::ObjectReader for S3ObjectReader<'_> {
    fn stat(&self) -> Result<model::object::ObjectDescriptor, StorageError> {
        Ok(self.object.clone())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, StorageError> {
        if buf.is_empty() {
            return Ok(0);
        }

        let key = self.object.key.as_str();
        let req = self
            .client
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes={}-{}", offset, offset + buf.len() as u64 - 1));

        let bytes = self.client.runtime.block_on(async {
            let o = req
                .send()
                .await
                .map_err(|err| storage_error("get_object", key, err))?;

            let data = o
                .body
                .collect()
                .await
                .map_err(|err| storage_error("collect body", key, err))?;

            Ok::<_, StorageError>(data.into_bytes())
        })?;

        fill_range(buf, &bytes, key, offset)
    }
}

/// Copies a ranged response into `buf`, returning the bytes copied.
///
/// A response longer than the requested range means the backend ignored the
/// `Range` header and sent the object from its start.
fn fill_range(buf: &mut [u8], bytes: &[u8], key: &str, offset: u64) -> Result<usize, StorageError> {
    if bytes.len() > buf.len() {
        return Err(StorageError::new(format!(
            "failed to read range at: {}, got {} bytes for {} at offset {}",
            key,
            bytes.len(),
            buf.len(),
            offset
        )));
    }

    buf[..bytes.len()].copy_from_slice(bytes);

    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ObjectAdapter;

    fn config(endpoint: &str, region: &str) -> BindingConfig {
        BindingConfig {
            endpoint: endpoint.to_string(),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            bucket: "fos".to_string(),
            region: region.to_string(),
            ssl: false,
        }
    }

    fn assert_presigned(client: &S3Client, expected_prefix: &str) {
        let url = client
            .presigned_get_object("fos", "test_file", Duration::from_secs(60))
            .unwrap();

        assert!(url.starts_with(expected_prefix), "failed for case: {}", url);
        assert!(url.contains("X-Amz-Expires=60"), "failed for case: {}", url);
        assert!(url.contains("X-Amz-Signature="), "failed for case: {}", url);
    }

    #[test]
    fn test_presigned_get_object() {
        let cases = vec![
            ("localhost:9000", "", "http://localhost:9000/fos/test_file?"),
            ("https://play.min.io", "lb-1", "https://play.min.io/fos/test_file?"),
        ];

        for (endpoint, region, expected_prefix) in cases {
            let client = S3Client::new(&config(endpoint, region)).unwrap();
            assert_presigned(&client, expected_prefix);
        }
    }

    #[test]
    fn test_presigned_get_object_expiry_too_long() {
        let client = S3Client::new(&config("localhost:9000", "")).unwrap();

        let expires = Duration::from_secs(8 * 24 * 3600);
        let res = client.presigned_get_object("fos", "test_file", expires);
        assert!(res.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_client_inside_multi_thread_runtime() {
        let client = S3Client::new(&config("localhost:9000", "")).unwrap();

        assert_presigned(&client, "http://localhost:9000/fos/test_file?");
        drop(client);
    }

    #[tokio::test]
    async fn test_client_inside_current_thread_runtime() {
        let client = S3Client::new(&config("localhost:9000", "")).unwrap();

        assert_presigned(&client, "http://localhost:9000/fos/test_file?");
        drop(client);
    }

    #[test]
    fn test_fill_range() {
        let cases = vec![
            ("exact", 4, "abcd", Some(4)),
            ("short", 4, "ab", Some(2)),
            ("empty", 4, "", Some(0)),
            ("range ignored", 4, "abcdefgh", None),
        ];

        for (name, len, body, expected) in cases {
            let mut buf = vec![0u8; len];
            let res = fill_range(&mut buf, body.as_bytes(), "test_file", 4);

            assert_eq!(res.as_ref().ok().copied(), expected, "failed for case: {}", name);
            if let Some(n) = expected {
                assert_eq!(&buf[..n], &body.as_bytes()[..n], "failed for case: {}", name);
            }
        }
    }
}

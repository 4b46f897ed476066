use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use crate::{adapters, error::StorageError, model};

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct MockClient {
    buckets: Mutex<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashSet<&'static str>>,
    list_errors: Mutex<Vec<String>>,
    read_limit: Mutex<Option<usize>>,
    reads: Mutex<Vec<(u64, usize)>>,
    released: AtomicUsize,
}

impl MockClient {
    pub fn with_bucket(bucket: &str) -> Self {
        let client = Self::default();
        client
            .buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .insert(bucket.to_string(), BTreeMap::new());

        return client;
    }

    /// Makes every later call named `call` fail. `stat` and `read_at` apply
    /// to readers returned by `get_object`.
    pub fn fail(&self, call: &'static str) {
        self.failures
            .lock()
            .expect("failed to acquire `failures` guard")
            .insert(call);
    }

    /// Appends a broken entry to every listing.
    pub fn inject_list_error(&self, message: &str) {
        self.list_errors
            .lock()
            .expect("failed to acquire `list_errors` guard")
            .push(message.to_string());
    }

    /// Caps the bytes a single `read_at` returns, simulating short reads.
    pub fn limit_reads(&self, limit: usize) {
        *self
            .read_limit
            .lock()
            .expect("failed to acquire `read_limit` guard") = Some(limit);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("failed to acquire `calls` guard")
            .clone()
    }

    /// Offset and length of every `read_at` issued so far.
    pub fn reads(&self) -> Vec<(u64, usize)> {
        self.reads
            .lock()
            .expect("failed to acquire `reads` guard")
            .clone()
    }

    /// Number of readers dropped so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    fn record(&self, call: &'static str) -> Result<(), StorageError> {
        self.calls
            .lock()
            .expect("failed to acquire `calls` guard")
            .push(call.to_string());

        if self.is_failing(call) {
            return Err(StorageError::new(format!("mock {} failure", call)));
        }

        Ok(())
    }

    fn is_failing(&self, call: &'static str) -> bool {
        self.failures
            .lock()
            .expect("failed to acquire `failures` guard")
            .contains(call)
    }

    fn location(bucket: &str, key: &str) -> String {
        format!("mock://{}/{}", bucket, key)
    }
}

impl adapters::ObjectAdapter for MockClient {
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        self.record("bucket_exists")?;

        let buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
        Ok(buckets.contains_key(bucket))
    }

    fn make_bucket(&self, bucket: &str, _region: &str) -> Result<(), StorageError> {
        self.record("make_bucket")?;

        let mut buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
        if buckets.contains_key(bucket) {
            return Err(StorageError::new(format!("bucket already exists: {}", bucket)));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());

        Ok(())
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<model::object::ObjectDescriptor, StorageError> {
        self.record("put_object")?;

        let mut buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::new(format!("bucket not found: {}", bucket)))?;

        let size = body.len() as u64;
        objects.insert(key.to_string(), body);

        Ok(model::object::ObjectDescriptor {
            location: Self::location(bucket, key),
            version_id: None,
            key: key.to_string(),
            size,
        })
    }

    fn get_object<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn adapters::ObjectReader + 'a>, StorageError> {
        self.record("get_object")?;

        let buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
        let data = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| StorageError::new(format!("object not found: {}", key)))?
            .clone();

        Ok(Box::new(MockReader {
            client: self,
            object: model::object::ObjectDescriptor {
                location: Self::location(bucket, key),
                version_id: None,
                key: key.to_string(),
                size: data.len() as u64,
            },
            data,
        }))
    }

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.record("remove_object")?;

        let mut buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
        if let Some(objects) = buckets.get_mut(bucket) {
            objects.remove(key);
        }

        Ok(())
    }

    fn list_objects(
        &self,
        bucket: &str,
    ) -> Vec<Result<model::object::ObjectDescriptor, StorageError>> {
        if let Err(err) = self.record("list_objects") {
            return vec![Err(err)];
        }

        let buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
        let mut entries: Vec<_> = buckets
            .get(bucket)
            .into_iter()
            .flatten()
            .map(|(key, data)| {
                Ok(model::object::ObjectDescriptor {
                    location: Self::location(bucket, key),
                    version_id: None,
                    key: key.clone(),
                    size: data.len() as u64,
                })
            })
            .collect();

        for message in self
            .list_errors
            .lock()
            .expect("failed to acquire `list_errors` guard")
            .iter()
        {
            entries.push(Err(StorageError::new(message.clone())));
        }

        return entries;
    }

    fn presigned_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        self.record("presigned_get_object")?;

        Ok(format!(
            "{}?X-Amz-Expires={}",
            Self::location(bucket, key),
            expires.as_secs()
        ))
    }
}

pub struct MockReader<'a> {
    client: &'a MockClient,
    object: model::object::ObjectDescriptor,
    data: Vec<u8>,
}

impl adapters::ObjectReader for MockReader<'_> {
    fn stat(&self) -> Result<model::object::ObjectDescriptor, StorageError> {
        if self.client.is_failing("stat") {
            return Err(StorageError::new("mock stat failure"));
        }

        Ok(self.object.clone())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, StorageError> {
        self.client
            .reads
            .lock()
            .expect("failed to acquire `reads` guard")
            .push((offset, buf.len()));

        if self.client.is_failing("read_at") {
            return Err(StorageError::new("mock read_at failure"));
        }

        let start = (offset as usize).min(self.data.len());
        let mut end = (start + buf.len()).min(self.data.len());
        if let Some(limit) = *self
            .client
            .read_limit
            .lock()
            .expect("failed to acquire `read_limit` guard")
        {
            end = end.min(start + limit);
        }

        let n = end - start;
        buf[..n].copy_from_slice(&self.data[start..end]);

        Ok(n)
    }
}

impl Drop for MockReader<'_> {
    fn drop(&mut self) {
        self.client.released.fetch_add(1, Ordering::SeqCst);
    }
}

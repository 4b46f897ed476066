use std::time::Duration;

use crate::{error::StorageError, model};

pub mod mock;
pub mod s3;

/// Opened object that can be read at arbitrary offsets.
///
/// Dropping the reader releases whatever the backend holds for it.
pub trait ObjectReader: Send {
    fn stat(&self) -> Result<model::object::ObjectDescriptor, StorageError>;

    /// Reads into `buf` starting at `offset`, returning the number of bytes read.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, StorageError>;
}

/// Storage backend consumed by the binding.
///
/// Implementations must be safe to share between concurrent invocations.
pub trait ObjectAdapter: Send + Sync {
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;

    fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), StorageError>;

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<model::object::ObjectDescriptor, StorageError>;

    fn get_object<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ObjectReader + 'a>, StorageError>;

    /// Removes an object, bypassing governance retention.
    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Lists every object in the bucket recursively. Entries that could not be
    /// produced are reported in place as errors.
    fn list_objects(
        &self,
        bucket: &str,
    ) -> Vec<Result<model::object::ObjectDescriptor, StorageError>>;

    fn presigned_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires: Duration,
    ) -> Result<String, StorageError>;
}

impl<T: ObjectAdapter + ?Sized> ObjectAdapter for std::sync::Arc<T> {
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        (**self).bucket_exists(bucket)
    }

    fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), StorageError> {
        (**self).make_bucket(bucket, region)
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<model::object::ObjectDescriptor, StorageError> {
        (**self).put_object(bucket, key, body)
    }

    fn get_object<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ObjectReader + 'a>, StorageError> {
        (**self).get_object(bucket, key)
    }

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        (**self).remove_object(bucket, key)
    }

    fn list_objects(
        &self,
        bucket: &str,
    ) -> Vec<Result<model::object::ObjectDescriptor, StorageError>> {
        (**self).list_objects(bucket)
    }

    fn presigned_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        (**self).presigned_get_object(bucket, key, expires)
    }
}

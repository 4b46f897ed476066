use std::{collections::HashMap, time::Duration};

use tracing::{error, info, span, warn, Level};

use crate::{
    binding,
    error::{BindingError, Result},
    model::{
        binding::{InvokeRequest, InvokeResponse, Operation},
        object::{CreateResponse, FileInfoResponse},
    },
    reader, util,
};

pub const OBJECT_NAME: &str = "objectName";
pub const EXPIRES: &str = "expires";

/// Parameters of operations addressing a single object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectParams {
    pub object_name: String,
}

impl ObjectParams {
    pub fn from_metadata(operation: Operation, metadata: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            object_name: required(operation, metadata, OBJECT_NAME)?.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresignParams {
    pub object_name: String,
    pub expires: Duration,
}

impl PresignParams {
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self> {
        let operation = Operation::PresignedGet;
        let object_name = required(operation, metadata, OBJECT_NAME)?.to_string();

        let value = metadata.get(EXPIRES).ok_or(BindingError::MissingField {
            operation,
            field: EXPIRES,
        })?;
        let expires =
            util::duration::parse_duration(value).map_err(|reason| BindingError::InvalidField {
                operation,
                field: EXPIRES,
                value: value.clone(),
                reason,
            })?;

        Ok(Self {
            object_name,
            expires,
        })
    }
}

fn required<'a>(
    operation: Operation,
    metadata: &'a HashMap<String, String>,
    field: &'static str,
) -> Result<&'a str> {
    match metadata.get(field) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(BindingError::MissingField { operation, field }),
    }
}

impl binding::ObjectBinding {
    pub(crate) fn create(&self, req: &InvokeRequest) -> Result<InvokeResponse> {
        let span = span!(Level::INFO, "create", context = "create");
        let _e = span.enter();

        let params = ObjectParams::from_metadata(Operation::Create, &req.metadata)?;
        info!(key = %params.object_name, size = req.data.len(), "called");

        let body = util::quote::unquote(&req.data).unwrap_or_else(|| req.data.clone());

        let object = self
            .client
            .put_object(&self.bucket, &params.object_name, body)
            .map_err(|source| {
                error!(error_message=%source, error_group="put_object");
                BindingError::Upload {
                    key: params.object_name.clone(),
                    source,
                }
            })?;

        let data = serde_json::to_vec(&CreateResponse::from(object)).map_err(|source| {
            BindingError::Serialization {
                operation: Operation::Create,
                source,
            }
        })?;

        Ok(InvokeResponse {
            data,
            metadata: None,
        })
    }

    pub(crate) fn get(&self, req: &InvokeRequest) -> Result<InvokeResponse> {
        let span = span!(Level::INFO, "get", context = "get");
        let _e = span.enter();

        let params = ObjectParams::from_metadata(Operation::Get, &req.metadata)?;
        info!(key = %params.object_name, "called");

        let not_found_or_read = |group: &str, source: Box<dyn std::error::Error + Send + Sync>| {
            error!(error_message=%source, error_group=group);
            BindingError::NotFoundOrRead {
                key: params.object_name.clone(),
                source,
            }
        };

        let object_reader = self
            .client
            .get_object(&self.bucket, &params.object_name)
            .map_err(|err| not_found_or_read("get_object", err.into()))?;

        let stat = object_reader
            .stat()
            .map_err(|err| not_found_or_read("stat", err.into()))?;

        let data = reader::read_all(object_reader.as_ref(), stat.size)
            .map_err(|err| not_found_or_read("read_all", err.into()))?;
        drop(object_reader);

        Ok(InvokeResponse {
            data,
            metadata: Some(FileInfoResponse::from(&stat).into_metadata()),
        })
    }

    pub(crate) fn delete(&self, req: &InvokeRequest) -> Result<()> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();

        let params = ObjectParams::from_metadata(Operation::Delete, &req.metadata)?;
        info!(key = %params.object_name, "called");

        self.client
            .remove_object(&self.bucket, &params.object_name)
            .map_err(|source| {
                error!(error_message=%source, error_group="remove_object");
                BindingError::Removal {
                    key: params.object_name.clone(),
                    source,
                }
            })
    }

    pub(crate) fn list(&self, _req: &InvokeRequest) -> Result<InvokeResponse> {
        let span = span!(Level::INFO, "list", context = "list");
        let _e = span.enter();
        info!(bucket = %self.bucket, "called");

        let mut objects = Vec::new();
        for entry in self.client.list_objects(&self.bucket) {
            match entry {
                Err(err) => {
                    warn!(error_message=%err, error_group="list_objects", "skipping object");
                    continue;
                }
                Ok(object) => objects.push(FileInfoResponse::from(&object)),
            }
        }

        let data = serde_json::to_vec(&objects).map_err(|source| {
            error!(error_message=%source, error_group="serialize");
            BindingError::Serialization {
                operation: Operation::List,
                source,
            }
        })?;

        Ok(InvokeResponse {
            data,
            metadata: None,
        })
    }

    pub(crate) fn presigned_get(&self, req: &InvokeRequest) -> Result<InvokeResponse> {
        let span = span!(Level::INFO, "presigned_get", context = "presigned_get");
        let _e = span.enter();

        let params = PresignParams::from_metadata(&req.metadata)?;
        info!(key = %params.object_name, expires = ?params.expires, "called");

        let url = self
            .client
            .presigned_get_object(&self.bucket, &params.object_name, params.expires)
            .map_err(|source| {
                error!(error_message=%source, error_group="presigned_get_object");
                BindingError::Presign {
                    key: params.object_name.clone(),
                    source,
                }
            })?;

        Ok(InvokeResponse {
            data: url.into_bytes(),
            metadata: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{adapters::mock::MockClient, binding::ObjectBinding};

    fn binding() -> (Arc<MockClient>, ObjectBinding) {
        let client = Arc::new(MockClient::with_bucket("dummy-bucket"));
        let binding =
            ObjectBinding::with_client(Box::new(client.clone()), "dummy-bucket", "").unwrap();
        return (client, binding);
    }

    fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn put(binding: &ObjectBinding, key: &str, data: &[u8]) {
        let req = InvokeRequest::new("create")
            .with_data(data)
            .with_metadata(OBJECT_NAME, key);
        binding.create(&req).unwrap();
    }

    #[test]
    fn test_object_params() {
        let cases = vec![
            (vec![(OBJECT_NAME, "file")], Some("file")),
            (vec![(OBJECT_NAME, "")], None),
            (vec![("name", "file")], None),
            (vec![], None),
        ];

        for (pairs, expected) in cases {
            let res = ObjectParams::from_metadata(Operation::Get, &metadata(&pairs));
            assert_eq!(
                res.ok().map(|p| p.object_name),
                expected.map(str::to_string),
                "failed for case: {:?}",
                pairs
            );
        }
    }

    #[test]
    fn test_presign_params() {
        let res =
            PresignParams::from_metadata(&metadata(&[(OBJECT_NAME, "file"), (EXPIRES, "10m")]));
        assert_eq!(
            res.unwrap(),
            PresignParams {
                object_name: "file".to_string(),
                expires: Duration::from_secs(600),
            }
        );

        let res = PresignParams::from_metadata(&metadata(&[(OBJECT_NAME, "file")]));
        assert!(matches!(res, Err(BindingError::MissingField { field: EXPIRES, .. })));

        let res = PresignParams::from_metadata(&metadata(&[(EXPIRES, "10m")]));
        assert!(matches!(res, Err(BindingError::MissingField { field: OBJECT_NAME, .. })));

        let res = PresignParams::from_metadata(&metadata(&[(OBJECT_NAME, "file"), (EXPIRES, "")]));
        assert!(matches!(res, Err(BindingError::InvalidField { field: EXPIRES, .. })));
    }

    #[test]
    fn test_create_unquotes_payload() {
        let (client, binding) = binding();

        let cases = vec![
            ("quoted", "\"test content\"", "test content"),
            ("escaped", "\"a\\tb\"", "a\tb"),
            ("octal_hex", "\"\\101\\x42\"", "AB"),
            ("single", "'\\n'", "\n"),
            ("slash", "\"a\\/b\"", "\"a\\/b\""),
            ("raw", "test content", "test content"),
            ("broken", "\"unterminated", "\"unterminated"),
            ("json", "{\"key\":\"value\"}", "{\"key\":\"value\"}"),
        ];

        for (key, payload, expected) in cases {
            put(&binding, key, payload.as_bytes());

            let req = InvokeRequest::new("get").with_metadata(OBJECT_NAME, key);
            let res = binding.get(&req).unwrap();
            assert_eq!(res.data, expected.as_bytes(), "failed for case: {}", key);
        }
        assert_eq!(client.released(), 8);
    }

    #[test]
    fn test_create_response() {
        let (_, binding) = binding();

        let req = InvokeRequest::new("create")
            .with_data("test content")
            .with_metadata(OBJECT_NAME, "folder/test_file");
        let res = binding.create(&req).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&res.data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "location": "mock://dummy-bucket/folder/test_file",
                "versionID": "",
                "key": "folder/test_file",
            })
        );
    }

    #[test]
    fn test_create_upload_error() {
        let (client, binding) = binding();
        client.fail("put_object");

        let req = InvokeRequest::new("create")
            .with_data("x")
            .with_metadata(OBJECT_NAME, "file");
        match binding.create(&req) {
            Err(BindingError::Upload { key, .. }) => assert_eq!(key, "file"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_get_empty_object() {
        let (client, binding) = binding();
        put(&binding, "empty", b"");

        let req = InvokeRequest::new("get").with_metadata(OBJECT_NAME, "empty");
        let res = binding.get(&req).unwrap();

        assert!(res.data.is_empty());
        assert_eq!(res.metadata.unwrap()["size"], "0");
        assert!(client.reads().is_empty());
    }

    #[test]
    fn test_get_large_object() {
        let (_, binding) = binding();
        let body: Vec<u8> = (0..reader::READ_BUFFER_MAX * 3 + 17)
            .map(|i| (i % 256) as u8)
            .collect();
        put(&binding, "large", &body);

        let req = InvokeRequest::new("get").with_metadata(OBJECT_NAME, "large");
        let res = binding.get(&req).unwrap();

        assert_eq!(res.data, body);
        assert_eq!(res.metadata.unwrap()["size"], body.len().to_string());
    }

    #[test]
    fn test_get_releases_reader() {
        let cases = vec![
            ("missing", None, 0),
            ("file", Some("stat"), 1),
            ("file", Some("read_at"), 1),
            ("file", None, 1),
        ];

        for (key, failure, expected_released) in cases {
            let (client, binding) = binding();
            put(&binding, "file", b"test content");
            if let Some(call) = failure {
                client.fail(call);
            }

            let req = InvokeRequest::new("get").with_metadata(OBJECT_NAME, key);
            let res = binding.get(&req);

            if key == "missing" || failure.is_some() {
                assert!(
                    matches!(res, Err(BindingError::NotFoundOrRead { .. })),
                    "failed on `result` for case: {} {:?}",
                    key,
                    failure
                );
            } else {
                assert!(res.is_ok());
            }
            assert_eq!(
                client.released(),
                expected_released,
                "failed on `released` for case: {} {:?}",
                key,
                failure
            );
        }
    }

    #[test]
    fn test_delete() {
        let (client, binding) = binding();
        put(&binding, "file", b"x");

        let req = InvokeRequest::new("delete").with_metadata(OBJECT_NAME, "file");
        binding.delete(&req).unwrap();
        assert!(!client.contains("dummy-bucket", "file"));

        client.fail("remove_object");
        match binding.delete(&req) {
            Err(BindingError::Removal { key, .. }) => assert_eq!(key, "file"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_list_empty_bucket() {
        let (_, binding) = binding();

        let res = binding.list(&InvokeRequest::new("list")).unwrap();

        assert_eq!(res.data, b"[]");
        assert!(res.metadata.is_none());
    }

    #[test]
    fn test_list_skips_broken_entries() {
        let (client, binding) = binding();
        put(&binding, "a", b"1");
        put(&binding, "folder/b", b"22");
        client.inject_list_error("corrupt entry");

        let res = binding.list(&InvokeRequest::new("list")).unwrap();
        let entries: Vec<FileInfoResponse> = serde_json::from_slice(&res.data).unwrap();

        assert_eq!(
            entries,
            vec![
                FileInfoResponse {
                    size: "1".to_string(),
                    version_id: String::new(),
                    key: "a".to_string(),
                },
                FileInfoResponse {
                    size: "2".to_string(),
                    version_id: String::new(),
                    key: "folder/b".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_list_failure_yields_empty_listing() {
        let (client, binding) = binding();
        put(&binding, "a", b"1");
        client.fail("list_objects");

        let res = binding.list(&InvokeRequest::new("list")).unwrap();
        assert_eq!(res.data, b"[]");
    }

    #[test]
    fn test_presigned_get_invalid_expires() {
        let (client, binding) = binding();
        let calls = client.calls().len();

        let cases = vec!["not-a-duration", "60", "-1s", ""];
        for expires in cases {
            let req = InvokeRequest::new("presignedGet")
                .with_metadata(OBJECT_NAME, "file")
                .with_metadata(EXPIRES, expires);
            let err = binding.presigned_get(&req).unwrap_err();
            assert!(err.is_validation(), "failed for case: {}", expires);
        }

        let req = InvokeRequest::new("presignedGet").with_metadata(OBJECT_NAME, "file");
        assert!(binding.presigned_get(&req).unwrap_err().is_validation());

        assert_eq!(client.calls().len(), calls);
    }

    #[test]
    fn test_presigned_get_backend_error() {
        let (client, binding) = binding();
        client.fail("presigned_get_object");

        let req = InvokeRequest::new("presignedGet")
            .with_metadata(OBJECT_NAME, "file")
            .with_metadata(EXPIRES, "1h");
        assert!(matches!(
            binding.presigned_get(&req),
            Err(BindingError::Presign { .. })
        ));
    }
}

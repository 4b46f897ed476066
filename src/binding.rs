use std::collections::HashMap;

use tracing::{error, info, span, Level};

use crate::{
    adapters,
    config::BindingConfig,
    error::{BindingError, Result},
    model::binding::{InvokeRequest, InvokeResponse, Operation},
};

/// Output binding exposing generic object operations on one bucket.
///
/// A value only exists once its bucket has been verified or created, so every
/// operation runs against a provisioned bucket.
pub struct ObjectBinding {
    pub(crate) client: Box<dyn adapters::ObjectAdapter>,
    pub(crate) bucket: String,
    pub(crate) region: String,
}

impl ObjectBinding {
    /// Connects to the S3-compatible endpoint described by `properties`.
    pub fn init(properties: &HashMap<String, String>) -> Result<Self> {
        let config = BindingConfig::from_properties(properties)?;

        let client = adapters::s3::S3Client::new(&config).map_err(|source| {
            BindingError::Initialization {
                bucket: config.bucket.clone(),
                source,
            }
        })?;

        Self::with_client(Box::new(client), &config.bucket, &config.region)
    }

    pub fn with_client(
        client: Box<dyn adapters::ObjectAdapter>,
        bucket: &str,
        region: &str,
    ) -> Result<Self> {
        ensure_container(client.as_ref(), bucket, region)?;

        Ok(Self {
            client,
            bucket: bucket.to_string(),
            region: region.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn operations(&self) -> Vec<Operation> {
        Operation::ALL.to_vec()
    }

    pub fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Routes a request to the handler of its operation.
    ///
    /// Returns `Ok(None)` for operations without a response body.
    pub fn invoke(&self, req: Option<&InvokeRequest>) -> Result<Option<InvokeResponse>> {
        let span = span!(Level::INFO, "invoke", context = "invoke");
        let _e = span.enter();

        let req = match req {
            None => {
                let err = BindingError::Validation("invoke request required".to_string());
                error!(error_message=%err, error_group="validate_request");
                return Err(err);
            }
            Some(req) => req,
        };
        info!(operation=%req.operation, "called");

        let operation = match req.operation.parse::<Operation>() {
            Err(err) => {
                error!(error_message=%err, error_group="dispatch");
                return Err(err);
            }
            Ok(operation) => operation,
        };

        match operation {
            Operation::Create => self.create(req).map(Some),
            Operation::Get => self.get(req).map(Some),
            Operation::Delete => self.delete(req).map(|_| None),
            Operation::List => self.list(req).map(Some),
            Operation::PresignedGet => self.presigned_get(req).map(Some),
        }
    }
}

/// Makes sure `bucket` exists, creating it in `region` when it does not.
pub fn ensure_container(
    client: &dyn adapters::ObjectAdapter,
    bucket: &str,
    region: &str,
) -> Result<()> {
    let span = span!(Level::INFO, "ensure_container", context = "init");
    let _e = span.enter();
    info!(bucket = bucket, region = region, "called");

    let exists = client.bucket_exists(bucket).map_err(|source| {
        error!(error_message=%source, error_group="bucket_exists");
        BindingError::Initialization {
            bucket: bucket.to_string(),
            source,
        }
    })?;

    if exists {
        return Ok(());
    }

    client.make_bucket(bucket, region).map_err(|source| {
        error!(error_message=%source, error_group="make_bucket");
        BindingError::Provisioning {
            bucket: bucket.to_string(),
            source,
        }
    })?;
    info!(bucket = bucket, "bucket created");

    Ok(())
}

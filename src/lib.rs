//! Output binding exposing create, get, delete, list and presignedGet
//! operations on a single bucket of an S3-compatible object store.
//!
//! ```no_run
//! use std::collections::HashMap;
//!
//! use objectbinding::{InvokeRequest, ObjectBinding};
//!
//! let properties = HashMap::from([
//!     ("endpoint".to_string(), "localhost:9000".to_string()),
//!     ("accessKey".to_string(), "minio".to_string()),
//!     ("secretKey".to_string(), "minio123".to_string()),
//!     ("bucket".to_string(), "fos".to_string()),
//! ]);
//! let binding = ObjectBinding::init(&properties)?;
//!
//! let req = InvokeRequest::new("get").with_metadata("objectName", "test_file");
//! let res = binding.invoke(Some(&req))?;
//! # Ok::<(), objectbinding::BindingError>(())
//! ```

pub mod adapters;
pub mod binding;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod reader;
mod util;

pub use binding::{ensure_container, ObjectBinding};
pub use config::BindingConfig;
pub use error::{BindingError, Result, StorageError};
pub use model::binding::{InvokeRequest, InvokeResponse, Operation};

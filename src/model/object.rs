use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata of a stored object as reported by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub location: String,
    pub version_id: Option<String>,
    pub key: String,
    pub size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub location: String,
    #[serde(rename = "versionID")]
    pub version_id: String,
    pub key: String,
}

impl From<ObjectDescriptor> for CreateResponse {
    fn from(object: ObjectDescriptor) -> Self {
        Self {
            location: object.location,
            version_id: object.version_id.unwrap_or_default(),
            key: object.key,
        }
    }
}

/// Object entry shape shared by `get` metadata and `list` results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfoResponse {
    pub size: String,
    #[serde(rename = "versionID")]
    pub version_id: String,
    pub key: String,
}

impl FileInfoResponse {
    pub fn into_metadata(self) -> HashMap<String, String> {
        HashMap::from([
            ("size".to_string(), self.size),
            ("versionID".to_string(), self.version_id),
            ("key".to_string(), self.key),
        ])
    }
}

impl From<&ObjectDescriptor> for FileInfoResponse {
    fn from(object: &ObjectDescriptor) -> Self {
        Self {
            size: object.size.to_string(),
            version_id: object.version_id.clone().unwrap_or_default(),
            key: object.key.clone(),
        }
    }
}

use std::{collections::HashMap, fmt, str::FromStr};

use crate::error::BindingError;

/// Operations understood by the binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Delete,
    List,
    PresignedGet,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Get,
        Operation::Delete,
        Operation::List,
        Operation::PresignedGet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::List => "list",
            Operation::PresignedGet => "presignedGet",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| BindingError::UnsupportedOperation(s.to_string()))
    }
}

/// Request envelope handed over by the host.
#[derive(Clone, Debug, Default)]
pub struct InvokeRequest {
    pub operation: String,
    pub data: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

impl InvokeRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Response envelope returned to the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvokeResponse {
    pub data: Vec<u8>,
    pub metadata: Option<HashMap<String, String>>,
}

use std::collections::HashMap;

use crate::error::{BindingError, Result};

pub const ENDPOINT: &str = "endpoint";
pub const ACCESS_KEY: &str = "accessKey";
pub const SECRET_KEY: &str = "secretKey";
pub const SSL: &str = "ssl";
pub const BUCKET: &str = "bucket";
pub const REGION: &str = "region";

/// Connection settings of a binding, read from the host's property map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub ssl: bool,
}

impl BindingConfig {
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            endpoint: required(properties, ENDPOINT)?,
            access_key: required(properties, ACCESS_KEY)?,
            secret_key: required(properties, SECRET_KEY)?,
            bucket: required(properties, BUCKET)?,
            region: properties.get(REGION).cloned().unwrap_or_default(),
            ssl: property_to_bool(properties, SSL),
        })
    }
}

fn required(properties: &HashMap<String, String>, key: &str) -> Result<String> {
    match properties.get(key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(BindingError::Config(format!("missing {} property", key))),
    }
}

/// Reads a boolean property; absent or unparsable values are false.
pub fn property_to_bool(properties: &HashMap<String, String>, key: &str) -> bool {
    match properties.get(key).map(String::as_str) {
        Some("1" | "t" | "T" | "TRUE" | "true" | "True") => true,
        _ => false,
    }
}

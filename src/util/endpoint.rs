pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn from_ssl(ssl: bool) -> Self {
        if ssl {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Builds the URL of an endpoint given either as `host:port` or as a full URL.
/// An explicit scheme wins over the `ssl` flag.
pub fn endpoint_url(endpoint: &str, ssl: bool) -> String {
    let endpoint = endpoint.trim_end_matches('/');

    return if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("{}://{}", Scheme::from_ssl(ssl).as_str(), endpoint)
    };
}

/// Path-style location of an object below an endpoint URL.
pub fn object_location(endpoint_url: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", endpoint_url, bucket, key.trim_start_matches('/'))
}

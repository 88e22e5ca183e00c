//! Unified error type.

/// The error type returned by rally's fallible operations.
///
/// Routing itself never fails: conflicts are logged and an unmatched path
/// ends in the not-found handler. `Error` covers the edges around it, such
/// as binding a listener, reading configuration, and decoding or encoding a
/// body.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("xml: {0}")]
    XmlEncode(#[from] quick_xml::se::SeError),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot bind field `{field}`: {message}")]
    Bind { field: String, message: String },

    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),
}

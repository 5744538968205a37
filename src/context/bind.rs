//! Request body decoding.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a request body could not be bound.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML body: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}

/// Body formats `Context::bind` can pick from a `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Xml,
    Form,
}

impl BodyFormat {
    /// Match on the media type prefix, ignoring parameters such as charset.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.starts_with("application/json") {
            Some(BodyFormat::Json)
        } else if content_type.starts_with("application/xml")
            || content_type.starts_with("text/xml")
        {
            Some(BodyFormat::Xml)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            Some(BodyFormat::Form)
        } else {
            None
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, BindError> {
        match self {
            BodyFormat::Json => Ok(serde_json::from_slice(body)?),
            BodyFormat::Xml => Ok(quick_xml::de::from_reader(body)?),
            BodyFormat::Form => Ok(serde_urlencoded::from_bytes(body)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        username: String,
        password: String,
    }

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            BodyFormat::from_content_type("application/json; charset=utf-8"),
            Some(BodyFormat::Json)
        );
        assert_eq!(
            BodyFormat::from_content_type("application/xml"),
            Some(BodyFormat::Xml)
        );
        assert_eq!(
            BodyFormat::from_content_type("application/x-www-form-urlencoded"),
            Some(BodyFormat::Form)
        );
        assert_eq!(BodyFormat::from_content_type("multipart/form-data"), None);
        assert_eq!(BodyFormat::from_content_type(""), None);
    }

    #[test]
    fn test_decode_each_format() {
        let expected = Login {
            username: "admin".into(),
            password: "pw".into(),
        };

        let json: Login = BodyFormat::Json
            .decode(br#"{"username":"admin","password":"pw"}"#)
            .unwrap();
        assert_eq!(json, expected);

        let xml: Login = BodyFormat::Xml
            .decode(b"<Login><username>admin</username><password>pw</password></Login>")
            .unwrap();
        assert_eq!(xml, expected);

        let form: Login = BodyFormat::Form
            .decode(b"username=admin&password=pw")
            .unwrap();
        assert_eq!(form, expected);
    }

    #[test]
    fn test_decode_failure_is_returned() {
        let err = BodyFormat::Json.decode::<Login>(b"{not json").unwrap_err();
        assert!(matches!(err, BindError::Json(_)));
        assert!(err.to_string().starts_with("invalid JSON body"));
    }
}

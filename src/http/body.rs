use super::errors::ApiError;
use axum::{
    Form, async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Request body that may arrive as JSON, a URL-encoded form or a multipart form.
///
/// Requests without a body, or with any other content type, extract as
/// `T::default()`, so every field is simply absent.
#[derive(Debug)]
pub struct NoteBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for NoteBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|essence| essence.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match content_type.as_str() {
            "application/x-www-form-urlencoded" => {
                let Form(body) = Form::<T>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                Ok(Self(body))
            }
            "multipart/form-data" => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                Ok(Self(from_multipart(multipart).await?))
            }
            json if json == "application/json" || json.ends_with("+json") => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                Ok(Self(from_json(&bytes)?))
            }
            _ => Ok(Self(T::default())),
        }
    }
}

// An empty JSON body counts as an empty object
fn from_json<T: DeserializeOwned + Default>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| ApiError::bad_request(e.to_string()))
}

// Collects the text fields of a multipart form. File parts are ignored
async fn from_multipart<T: DeserializeOwned>(mut multipart: Multipart) -> Result<T, ApiError> {
    let mut fields = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field.file_name().is_some() {
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        fields.insert(name, Value::String(value));
    }
    serde_json::from_value(Value::Object(fields)).map_err(|e| ApiError::bad_request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Fields {
        text: Option<String>,
    }

    #[test]
    fn blank_json_is_empty_object() {
        assert_eq!(from_json::<Fields>(b"").unwrap(), Fields::default());
        assert_eq!(from_json::<Fields>(b"  \n").unwrap(), Fields::default());
    }

    #[test]
    fn json_fields_are_read() {
        let fields = from_json::<Fields>(br#"{"text": "hi", "extra": 1}"#).unwrap();
        assert_eq!(fields.text.as_deref(), Some("hi"));
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let err = from_json::<Fields>(b"{oops").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}

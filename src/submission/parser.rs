use axum::http::HeaderMap;
use serde_json::{Map, Value};

/// Parse a form post body into a flat field map based on Content-Type.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Map<String, Value>, String> {
    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        let value: Value = serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
        into_object(value)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else if ct.contains("multipart/form-data") {
        Err("multipart".to_string())
    } else {
        // Try JSON first, then form-urlencoded
        serde_json::from_slice::<Value>(body)
            .map_err(|e| e.to_string())
            .and_then(into_object)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, String> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err("Expected a JSON object of form fields".to_string()),
    }
}

fn parse_form_urlencoded(body: &[u8]) -> Result<Map<String, Value>, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;

    // Last value wins for repeated keys, same as a browser FormData lookup.
    let mut map = Map::new();
    for (k, v) in form_urlencoded::parse(body_str.as_bytes()) {
        map.insert(k.into_owned(), Value::String(v.into_owned()));
    }
    Ok(map)
}

/// Parse multipart form data using multer. File parts are read as text.
pub async fn parse_multipart(headers: &HeaderMap, body: bytes::Bytes) -> Result<Map<String, Value>, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut map = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        map.insert(name, Value::String(value));
    }

    Ok(map)
}

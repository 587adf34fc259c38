use axum::http::HeaderMap;
use bytes::Bytes;

/// The `file` part of a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// Pull the `file` field out of a buffered multipart body. Other fields are
/// skipped.
pub async fn read_file_field(headers: &HeaderMap, body: Bytes) -> Result<UploadedFile, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Expected a multipart/form-data upload".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| "Upload is missing a file name".to_string())?;
        let data = field
            .bytes()
            .await
            .map_err(|e| format!("Failed to read upload: {e}"))?;
        return Ok(UploadedFile { filename, data });
    }

    Err("Missing multipart field 'file'".to_string())
}

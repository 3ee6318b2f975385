use axum::body::{Body, Bytes};
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::admission::{self, GuestSubmission, MAX_COVER_BYTES, MAX_GUEST_NAME_CHARS, MAX_UPLOAD_BYTES};
use crate::authz::{authorize_owner_action, FileDescriptor, IncomingFile, Principal, Rejection};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::admin::MessageResponse;
use crate::models::upload::{CoverAccepted, PageQuery, Upload, UploadAccepted, UploadPage};
use crate::routes::weddings::{owned_wedding, owner_tenant, visible_wedding};
use crate::utils::{device_type, utc_now};

const GUEST_NAME_HEADER: &str = "x-guest-name";
const COVER_CACHE_CONTROL: &str = "public, max-age=86400";
// A UTF-8 char is at most 4 bytes.
const MAX_GUEST_NAME_BYTES: usize = MAX_GUEST_NAME_CHARS * 4;

#[utoipa::path(
    post,
    path = "/api/uploads/guest/{wedding_id}",
    tag = "Uploads",
    params(
        ("wedding_id" = Uuid, Path, description = "Wedding id"),
        ("X-Guest-Name" = Option<String>, Header, description = "Guest display name; the `guest_name` form field is used when absent")
    ),
    request_body(content = String, content_type = "multipart/form-data", description = "`file` plus optional `guest_name`"),
    responses(
        (status = 201, description = "Upload admitted", body = UploadAccepted),
        (status = 400, description = "Invalid guest name or missing file"),
        (status = 403, description = "Uploads closed for this wedding"),
        (status = 404, description = "Missing or deactivated wedding"),
        (status = 413, description = "File larger than 500 MiB"),
        (status = 415, description = "Unsupported media type"),
        (status = 503, description = "Blob store unavailable")
    )
)]
pub async fn guest_upload(
    State(state): State<AppState>,
    Path(wedding_id): Path<Uuid>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadAccepted>)> {
    let form = read_upload_form(multipart, MAX_UPLOAD_BYTES).await?;
    let file = form.file.ok_or_else(|| AppError::bad_request("file field is required"))?;

    let guest_name = guest_name_header(&headers).or(form.guest_name).unwrap_or_default();
    let submission = GuestSubmission {
        wedding_id,
        guest_name: &guest_name,
        device_type: Some(device_type(&headers)),
    };

    let upload = admission::admit_upload(&state.pool, state.blobs.as_ref(), submission, file, utc_now())
        .await?
        .into_result()?;

    Ok((
        StatusCode::CREATED,
        Json(UploadAccepted {
            upload: upload.into(),
            message: "Upload received".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/uploads/my",
    tag = "Uploads",
    params(PageQuery),
    responses(
        (status = 200, description = "Own event's uploads, newest first", body = UploadPage),
        (status = 403, description = "Not an event owner")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_uploads(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<UploadPage>> {
    let tenant_id = owner_tenant(&principal)?;

    let Some(wedding) = db::weddings::find_by_user(&state.pool, tenant_id).await? else {
        return Ok(Json(UploadPage {
            uploads: Vec::new(),
            total: 0,
            page: query.page(),
            limit: query.limit(),
        }));
    };
    authorize_owner_action(&principal, &wedding).into_result()?;

    let (uploads, total) =
        db::uploads::list_for_wedding(&state.pool, wedding.id, query.limit(), query.offset()).await?;

    Ok(Json(UploadPage {
        uploads: uploads.into_iter().map(Upload::from).collect(),
        total,
        page: query.page(),
        limit: query.limit(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/uploads/download/{id}",
    tag = "Uploads",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 200, description = "File bytes as an attachment"),
        (status = 403, description = "Upload belongs to another tenant"),
        (status = 404, description = "Unknown upload")
    ),
    security(("bearerAuth" = []))
)]
pub async fn download(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let upload = db::uploads::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("upload not found"))?;
    let wedding = db::weddings::find_by_id(&state.pool, upload.wedding_id)
        .await?
        .ok_or_else(|| AppError::not_found("upload not found"))?;

    // Reads stay open after expiry.
    authorize_owner_action(&principal, &wedding).into_result()?;

    let blob = state
        .blobs
        .get(&upload.file_key)
        .await?
        .ok_or_else(|| AppError::not_found("file missing from storage"))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, blob.content_type)
        .header(header::CONTENT_LENGTH, blob.bytes.len().to_string())
        .header(header::CONTENT_DISPOSITION, attachment_disposition(&upload.file_name))
        .body(Body::from(blob.bytes))
        .map_err(|e| AppError::internal(format!("failed to build response: {e}")))
}

#[utoipa::path(
    delete,
    path = "/api/uploads/{id}",
    tag = "Uploads",
    params(("id" = Uuid, Path, description = "Upload id")),
    responses(
        (status = 200, description = "Upload and blob removed", body = MessageResponse),
        (status = 403, description = "Upload belongs to another tenant"),
        (status = 404, description = "Unknown upload")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_upload(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    remove_upload(&state, &principal, id).await?;
    Ok(Json(MessageResponse::new("Upload deleted")))
}

/// Hard delete, guard first. The row goes before the blob so no row ever points at a missing blob.
pub(crate) async fn remove_upload(state: &AppState, principal: &Principal, id: Uuid) -> AppResult<()> {
    let upload = db::uploads::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("upload not found"))?;
    let wedding = db::weddings::find_by_id(&state.pool, upload.wedding_id)
        .await?
        .ok_or_else(|| AppError::not_found("upload not found"))?;

    authorize_owner_action(principal, &wedding).into_result()?;

    db::uploads::delete(&state.pool, upload.id).await?;
    if let Err(err) = state.blobs.delete(&upload.file_key).await {
        tracing::error!(file_key = %upload.file_key, error = %err, "blob delete failed; blob left orphaned");
    }

    tracing::info!(upload_id = %upload.id, wedding_id = %wedding.id, principal = %principal, "upload deleted");
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/uploads/cover",
    tag = "Uploads",
    request_body(content = String, content_type = "multipart/form-data", description = "`file`: JPEG, PNG or WebP up to 10 MiB"),
    responses(
        (status = 200, description = "Cover replaced", body = CoverAccepted),
        (status = 404, description = "No event yet"),
        (status = 413, description = "Cover larger than 10 MiB"),
        (status = 415, description = "Unsupported image type")
    ),
    security(("bearerAuth" = []))
)]
pub async fn upload_cover(
    State(state): State<AppState>,
    principal: Principal,
    multipart: Multipart,
) -> AppResult<Json<CoverAccepted>> {
    let wedding = owned_wedding(&state, &principal).await?;

    let form = read_upload_form(multipart, MAX_COVER_BYTES).await?;
    let file = form.file.ok_or_else(|| AppError::bad_request("file field is required"))?;

    let cover_image_url =
        admission::admit_cover_upload(&state.pool, state.blobs.as_ref(), &principal, &wedding, file, utc_now())
            .await?
            .into_result()?;

    Ok(Json(CoverAccepted {
        cover_image_url,
        message: "Cover image updated".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/uploads/cover-image/{wedding_id}",
    tag = "Uploads",
    params(("wedding_id" = Uuid, Path, description = "Wedding id")),
    responses(
        (status = 200, description = "Cover image bytes"),
        (status = 404, description = "No cover, or missing or deactivated wedding")
    )
)]
pub async fn cover_image(State(state): State<AppState>, Path(wedding_id): Path<Uuid>) -> AppResult<Response> {
    let wedding = visible_wedding(&state, wedding_id).await?;
    let key = wedding
        .cover_image_key
        .ok_or_else(|| AppError::not_found("no cover image"))?;
    let blob = state
        .blobs
        .get(&key)
        .await?
        .ok_or_else(|| AppError::not_found("no cover image"))?;
    // The row records what the cover was admitted as.
    let content_type = wedding.cover_content_type.unwrap_or(blob.content_type);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, COVER_CACHE_CONTROL)
        .body(Body::from(blob.bytes))
        .map_err(|e| AppError::internal(format!("failed to build response: {e}")))
}

#[derive(Default)]
struct UploadForm {
    file: Option<IncomingFile>,
    guest_name: Option<String>,
}

/// Reads the multipart body. File bytes past `max_bytes` are counted but not kept,
/// so admission sees the real size and rejects it before storage is touched.
async fn read_upload_form(mut multipart: Multipart, max_bytes: u64) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("multipart error: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_ascii_lowercase();

                let mut buffer = Vec::new();
                let mut size: u64 = 0;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::bad_request(format!("upload read error: {e}")))?
                {
                    size += chunk.len() as u64;
                    if size <= max_bytes {
                        buffer.extend_from_slice(&chunk);
                    }
                }

                form.file = Some(IncomingFile {
                    descriptor: FileDescriptor { file_name, mime_type, size },
                    bytes: Bytes::from(buffer),
                });
            }
            Some("guest_name") => {
                form.guest_name = Some(read_guest_name(&mut field).await?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Stops reading as soon as the field outgrows any valid name.
async fn read_guest_name(field: &mut Field<'_>) -> AppResult<String> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::bad_request(format!("multipart error: {e}")))?
    {
        append_capped(&mut buffer, &chunk, MAX_GUEST_NAME_BYTES)?;
    }
    String::from_utf8(buffer).map_err(|_| Rejection::InvalidGuestName.into())
}

fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8], cap: usize) -> Result<(), Rejection> {
    if buffer.len() + chunk.len() > cap {
        return Err(Rejection::InvalidGuestName);
    }
    buffer.extend_from_slice(chunk);
    Ok(())
}

/// Raw UTF-8 header bytes are accepted so names in any script can travel in the header.
fn guest_name_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(GUEST_NAME_HEADER)
        .and_then(|value| String::from_utf8(value.as_bytes().to_vec()).ok())
        .filter(|name| !name.trim().is_empty())
}

fn attachment_disposition(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn disposition_keeps_non_ascii_names_encoded() {
        assert_eq!(
            attachment_disposition("신부.jpg"),
            "attachment; filename=\".jpg\"; filename*=UTF-8''%EC%8B%A0%EB%B6%80.jpg"
        );
        assert_eq!(
            attachment_disposition("a\"b;.mp4"),
            "attachment; filename=\"ab.mp4\"; filename*=UTF-8''a%22b%3B.mp4"
        );
    }

    #[test]
    fn guest_name_field_is_capped() {
        let mut buffer = Vec::new();
        assert_eq!(append_capped(&mut buffer, "김민지".as_bytes(), MAX_GUEST_NAME_BYTES), Ok(()));
        assert_eq!(append_capped(&mut buffer, &[b'a'; 71], MAX_GUEST_NAME_BYTES), Ok(()));
        assert_eq!(buffer.len(), MAX_GUEST_NAME_BYTES);

        assert_eq!(
            append_capped(&mut buffer, b"a", MAX_GUEST_NAME_BYTES),
            Err(Rejection::InvalidGuestName)
        );
        assert_eq!(buffer.len(), MAX_GUEST_NAME_BYTES);
    }

    #[test]
    fn guest_name_header_accepts_utf8() {
        let mut headers = HeaderMap::new();
        assert_eq!(guest_name_header(&headers), None);

        headers.insert(GUEST_NAME_HEADER, HeaderValue::from_bytes("김민지".as_bytes()).unwrap());
        assert_eq!(guest_name_header(&headers).as_deref(), Some("김민지"));

        headers.insert(GUEST_NAME_HEADER, HeaderValue::from_static("  "));
        assert_eq!(guest_name_header(&headers), None);
    }
}

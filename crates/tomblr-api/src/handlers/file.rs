//! File upload, download, listing and ordering handlers.

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use bytes::Bytes;

use tomblr_core::traits::PresignedUpload;
use tomblr_core::types::{FileId, FolderId};
use tomblr_entity::file::File;
use tomblr_entity::upload::{ChunkReceipt, UploadId};
use tomblr_entity::user::StorageUsage;
use tomblr_service::file::FileDownload;
use tomblr_service::upload::{ChunkInput, DirectUploadRequest, SimpleUpload};

use crate::dto::request::{
    CompleteDirectUploadRequest, FinalizeUploadRequest, FolderQuery, PresignUploadRequest,
    UpdatePositionsRequest, validate,
};
use crate::dto::response::{ApiResponse, CountResponse, FinalizeResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("Read error: {e}")))
}

async fn field_bytes(field: Field<'_>) -> Result<Bytes, ApiError> {
    field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(format!("Read error: {e}")))
}

fn parse_folder_id(raw: &str) -> Result<Option<FolderId>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ApiError::validation("Invalid folderId"))
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Result<T, ApiError> {
    raw.as_deref()
        .map(str::trim)
        .ok_or_else(|| ApiError::validation(format!("{name} is required")))?
        .parse()
        .map_err(|_| ApiError::validation(format!("{name} must be a non-negative integer")))
}

/// POST /api/files/upload (multipart: `file`, optional `folderId`)
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<File>>, ApiError> {
    let mut folder_id = None;
    let mut claimed_user = None;
    let mut upload: Option<(String, Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "folderId" => folder_id = parse_folder_id(&field_text(field).await?)?,
            "userId" => claimed_user = Some(field_text(field).await?),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map(String::from);
                upload = Some((file_name, mime_type, field_bytes(field).await?));
            }
            _ => {}
        }
    }

    auth.check_claimed(claimed_user.as_deref())?;
    let (file_name, mime_type, data) =
        upload.ok_or_else(|| ApiError::validation("No file provided"))?;

    let file = state
        .upload_service
        .simple_upload(
            &auth,
            SimpleUpload {
                folder_id,
                file_name,
                mime_type,
                data,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(file)))
}

/// POST /api/files/chunk (multipart)
pub async fn upload_chunk(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ChunkReceipt>>, ApiError> {
    let mut upload_id = None;
    let mut chunk_index = None;
    let mut total_chunks = None;
    let mut file_name = None;
    let mut file_type = None;
    let mut file_size = None;
    let mut folder_id = None;
    let mut claimed_user = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "chunk" => data = Some(field_bytes(field).await?),
            "uploadId" => upload_id = Some(field_text(field).await?),
            "chunkIndex" => chunk_index = Some(field_text(field).await?),
            "totalChunks" => total_chunks = Some(field_text(field).await?),
            "fileName" => file_name = Some(field_text(field).await?),
            "fileType" => file_type = Some(field_text(field).await?),
            "fileSize" => file_size = Some(field_text(field).await?),
            "folderId" => folder_id = parse_folder_id(&field_text(field).await?)?,
            "userId" => claimed_user = Some(field_text(field).await?),
            _ => {}
        }
    }

    auth.check_claimed(claimed_user.as_deref())?;

    let upload_id = UploadId::parse(
        upload_id.ok_or_else(|| ApiError::validation("uploadId is required"))?,
    )?;
    let input = ChunkInput {
        upload_id,
        chunk_index: parse_number("chunkIndex", chunk_index)?,
        total_chunks: parse_number("totalChunks", total_chunks)?,
        file_name: file_name.ok_or_else(|| ApiError::validation("fileName is required"))?,
        mime_type: file_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        declared_size: parse_number("fileSize", file_size)?,
        folder_id,
        data: data.ok_or_else(|| ApiError::validation("chunk is required"))?,
    };

    let receipt = state.chunk_assembler.begin_or_continue(&auth, input).await?;
    Ok(Json(ApiResponse::ok(receipt)))
}

/// POST /api/files/chunk/finalize
pub async fn finalize_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<FinalizeUploadRequest>,
) -> Result<Json<ApiResponse<FinalizeResponse>>, ApiError> {
    auth.check_claimed(req.user_id.as_deref())?;
    let upload_id = UploadId::parse(req.upload_id)?;
    let file = state.chunk_assembler.finalize(&auth, &upload_id).await?;
    Ok(Json(ApiResponse::ok(FinalizeResponse {
        file_id: file.id,
        file,
    })))
}

/// POST /api/files/presign
pub async fn presign_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<PresignUploadRequest>,
) -> Result<Json<ApiResponse<PresignedUpload>>, ApiError> {
    validate(&req)?;
    let target = state
        .upload_service
        .presign_upload(
            &auth,
            DirectUploadRequest {
                file_name: req.file_name,
                file_size: req.file_size,
                folder_id: req.folder_id,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(target)))
}

/// POST /api/files/presign/complete
pub async fn complete_presigned(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CompleteDirectUploadRequest>,
) -> Result<Json<ApiResponse<File>>, ApiError> {
    validate(&req)?;
    let file = state
        .upload_service
        .complete_direct(&auth, &req.key, req.file_type)
        .await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// GET /api/files?folderId=...
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FolderQuery>,
) -> Result<Json<ApiResponse<Vec<File>>>, ApiError> {
    let files = state.file_service.list(&auth, query.folder_id).await?;
    Ok(Json(ApiResponse::ok(files)))
}

/// GET /api/files/usage
pub async fn usage(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<StorageUsage>>, ApiError> {
    let usage = state.file_service.usage(&auth).await?;
    Ok(Json(ApiResponse::ok(usage)))
}

/// PATCH /api/files/positions
pub async fn update_positions(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdatePositionsRequest>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.file_service.update_positions(&auth, &req.items).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> Result<Json<ApiResponse<FileDownload>>, ApiError> {
    let download = state.file_service.download_url(&auth, id).await?;
    Ok(Json(ApiResponse::ok(download)))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> Result<Json<ApiResponse<File>>, ApiError> {
    let file = state.file_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(file)))
}

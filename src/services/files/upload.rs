use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::FileService;
use crate::config::AppConfig;
use crate::errors::SchoolHubError;
use crate::models::{ApiResponse, ErrorCode, files::responses::FileUploadResponse};
use crate::services::common::{current_user, error_response};
use crate::utils::random_code::generate_session_token;
use crate::utils::{extension_of, validate_magic_bytes};

/// 扩展名是否在允许列表中（忽略大小写）
fn extension_allowed(extension: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|t| t.eq_ignore_ascii_case(extension))
}

fn upload_failed(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(ApiResponse::error_empty(ErrorCode::FileUploadFailed, message))
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Failed to remove partial upload {}: {}", path.display(), e);
    }
}

pub async fn handle_upload(
    service: &FileService,
    req: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let current = match current_user(req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let config = AppConfig::get();
    let upload_dir = Path::new(&config.upload.dir);
    let max_size = config.upload.max_size;

    // 确保上传目录存在
    if let Err(e) = tokio::fs::create_dir_all(upload_dir).await {
        tracing::error!("{}", SchoolHubError::file_operation(format!("{e}")));
        return Ok(upload_failed("Failed to prepare upload directory"));
    }

    let mut saved: Option<(String, String, String, i64)> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != "file" {
            continue;
        }

        if let Some((_, stored_name, _, _)) = &saved {
            discard(&upload_dir.join(stored_name)).await;
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Only one file can be uploaded at a time",
            )));
        }

        let original_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let Some(extension) =
            extension_of(&original_name).filter(|ext| extension_allowed(ext, &config.upload.allowed_types))
        else {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FileTypeNotAllowed,
                "File type not allowed",
            )));
        };

        let token = generate_session_token();
        let stored_name = format!("{token}{extension}");
        let file_path = upload_dir.join(&stored_name);
        let mut f = match tokio::fs::File::create(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("{}", SchoolHubError::file_operation(format!("{e}")));
                return Ok(upload_failed("Failed to create file"));
            }
        };

        let mut total_size: usize = 0;
        let mut first_chunk = true;
        while let Some(chunk) = field.next().await {
            let data = match chunk {
                Ok(data) => data,
                Err(e) => {
                    discard(&file_path).await;
                    return Err(e.into());
                }
            };

            // 首个分块校验文件头
            if first_chunk {
                first_chunk = false;
                if !validate_magic_bytes(&data, &extension) {
                    discard(&file_path).await;
                    return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                        ErrorCode::FileTypeNotAllowed,
                        "File content does not match its extension",
                    )));
                }
            }

            total_size += data.len();
            if total_size > max_size {
                discard(&file_path).await;
                return Ok(HttpResponse::PayloadTooLarge().json(ApiResponse::error_empty(
                    ErrorCode::FileSizeExceeded,
                    format!("File size exceeds the limit of {max_size} bytes"),
                )));
            }
            if let Err(e) = f.write_all(&data).await {
                tracing::error!("{}", SchoolHubError::file_operation(format!("{e}")));
                discard(&file_path).await;
                return Ok(upload_failed("Failed to write file"));
            }
        }

        if total_size == 0 {
            discard(&file_path).await;
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FileUploadFailed,
                "Uploaded file is empty",
            )));
        }
        if let Err(e) = f.flush().await {
            tracing::error!("{}", SchoolHubError::file_operation(format!("{e}")));
            discard(&file_path).await;
            return Ok(upload_failed("Failed to write file"));
        }

        saved = Some((token, stored_name, original_name, total_size as i64));
    }

    let Some((token, stored_name, original_name, file_size)) = saved else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::FileNotFound,
            "No file found in upload payload",
        )));
    };
    let file_type = extension_of(&original_name).unwrap_or_default();

    let storage = service.get_storage(req);
    match storage
        .create_file(
            &token,
            &original_name,
            &stored_name,
            file_size,
            &file_type,
            current.id,
        )
        .await
    {
        Ok(file) => Ok(HttpResponse::Created().json(ApiResponse::success(
            FileUploadResponse {
                download_token: file.download_token,
                file_name: file.original_name,
                size: file.file_size,
                content_type: file.file_type,
                uploaded_at: file.uploaded_at,
            },
            "File uploaded successfully",
        ))),
        Err(e) => {
            discard(&upload_dir.join(&stored_name)).await;
            Ok(error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_allowed() {
        let allowed = vec![".pdf".to_string(), ".PNG".to_string()];
        assert!(extension_allowed(".pdf", &allowed));
        assert!(extension_allowed(".png", &allowed));
        assert!(!extension_allowed(".exe", &allowed));
    }
}

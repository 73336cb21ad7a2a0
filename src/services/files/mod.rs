pub mod download;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::storage::Storage;

/// 删除上传目录中的文件，返回实际删除的数量
///
/// 只接受不带路径的文件名，已不存在的文件直接跳过。
pub(crate) async fn remove_stored_files(dir: &Path, stored_names: &[String]) -> usize {
    let mut removed = 0;
    for name in stored_names {
        if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name.as_str()) {
            warn!("Skipping suspicious stored file name: {}", name);
            continue;
        }
        match tokio::fs::remove_file(dir.join(name)).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove stored file {}: {}", name, e),
        }
    }
    removed
}

pub struct FileService {
    storage: Option<Arc<dyn Storage>>,
}

impl FileService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn handle_upload(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_upload(self, request, payload).await
    }

    pub async fn handle_download(
        &self,
        request: &HttpRequest,
        file_token: String,
    ) -> ActixResult<HttpResponse> {
        download::handle_download(self, request, file_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_stored_files() {
        let dir = std::env::temp_dir().join(format!("schoolhub-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("a.pdf"), b"%PDF").await.unwrap();
        tokio::fs::write(dir.join("b.png"), b"png").await.unwrap();
        let outside = dir.join("keep.txt");
        tokio::fs::write(&outside, b"keep").await.unwrap();

        let names = vec![
            "a.pdf".to_string(),
            "b.png".to_string(),
            "missing.pdf".to_string(),
            "../keep.txt".to_string(),
            "sub/keep.txt".to_string(),
        ];
        assert_eq!(remove_stored_files(&dir, &names).await, 2);
        assert!(!dir.join("a.pdf").exists());
        assert!(!dir.join("b.png").exists());
        assert!(outside.exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

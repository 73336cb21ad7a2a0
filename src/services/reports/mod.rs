pub mod overview;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use std::sync::Arc;

use crate::storage::Storage;

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    /// 仅总管理员可指定
    pub school_id: Option<i64>,
}

pub struct ReportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReportService {
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

    pub async fn overview(
        &self,
        request: &HttpRequest,
        params: ReportParams,
    ) -> ActixResult<HttpResponse> {
        overview::overview(self, request, params).await
    }
}

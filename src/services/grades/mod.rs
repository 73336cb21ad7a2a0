pub mod create;
pub mod delete;
pub mod list;
pub mod summary;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::auth::entities::AuthUser;
use crate::models::grades::{
    entities::Grade,
    requests::{CreateGradeRequest, GradeListParams, GradeSummaryParams, UpdateGradeRequest},
};
use crate::models::users::entities::{User, UserRole};
use crate::models::ErrorCode;
use crate::services::common::{bad_request, error_response, not_found};
use crate::storage::Storage;

pub struct GradeService {
    storage: Option<Arc<dyn Storage>>,
}

impl GradeService {
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

    pub async fn create_grade(
        &self,
        request: &HttpRequest,
        req: CreateGradeRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_grade(self, request, req).await
    }

    pub async fn list_grades(
        &self,
        request: &HttpRequest,
        query: GradeListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_grades(self, request, query).await
    }

    pub async fn update_grade(
        &self,
        request: &HttpRequest,
        id: i64,
        update: UpdateGradeRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_grade(self, request, id, update).await
    }

    pub async fn delete_grade(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        delete::delete_grade(self, request, id).await
    }

    pub async fn grade_summary(
        &self,
        request: &HttpRequest,
        query: GradeSummaryParams,
    ) -> ActixResult<HttpResponse> {
        summary::grade_summary(self, request, query).await
    }
}

/// 学生须属于当前用户的学校
pub(crate) async fn school_student(
    storage: &Arc<dyn Storage>,
    current: &AuthUser,
    student_id: i64,
) -> Result<User, HttpResponse> {
    match storage.get_user_by_id(student_id).await {
        Ok(Some(user))
            if user.role == UserRole::Student
                && user.school_id.is_some_and(|id| current.can_access_school(id)) =>
        {
            Ok(user)
        }
        Ok(_) => Err(bad_request(
            ErrorCode::UserNotFound,
            "Student does not belong to this school",
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// 读取本校成绩
pub(crate) async fn school_grade(
    storage: &Arc<dyn Storage>,
    current: &AuthUser,
    id: i64,
) -> Result<Grade, HttpResponse> {
    match storage.get_grade_by_id(id).await {
        Ok(Some(grade)) if current.can_access_school(grade.school_id) => Ok(grade),
        Ok(_) => Err(not_found(ErrorCode::GradeNotFound, "Grade not found")),
        Err(e) => Err(error_response(&e)),
    }
}

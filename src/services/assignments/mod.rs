pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod status;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::assignments::{
    entities::{Assignment, AssignmentStatus},
    requests::{AssignmentListParams, CreateAssignmentRequest, UpdateAssignmentRequest},
};
use crate::models::auth::entities::AuthUser;
use crate::models::ErrorCode;
use crate::services::common::{error_response, not_found};
use crate::storage::Storage;

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AssignmentService {
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

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        req: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(self, request, req).await
    }

    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        query: AssignmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_assignments(self, request, query).await
    }

    pub async fn get_assignment(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        get::get_assignment(self, request, id).await
    }

    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        id: i64,
        update: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_assignment(self, request, id, update).await
    }

    pub async fn publish_assignment(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        status::transition(self, request, id, AssignmentStatus::Active).await
    }

    pub async fn close_assignment(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        status::transition(self, request, id, AssignmentStatus::Closed).await
    }

    pub async fn delete_assignment(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        delete::delete_assignment(self, request, id).await
    }
}

/// 当前用户能否看到该作业：同校；学生只能看本班已发布的作业
pub(crate) fn can_view(current: &AuthUser, assignment: &Assignment) -> bool {
    if !current.can_access_school(assignment.school_id) {
        return false;
    }
    if current.is_student() {
        return current.class_id == Some(assignment.class_id)
            && AssignmentStatus::visible_to_students().contains(&assignment.status);
    }
    true
}

/// 作者教师或本校管理员可以修改
pub(crate) fn can_edit(current: &AuthUser, assignment: &Assignment) -> bool {
    if !current.can_access_school(assignment.school_id) {
        return false;
    }
    current.is_admin() || (current.is_teacher() && assignment.teacher_id == current.id)
}

/// 读取作业并做可见性检查，不可见时按不存在处理
pub(crate) async fn load_visible(
    storage: &Arc<dyn Storage>,
    current: &AuthUser,
    id: i64,
) -> Result<Assignment, HttpResponse> {
    match storage.get_assignment_by_id(id).await {
        Ok(Some(assignment)) if can_view(current, &assignment) => Ok(assignment),
        Ok(_) => Err(not_found(ErrorCode::AssignmentNotFound, "Assignment not found")),
        Err(e) => Err(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;

    fn user(id: i64, role: UserRole, class_id: Option<i64>) -> AuthUser {
        AuthUser {
            id,
            school_id: Some(1),
            email: "u@gvhs.edu".to_string(),
            full_name: "U".to_string(),
            role,
            subdivision: None,
            class_id,
            session_token: "t".to_string(),
        }
    }

    fn assignment(status: AssignmentStatus) -> Assignment {
        let now = chrono::Utc::now();
        Assignment {
            id: 1,
            school_id: 1,
            class_id: 10,
            teacher_id: 5,
            subject: "math".to_string(),
            title: "Fractions".to_string(),
            description: None,
            attachment_token: None,
            max_score: 100.0,
            due_date: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_student_visibility() {
        let student = user(9, UserRole::Student, Some(10));
        assert!(!can_view(&student, &assignment(AssignmentStatus::Draft)));
        assert!(can_view(&student, &assignment(AssignmentStatus::Active)));
        assert!(can_view(&student, &assignment(AssignmentStatus::Closed)));

        let other_class = user(9, UserRole::Student, Some(11));
        assert!(!can_view(&other_class, &assignment(AssignmentStatus::Active)));
    }

    #[test]
    fn test_edit_rights() {
        let a = assignment(AssignmentStatus::Draft);
        assert!(can_edit(&user(5, UserRole::Teacher, None), &a));
        assert!(!can_edit(&user(6, UserRole::Teacher, None), &a));
        assert!(can_edit(&user(2, UserRole::Admin, None), &a));
        assert!(!can_edit(&user(9, UserRole::Student, Some(10)), &a));
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{
    ApiResponse, PaginationInfo,
    assignments::{
        entities::AssignmentStatus,
        requests::{AssignmentListParams, AssignmentListQuery},
        responses::AssignmentListResponse,
    },
    auth::entities::AuthUser,
    common::normalize_page,
};
use crate::services::common::{current_user, error_response, resolve_school};

/// 按角色构造查询条件；学生未分班时返回 None
fn build_query(
    current: &AuthUser,
    school_id: i64,
    params: AssignmentListParams,
) -> Option<AssignmentListQuery> {
    let mut query = AssignmentListQuery {
        school_id: Some(school_id),
        class_id: params.class_id,
        subject: params.subject,
        statuses: params.status.map(|s| vec![s]),
        page: params.page,
        size: params.size,
        ..Default::default()
    };

    if current.is_student() {
        query.class_id = Some(current.class_id?);
        let visible = AssignmentStatus::visible_to_students();
        query.statuses = Some(match params.status {
            Some(status) if visible.contains(&status) => vec![status],
            Some(_) => Vec::new(),
            None => visible.to_vec(),
        });
    } else if current.is_teacher() && params.class_id.is_none() {
        // 教师默认只看自己布置的作业
        query.teacher_id = Some(current.id);
    }

    Some(query)
}

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    params: AssignmentListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, None) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let Some(query) = build_query(&current, school_id, params.clone()) else {
        let (page, size) = normalize_page(params.page, params.size);
        return Ok(HttpResponse::Ok().json(ApiResponse::success(
            AssignmentListResponse {
                items: Vec::new(),
                pagination: PaginationInfo::new(page, size, 0, 0),
            },
            "OK",
        )));
    };

    match storage.list_assignments_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;

    fn user(role: UserRole, class_id: Option<i64>) -> AuthUser {
        AuthUser {
            id: 5,
            school_id: Some(1),
            email: "u@gvhs.edu".to_string(),
            full_name: "U".to_string(),
            role,
            subdivision: None,
            class_id,
            session_token: "t".to_string(),
        }
    }

    #[test]
    fn test_student_query_is_pinned_to_class() {
        let params = AssignmentListParams {
            class_id: Some(99),
            ..Default::default()
        };
        let query = build_query(&user(UserRole::Student, Some(10)), 1, params).unwrap();
        assert_eq!(query.class_id, Some(10));
        assert_eq!(
            query.statuses,
            Some(vec![AssignmentStatus::Active, AssignmentStatus::Closed])
        );

        let drafts = AssignmentListParams {
            status: Some(AssignmentStatus::Draft),
            ..Default::default()
        };
        let query = build_query(&user(UserRole::Student, Some(10)), 1, drafts).unwrap();
        assert_eq!(query.statuses, Some(Vec::new()));

        assert!(build_query(&user(UserRole::Student, None), 1, Default::default()).is_none());
    }

    #[test]
    fn test_teacher_defaults_to_own_assignments() {
        let query = build_query(&user(UserRole::Teacher, None), 1, Default::default()).unwrap();
        assert_eq!(query.teacher_id, Some(5));

        let by_class = AssignmentListParams {
            class_id: Some(3),
            ..Default::default()
        };
        let query = build_query(&user(UserRole::Teacher, None), 1, by_class).unwrap();
        assert_eq!(query.teacher_id, None);
        assert_eq!(query.class_id, Some(3));

        let query = build_query(&user(UserRole::Admin, None), 1, Default::default()).unwrap();
        assert_eq!(query.teacher_id, None);
        assert_eq!(query.statuses, None);
    }
}

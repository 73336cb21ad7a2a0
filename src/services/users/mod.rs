pub mod create;
pub mod delete;
pub mod export;
pub mod get;
pub mod import;
pub mod list;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::auth::entities::AuthUser;
use crate::models::users::{
    entities::{User, UserProfile, UserRole},
    requests::{CreateUserRequest, UpdateUserRequest, UserListParams, UserSchoolParams},
};
use crate::storage::Storage;

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
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

    pub async fn list_users(
        &self,
        request: &HttpRequest,
        query: UserListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_users(self, request, query).await
    }

    pub async fn create_user(
        &self,
        request: &HttpRequest,
        user_data: CreateUserRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_user(self, request, user_data).await
    }

    pub async fn get_user(&self, request: &HttpRequest, user_id: i64) -> ActixResult<HttpResponse> {
        get::get_user(self, request, user_id).await
    }

    pub async fn update_user(
        &self,
        request: &HttpRequest,
        user_id: i64,
        update_data: UpdateUserRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_user(self, request, user_id, update_data).await
    }

    pub async fn delete_user(&self, request: &HttpRequest, user_id: i64) -> ActixResult<HttpResponse> {
        delete::delete_user(self, request, user_id).await
    }

    pub async fn import_users(
        &self,
        request: &HttpRequest,
        params: UserSchoolParams,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        import::import_users(self, request, params, payload).await
    }

    pub async fn export_users(
        &self,
        request: &HttpRequest,
        params: UserSchoolParams,
    ) -> ActixResult<HttpResponse> {
        export::export_users(self, request, params).await
    }
}

/// 当前用户能否管理目标用户：总管理员不限，学校管理员仅限本校非总管理员
pub(crate) fn can_manage(current: &AuthUser, target: &User) -> bool {
    if current.is_head_admin() {
        return true;
    }
    current.is_admin()
        && target.role != UserRole::HeadAdmin
        && target.school_id.is_some()
        && target.school_id == current.school_id
}

/// 只保留与角色相关的资料字段
pub(crate) fn profile_for_role(role: UserRole, profile: UserProfile) -> UserProfile {
    match role {
        UserRole::Admin => UserProfile {
            phone: profile.phone,
            title: profile.title,
            ..Default::default()
        },
        UserRole::Teacher => UserProfile {
            subdivision: profile.subdivision,
            specialty: profile.specialty,
            employee_number: profile.employee_number,
            ..Default::default()
        },
        UserRole::Student => UserProfile {
            class_id: profile.class_id,
            admission_number: profile.admission_number,
            guardian_name: profile.guardian_name,
            guardian_phone: profile.guardian_phone,
            ..Default::default()
        },
        UserRole::HeadAdmin => UserProfile::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::TeacherSubdivision;

    fn target(role: UserRole, school_id: Option<i64>) -> User {
        let now = chrono::Utc::now();
        User {
            id: 2,
            school_id,
            email: "t@school.edu".to_string(),
            password_hash: String::new(),
            full_name: "T".to_string(),
            role,
            is_active: true,
            login_attempts: 0,
            locked_until: None,
            last_login: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn actor(role: UserRole, school_id: Option<i64>) -> AuthUser {
        AuthUser {
            id: 1,
            school_id,
            email: "a@school.edu".to_string(),
            full_name: "A".to_string(),
            role,
            subdivision: None,
            class_id: None,
            session_token: "s".to_string(),
        }
    }

    #[test]
    fn test_can_manage() {
        let admin = actor(UserRole::Admin, Some(1));
        assert!(can_manage(&admin, &target(UserRole::Teacher, Some(1))));
        assert!(!can_manage(&admin, &target(UserRole::Teacher, Some(2))));
        assert!(!can_manage(&admin, &target(UserRole::HeadAdmin, None)));

        let head = actor(UserRole::HeadAdmin, None);
        assert!(can_manage(&head, &target(UserRole::Student, Some(7))));

        let teacher = actor(UserRole::Teacher, Some(1));
        assert!(!can_manage(&teacher, &target(UserRole::Student, Some(1))));
    }

    #[test]
    fn test_profile_for_role_drops_foreign_fields() {
        let profile = UserProfile {
            phone: Some("123".to_string()),
            subdivision: Some(TeacherSubdivision::Director),
            class_id: Some(3),
            ..Default::default()
        };
        let teacher = profile_for_role(UserRole::Teacher, profile.clone());
        assert_eq!(teacher.subdivision, Some(TeacherSubdivision::Director));
        assert!(teacher.phone.is_none() && teacher.class_id.is_none());

        let student = profile_for_role(UserRole::Student, profile);
        assert_eq!(student.class_id, Some(3));
        assert!(student.subdivision.is_none());
    }
}

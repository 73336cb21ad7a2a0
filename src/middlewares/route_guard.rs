/*!
 * 路由前缀访问控制
 *
 * 静态的 `(路径前缀, 允许角色)` 表，最长前缀匹配生效；
 * 受保护路径若没有任何前缀匹配则一律拒绝。
 * 需要在 RequireJWT 之后执行。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{
    ErrorCode,
    auth::entities::{AccessRole, AuthUser},
};

use super::create_error_response;

const TEACHING: &[AccessRole] = &[AccessRole::Admin, AccessRole::AnyTeacher, AccessRole::Student];
const SCHOOL_MANAGEMENT: &[AccessRole] = &[AccessRole::HeadAdmin, AccessRole::Admin];

/// 前缀 → 允许的访问角色
pub const ROUTE_TABLE: &[(&str, &[AccessRole])] = &[
    ("/api/v1/auth", AccessRole::EVERYONE),
    ("/api/v1/schools", &[AccessRole::HeadAdmin]),
    ("/api/v1/users", SCHOOL_MANAGEMENT),
    ("/api/v1/invoices", SCHOOL_MANAGEMENT),
    ("/api/v1/audit-logs", SCHOOL_MANAGEMENT),
    ("/api/v1/reports", &[AccessRole::Admin, AccessRole::DIRECTOR]),
    ("/api/v1/classes", TEACHING),
    ("/api/v1/assignments", TEACHING),
    ("/api/v1/grades", TEACHING),
    ("/api/v1/timetables", TEACHING),
    ("/api/v1/messages", AccessRole::EVERYONE),
    ("/api/v1/notifications", AccessRole::EVERYONE),
    ("/api/v1/files", AccessRole::EVERYONE),
];

/// 按段匹配前缀：`/api/v1/users` 匹配 `/api/v1/users/3`，不匹配 `/api/v1/usersx`
fn prefix_matches(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// 查找路径的最长匹配前缀对应的角色
pub fn allowed_roles(path: &str) -> Option<&'static [AccessRole]> {
    ROUTE_TABLE
        .iter()
        .filter(|(prefix, _)| prefix_matches(path, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, roles)| *roles)
}

/// 判断用户能否访问路径，未匹配的路径拒绝
pub fn is_allowed(path: &str, user: &AuthUser) -> bool {
    allowed_roles(path).is_some_and(|roles| user.has_any(roles))
}

#[derive(Clone)]
pub struct RouteGuard;

impl<S, B> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RouteGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RouteGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RouteGuardMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RouteGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            if req.method() == actix_web::http::Method::OPTIONS {
                let res = srv.call(req).await?.map_into_left_body();
                return Ok(res);
            }

            let user = req.extensions().get::<AuthUser>().cloned();
            let Some(user) = user else {
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required",
                    )
                    .map_into_right_body(),
                ));
            };

            if is_allowed(req.path(), &user) {
                let res = srv.call(req).await?.map_into_left_body();
                Ok(res)
            } else {
                info!(
                    "Route guard denied {} {} for user {} ({})",
                    req.method(),
                    req.path(),
                    user.id,
                    user.role
                );
                Ok(req.into_response(
                    create_error_response(
                        StatusCode::FORBIDDEN,
                        ErrorCode::Forbidden,
                        "Access denied",
                    )
                    .map_into_right_body(),
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{TeacherSubdivision, UserRole};

    fn user(role: UserRole, subdivision: Option<TeacherSubdivision>) -> AuthUser {
        AuthUser {
            id: 9,
            school_id: Some(1),
            email: "u@school.edu".to_string(),
            full_name: "U".to_string(),
            role,
            subdivision,
            class_id: None,
            session_token: "s".to_string(),
        }
    }

    #[test]
    fn test_prefix_is_segment_aware() {
        assert!(prefix_matches("/api/v1/users", "/api/v1/users"));
        assert!(prefix_matches("/api/v1/users/3", "/api/v1/users"));
        assert!(!prefix_matches("/api/v1/usersx", "/api/v1/users"));
    }

    #[test]
    fn test_unknown_prefix_denied() {
        let head = user(UserRole::HeadAdmin, None);
        assert!(allowed_roles("/api/v1/secret").is_none());
        assert!(!is_allowed("/api/v1/secret", &head));
        assert!(!is_allowed("/api/v2/schools", &head));
    }

    #[test]
    fn test_role_table() {
        let head = user(UserRole::HeadAdmin, None);
        let admin = user(UserRole::Admin, None);
        let director = user(UserRole::Teacher, Some(TeacherSubdivision::Director));
        let subject = user(UserRole::Teacher, Some(TeacherSubdivision::SubjectTeacher));
        let student = user(UserRole::Student, None);

        assert!(is_allowed("/api/v1/schools/1", &head));
        assert!(!is_allowed("/api/v1/schools", &admin));

        assert!(is_allowed("/api/v1/users", &admin));
        assert!(!is_allowed("/api/v1/users", &director));

        assert!(is_allowed("/api/v1/reports/overview", &director));
        assert!(!is_allowed("/api/v1/reports/overview", &subject));
        assert!(!is_allowed("/api/v1/reports/overview", &head));

        assert!(is_allowed("/api/v1/grades", &student));
        assert!(!is_allowed("/api/v1/grades", &head));
        assert!(is_allowed("/api/v1/messages/inbox", &head));
        assert!(is_allowed("/api/v1/auth/me", &student));
    }
}

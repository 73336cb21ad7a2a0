use crate::config::AppConfig;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, http::header::AUTHORIZATION};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::models::users::entities::{TeacherSubdivision, UserRole};

const BEARER_PREFIX: &str = "Bearer ";

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,                             // 用户 ID
    pub role: UserRole,                          // 用户角色
    pub school_id: Option<i64>,                  // 所属学校
    pub subdivision: Option<TeacherSubdivision>, // 教师细分角色
    pub sid: String,                             // 会话令牌，对应 sessions.token
    pub exp: usize,                              // 过期时间
    pub iat: usize,                              // 签发时间
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub struct JwtUtils;

impl JwtUtils {
    fn get_secret() -> &'static str {
        &AppConfig::get().jwt.secret
    }

    /// 为一个会话签发令牌，过期时间与会话一致
    pub fn generate_session_token(
        user_id: i64,
        role: UserRole,
        school_id: Option<i64>,
        subdivision: Option<TeacherSubdivision>,
        session_token: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            school_id,
            subdivision,
            sid: session_token.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let encoding_key = EncodingKey::from_secret(Self::get_secret().as_bytes());
        encode(&Header::default(), &claims, &encoding_key)
    }

    // 验证签名与过期时间
    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(Self::get_secret().as_bytes());
        let validation = Validation::default();

        decode::<Claims>(token, &decoding_key, &validation).map(|token_data| token_data.claims)
    }

    /// 会话到期时间
    pub fn session_expiry() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now() + chrono::Duration::hours(AppConfig::get().jwt.session_expiry_hours)
    }

    /// 创建认证 Cookie
    pub fn create_auth_cookie(token: &str) -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(config.jwt.cookie_name.clone(), token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::hours(
                config.jwt.session_expiry_hours,
            ))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production()) // 生产环境下使用 HTTPS
            .finish()
    }

    /// 创建空的认证 Cookie（用于注销）
    pub fn create_empty_auth_cookie() -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(config.jwt.cookie_name.clone(), "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 从请求中提取令牌：优先 Cookie，其次 Authorization: Bearer
    pub fn extract_token(req: &HttpRequest) -> Option<String> {
        let cookie_name = &AppConfig::get().jwt.cookie_name;
        if let Some(cookie) = req.cookie(cookie_name)
            && !cookie.value().is_empty()
        {
            return Some(cookie.value().to_string());
        }

        req.headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix(BEARER_PREFIX))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn sign(expires_at: chrono::DateTime<chrono::Utc>) -> String {
        JwtUtils::generate_session_token(
            42,
            UserRole::Teacher,
            Some(3),
            Some(TeacherSubdivision::Coordinator),
            "session-abc",
            expires_at,
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_claims() {
        let token = sign(JwtUtils::session_expiry());
        let claims = JwtUtils::verify_token(&token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, UserRole::Teacher);
        assert_eq!(claims.school_id, Some(3));
        assert_eq!(claims.subdivision, Some(TeacherSubdivision::Coordinator));
        assert_eq!(claims.sid, "session-abc");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = sign(JwtUtils::session_expiry());
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(JwtUtils::verify_token(&tampered).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = sign(chrono::Utc::now() - chrono::Duration::hours(2));
        assert!(JwtUtils::verify_token(&token).is_err());
    }

    #[test]
    fn test_extract_prefers_cookie() {
        let cookie_name = AppConfig::get().jwt.cookie_name.clone();
        let req = TestRequest::default()
            .cookie(Cookie::new(cookie_name, "from-cookie"))
            .insert_header((AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(JwtUtils::extract_token(&req).as_deref(), Some("from-cookie"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(JwtUtils::extract_token(&req).as_deref(), Some("from-header"));

        let req = TestRequest::default().to_http_request();
        assert!(JwtUtils::extract_token(&req).is_none());
    }
}

//! 路径参数提取器
//!
//! 在进入业务逻辑前完成路径参数的解析与校验，失败时直接返回统一格式的 400 响应。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_path_param(name: &str, message: String) -> actix_web::Error {
    InternalError::from_response(
        format!("invalid path parameter `{name}`"),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

/// 生成正整数 ID 路径参数提取器
macro_rules! define_safe_id_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_positive_id(req.match_info().get($param), $param).map($name))
            }
        }
    };
}

fn parse_positive_id(raw: Option<&str>, name: &str) -> Result<i64, actix_web::Error> {
    let raw = raw.ok_or_else(|| bad_path_param(name, format!("Missing path parameter: {name}")))?;
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(bad_path_param(
            name,
            format!("Path parameter `{name}` must be a positive integer"),
        )),
    }
}

define_safe_id_extractor!(SafeIDI64, "id");

/// 文件下载令牌：32 位十六进制
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeFileToken(pub String);

impl FromRequest for SafeFileToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.match_info().get("token") {
            Some(token) if is_valid_file_token(token) => Ok(SafeFileToken(token.to_string())),
            _ => Err(bad_path_param(
                "token",
                "Invalid download token".to_string(),
            )),
        };
        ready(result)
    }
}

fn is_valid_file_token(token: &str) -> bool {
    token.len() == 32 && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_safe_id_accepts_positive() {
        let (req, mut payload) = TestRequest::default()
            .param("id", "42")
            .to_http_parts();
        let id = SafeIDI64::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_safe_id_rejects_invalid() {
        for raw in ["0", "-3", "abc", "1.5"] {
            let (req, mut payload) = TestRequest::default().param("id", raw).to_http_parts();
            assert!(SafeIDI64::from_request(&req, &mut payload).await.is_err());
        }
    }

    #[actix_web::test]
    async fn test_file_token() {
        let token = "0123456789abcdef0123456789abcdef";
        let (req, mut payload) = TestRequest::default().param("token", token).to_http_parts();
        let parsed = SafeFileToken::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(parsed.0, token);

        let (req, mut payload) = TestRequest::default()
            .param("token", "../../etc/passwd")
            .to_http_parts();
        assert!(SafeFileToken::from_request(&req, &mut payload).await.is_err());
    }
}

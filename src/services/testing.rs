//! 处理器测试共用的应用状态：内存数据库、moka 缓存与会话令牌

use std::sync::Arc;

use actix_web::web;

use crate::cache::{ObjectCache, object_cache::moka::MokaCacheWrapper};
use crate::models::{
    schools::requests::NewSchool,
    users::{
        entities::{User, UserProfile, UserRole},
        requests::NewUser,
    },
};
use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};
use crate::utils::jwt::JwtUtils;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_session_token;

pub(crate) const PASSWORD: &str = "Correct-Horse-9";

pub(crate) struct TestState {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 已登录用户的请求头与会话令牌
pub(crate) struct TestSession {
    pub bearer: String,
    pub sid: String,
}

impl TestState {
    pub async fn new() -> Self {
        let storage = SeaOrmStorage::connect("sqlite::memory:", 1, 30)
            .await
            .expect("in-memory database should open");
        let cache = MokaCacheWrapper::new().expect("moka cache should build");
        Self {
            storage: Arc::new(storage),
            cache: Arc::new(cache),
        }
    }

    pub fn storage_data(&self) -> web::Data<Arc<dyn Storage>> {
        web::Data::new(self.storage.clone())
    }

    pub fn cache_data(&self) -> web::Data<Arc<dyn ObjectCache>> {
        web::Data::new(self.cache.clone())
    }

    /// 新建学校及其管理员
    pub async fn school(&self, code: &str) -> (i64, User) {
        let lower = code.to_lowercase();
        let (school, admin) = self
            .storage
            .create_school_with_admin(
                NewSchool {
                    name: format!("School {code}"),
                    code: code.to_string(),
                    email: format!("office@{lower}.edu"),
                    phone: None,
                    address: None,
                    student_rate: 2.0,
                    teacher_rate: 4.0,
                },
                new_user(None, &format!("admin@{lower}.edu"), UserRole::Admin, Default::default()),
            )
            .await
            .expect("school should be created");
        (school.id, admin)
    }

    pub async fn user(
        &self,
        school_id: Option<i64>,
        email: &str,
        role: UserRole,
        profile: UserProfile,
    ) -> User {
        self.storage
            .create_user(new_user(school_id, email, role, profile))
            .await
            .expect("user should be created")
            .user
    }

    /// 写入会话记录并签发对应的 JWT
    pub async fn session(&self, user: &User) -> TestSession {
        let detail = self
            .storage
            .get_user_detail(user.id)
            .await
            .expect("user detail should load")
            .expect("user should exist");
        let sid = generate_session_token();
        let expires_at = JwtUtils::session_expiry();
        self.storage
            .create_session(user.id, &sid, None, None, expires_at.timestamp())
            .await
            .expect("session should be created");
        let jwt = JwtUtils::generate_session_token(
            user.id,
            user.role,
            user.school_id,
            detail.profile.subdivision,
            &sid,
            expires_at,
        )
        .expect("token should sign");
        TestSession {
            bearer: format!("Bearer {jwt}"),
            sid,
        }
    }
}

pub(crate) fn new_user(
    school_id: Option<i64>,
    email: &str,
    role: UserRole,
    profile: UserProfile,
) -> NewUser {
    NewUser {
        school_id,
        email: email.to_string(),
        password_hash: hash_password(PASSWORD).expect("password should hash"),
        full_name: email.split('@').next().unwrap_or("user").to_string(),
        role,
        profile,
    }
}

use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::models::users::entities::{UserProfile, UserRole};
use crate::models::users::requests::NewUser;
use crate::storage::Storage;
use crate::utils::password::hash_password_blocking;
use crate::utils::random_code::generate_password;
use crate::utils::validate::normalize_email;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 按名称构造缓存后端
async fn try_cache_plugin(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let config = AppConfig::get();
    let cache_type = &config.cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = try_cache_plugin(cache_type).await {
        return Ok(cache);
    }

    if cache_type != "moka" {
        warn!("Falling back to Moka (in-memory) cache");
        if let Some(cache) = try_cache_plugin("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 没有总管理员时创建一个
///
/// 密码取自 `HEAD_ADMIN_PASSWORD`，未设置时生成随机密码并仅在日志中输出一次。
async fn seed_head_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users_by_role(UserRole::HeadAdmin).await {
        Ok(count) if count > 0 => {
            debug!("Found {} head admin(s), skipping seed", count);
            return;
        }
        Ok(_) => {
            info!("No head admin found, creating the initial account...");
        }
        Err(e) => {
            warn!("Failed to count head admins: {}, skipping seed", e);
            return;
        }
    }

    let bootstrap = &AppConfig::get().bootstrap;
    let password = match std::env::var("HEAD_ADMIN_PASSWORD") {
        Ok(pwd) if !pwd.is_empty() => pwd,
        _ => {
            let pwd = generate_password(16);
            warn!("==========================================================");
            warn!("  HEAD_ADMIN_PASSWORD NOT SET - USING GENERATED PASSWORD");
            warn!("  Head admin email: {}", bootstrap.head_admin_email);
            warn!("  Generated password: {}", pwd);
            warn!("  Please save this password or set HEAD_ADMIN_PASSWORD");
            warn!("==========================================================");
            pwd
        }
    };

    let password_hash = match hash_password_blocking(password).await {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash head admin password: {}, skipping seed", e);
            return;
        }
    };

    let head_admin = NewUser {
        school_id: None,
        email: normalize_email(&bootstrap.head_admin_email),
        password_hash,
        full_name: bootstrap.head_admin_name.clone(),
        role: UserRole::HeadAdmin,
        profile: UserProfile::default(),
    };

    match storage.create_user(head_admin).await {
        Ok(detail) => info!(
            "Head admin account created (ID: {}, email: {})",
            detail.user.id, detail.user.email
        ),
        Err(e) => warn!("Failed to create head admin account: {}", e),
    }
}

/// 清理过期会话
async fn purge_sessions(storage: &Arc<dyn Storage>) {
    match storage.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(count) => info!("Purged {} expired session(s)", count),
        Err(e) => warn!("Failed to purge expired sessions: {}", e),
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存与初始账号
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        debug!(
            "Registered cache backends: {:?}",
            crate::cache::register::registered_object_cache_plugins()
        );
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    seed_head_admin(&storage).await;
    purge_sessions(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    StartupContext { storage, cache }
}

//! 对象缓存层
//!
//! 缓存后端以插件形式注册（见 [`register`]），启动时按配置的 `cache.type` 选择。
//! 值统一以 JSON 字符串存储。

pub mod object_cache;
pub mod register;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端异常，无法判断键是否存在
    ExistsButNoValue,
}

impl<T> CacheResult<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            CacheResult::Found(v) => Some(v),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

/// 读取并反序列化缓存值，反序列化失败视为未命中并清除该键
pub async fn get_json<T: DeserializeOwned>(cache: &dyn ObjectCache, key: &str) -> CacheResult<T> {
    match cache.get_raw(key).await {
        CacheResult::Found(raw) => match serde_json::from_str(&raw) {
            Ok(value) => CacheResult::Found(value),
            Err(e) => {
                tracing::warn!("Dropping undecodable cache entry '{}': {}", key, e);
                cache.remove(key).await;
                CacheResult::NotFound
            }
        },
        CacheResult::NotFound => CacheResult::NotFound,
        CacheResult::ExistsButNoValue => CacheResult::ExistsButNoValue,
    }
}

pub async fn insert_json<T: Serialize>(cache: &dyn ObjectCache, key: &str, value: &T, ttl: u64) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.insert_raw(key.to_string(), raw, ttl).await,
        Err(e) => tracing::warn!("Failed to serialize cache entry '{}': {}", key, e),
    }
}

/// 会话缓存键
pub fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// 声明缓存插件：进程启动时将构造函数注册到插件表
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        let cache = <$ty>::new()
                            .map_err($crate::errors::SchoolHubError::cache_connection)?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                    })
                }),
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::object_cache::moka::MokaCacheWrapper;
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Entry {
        id: i64,
        name: String,
    }

    #[tokio::test]
    async fn test_json_helpers_round_trip() {
        let cache = MokaCacheWrapper::new().unwrap();
        let entry = Entry {
            id: 7,
            name: "Grace".into(),
        };
        insert_json(&cache, "entry:7", &entry, 0).await;
        assert_eq!(get_json::<Entry>(&cache, "entry:7").await, CacheResult::Found(entry));

        cache.remove("entry:7").await;
        assert_eq!(get_json::<Entry>(&cache, "entry:7").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_dropped() {
        let cache = MokaCacheWrapper::new().unwrap();
        cache
            .insert_raw("entry:bad".into(), "not json".into(), 0)
            .await;
        assert_eq!(get_json::<Entry>(&cache, "entry:bad").await, CacheResult::NotFound);
        assert_eq!(cache.get_raw("entry:bad").await, CacheResult::NotFound);
    }

    #[test]
    fn test_registry_contains_builtin_plugins() {
        assert!(register::get_object_cache_plugin("moka").is_some());
    }
}

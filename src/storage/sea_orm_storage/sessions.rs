use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::sessions::{ActiveModel, Column, Entity as Sessions};
use crate::entity::users;
use crate::errors::Result;
use crate::models::auth::entities::Session;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set};

impl SeaOrmStorage {
    /// 创建登录会话
    pub async fn create_session_impl(
        &self,
        user_id: i64,
        token: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
        expires_at: i64,
    ) -> Result<Session> {
        let model = ActiveModel {
            user_id: Set(user_id),
            token: Set(token.to_string()),
            user_agent: Set(user_agent),
            ip_address: Set(ip_address),
            expires_at: Set(expires_at),
            created_at: Set(now_ts()),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建会话失败"))?;
        Ok(result.into_session())
    }

    pub async fn get_session_by_token_impl(&self, token: &str) -> Result<Option<Session>> {
        let result = Sessions::find()
            .filter(Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(db_err("查询会话失败"))?;

        Ok(result.map(|m| m.into_session()))
    }

    pub async fn delete_session_impl(&self, token: &str) -> Result<bool> {
        let result = Sessions::delete_many()
            .filter(Column::Token.eq(token))
            .exec(&self.db)
            .await
            .map_err(db_err("删除会话失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 删除用户的会话，返回被删除的令牌以便清理缓存
    pub async fn delete_user_sessions_impl(
        &self,
        user_id: i64,
        keep: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut select = Sessions::find()
            .select_only()
            .column(Column::Token)
            .filter(Column::UserId.eq(user_id));
        if let Some(keep) = keep {
            select = select.filter(Column::Token.ne(keep));
        }
        let tokens: Vec<String> = select
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询会话失败"))?;

        if tokens.is_empty() {
            return Ok(tokens);
        }

        Sessions::delete_many()
            .filter(Column::Token.is_in(tokens.clone()))
            .exec(&self.db)
            .await
            .map_err(db_err("删除会话失败"))?;

        Ok(tokens)
    }

    pub async fn list_user_session_tokens_impl(&self, user_id: i64) -> Result<Vec<String>> {
        Sessions::find()
            .select_only()
            .column(Column::Token)
            .filter(Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询会话失败"))
    }

    /// 删除学校全部用户的会话（学校停用时使用）
    pub async fn delete_school_sessions_impl(&self, school_id: i64) -> Result<Vec<String>> {
        let user_ids: Vec<i64> = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::SchoolId.eq(school_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询学校用户失败"))?;
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tokens: Vec<String> = Sessions::find()
            .select_only()
            .column(Column::Token)
            .filter(Column::UserId.is_in(user_ids))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询会话失败"))?;
        if tokens.is_empty() {
            return Ok(tokens);
        }

        Sessions::delete_many()
            .filter(Column::Token.is_in(tokens.clone()))
            .exec(&self.db)
            .await
            .map_err(db_err("删除会话失败"))?;
        Ok(tokens)
    }

    /// 清理已过期会话
    pub async fn purge_expired_sessions_impl(&self) -> Result<u64> {
        let result = Sessions::delete_many()
            .filter(Column::ExpiresAt.lte(now_ts()))
            .exec(&self.db)
            .await
            .map_err(db_err("清理过期会话失败"))?;

        Ok(result.rows_affected)
    }
}

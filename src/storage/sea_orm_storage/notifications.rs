//! 通知存储操作

use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::notifications::{ActiveModel, Column, Entity as Notifications};
use crate::errors::Result;
use crate::models::{
    common::normalize_page,
    notifications::{
        entities::{NewNotification, Notification},
        requests::NotificationListParams,
        responses::NotificationListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};

fn to_active_model(new: NewNotification, now: i64) -> ActiveModel {
    ActiveModel {
        user_id: Set(new.user_id),
        notification_type: Set(new.notification_type.to_string()),
        title: Set(new.title),
        content: Set(new.content),
        reference_type: Set(new.reference_type),
        reference_id: Set(new.reference_id),
        is_read: Set(false),
        created_at: Set(now),
        ..Default::default()
    }
}

impl SeaOrmStorage {
    /// 创建通知
    pub async fn create_notification_impl(&self, new: NewNotification) -> Result<Notification> {
        let result = to_active_model(new, now_ts())
            .insert(&self.db)
            .await
            .map_err(db_err("创建通知失败"))?;

        Ok(result.into_notification())
    }

    /// 批量创建通知
    pub async fn create_notifications_impl(&self, news: Vec<NewNotification>) -> Result<u64> {
        if news.is_empty() {
            return Ok(0);
        }
        let now = now_ts();
        let count = news.len() as u64;
        let models: Vec<ActiveModel> = news.into_iter().map(|n| to_active_model(n, now)).collect();

        Notifications::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(db_err("批量创建通知失败"))?;

        Ok(count)
    }

    /// 通过 ID 获取通知
    pub async fn get_notification_by_id_impl(&self, id: i64) -> Result<Option<Notification>> {
        let result = Notifications::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询通知失败"))?;

        Ok(result.map(|m| m.into_notification()))
    }

    /// 列出用户通知（分页）
    pub async fn list_notifications_with_pagination_impl(
        &self,
        user_id: i64,
        params: NotificationListParams,
    ) -> Result<NotificationListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = Notifications::find().filter(Column::UserId.eq(user_id));

        // 未读筛选
        if let Some(true) = params.unread_only {
            select = select.filter(Column::IsRead.eq(false));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let (notifications, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询通知列表失败"))?;

        Ok(NotificationListResponse {
            items: notifications
                .into_iter()
                .map(|m| m.into_notification())
                .collect(),
            pagination,
        })
    }

    /// 获取用户未读通知数量
    pub async fn count_unread_notifications_impl(&self, user_id: i64) -> Result<i64> {
        let count = Notifications::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .count(&self.db)
            .await
            .map_err(db_err("查询未读通知数量失败"))?;

        Ok(count as i64)
    }

    /// 标记通知为已读
    pub async fn mark_notification_read_impl(&self, id: i64) -> Result<bool> {
        let result = Notifications::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err("标记通知已读失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 标记用户所有通知为已读
    pub async fn mark_all_notifications_read_impl(&self, user_id: i64) -> Result<i64> {
        let result = Notifications::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err("标记所有通知已读失败"))?;

        Ok(result.rows_affected as i64)
    }

    /// 删除通知
    pub async fn delete_notification_impl(&self, id: i64) -> Result<bool> {
        let result = Notifications::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除通知失败"))?;

        Ok(result.rows_affected > 0)
    }
}

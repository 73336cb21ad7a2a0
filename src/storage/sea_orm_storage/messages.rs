//! 站内信存储操作

use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::messages::{ActiveModel, Column, Entity as Messages};
use crate::errors::Result;
use crate::models::{
    common::normalize_page,
    messages::{
        entities::{Mailbox, Message},
        requests::{MessageListParams, SendMessageRequest},
        responses::MessageListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};

impl SeaOrmStorage {
    /// 发送站内信
    pub async fn create_message_impl(
        &self,
        school_id: Option<i64>,
        sender_id: i64,
        req: SendMessageRequest,
    ) -> Result<Message> {
        let model = ActiveModel {
            school_id: Set(school_id),
            sender_id: Set(sender_id),
            recipient_id: Set(req.recipient_id),
            subject: Set(req.subject),
            body: Set(req.body),
            is_read: Set(false),
            read_at: Set(None),
            sender_deleted: Set(false),
            recipient_deleted: Set(false),
            created_at: Set(now_ts()),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("发送消息失败"))?;
        Ok(result.into_message())
    }

    pub async fn get_message_by_id_impl(&self, id: i64) -> Result<Option<Message>> {
        let result = Messages::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询消息失败"))?;

        Ok(result.map(|m| m.into_message()))
    }

    /// 收件箱 / 发件箱（分页，不含本方已删除的消息）
    pub async fn list_messages_with_pagination_impl(
        &self,
        user_id: i64,
        mailbox: Mailbox,
        params: MessageListParams,
    ) -> Result<MessageListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = match mailbox {
            Mailbox::Inbox => Messages::find()
                .filter(Column::RecipientId.eq(user_id))
                .filter(Column::RecipientDeleted.eq(false)),
            Mailbox::Sent => Messages::find()
                .filter(Column::SenderId.eq(user_id))
                .filter(Column::SenderDeleted.eq(false)),
        };

        if let Some(true) = params.unread_only {
            select = select.filter(Column::IsRead.eq(false));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let (messages, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询消息列表失败"))?;

        Ok(MessageListResponse {
            items: messages.into_iter().map(|m| m.into_message()).collect(),
            pagination,
        })
    }

    /// 标记已读（首次阅读时记录时间）
    pub async fn mark_message_read_impl(&self, id: i64) -> Result<bool> {
        let result = Messages::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .col_expr(Column::ReadAt, Expr::value(now_ts()))
            .filter(Column::Id.eq(id))
            .filter(Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err("标记消息已读失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 按发送方/接收方分别软删除，双方都删除后移除记录
    ///
    /// 只写调用方自己的标记列，双方同时删除时不会互相覆盖。
    pub async fn delete_message_for_user_impl(&self, id: i64, user_id: i64) -> Result<bool> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let mut touched = 0;
        for (owner, flag) in [
            (Column::SenderId, Column::SenderDeleted),
            (Column::RecipientId, Column::RecipientDeleted),
        ] {
            touched += Messages::update_many()
                .col_expr(flag, Expr::value(true))
                .filter(Column::Id.eq(id))
                .filter(owner.eq(user_id))
                .filter(flag.eq(false))
                .exec(&txn)
                .await
                .map_err(db_err("删除消息失败"))?
                .rows_affected;
        }

        // 不是本人的消息，或已从自己的信箱删除
        if touched == 0 {
            txn.rollback().await.map_err(db_err("回滚事务失败"))?;
            return Ok(false);
        }

        Messages::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::SenderDeleted.eq(true))
            .filter(Column::RecipientDeleted.eq(true))
            .exec(&txn)
            .await
            .map_err(db_err("删除消息失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok(true)
    }
}

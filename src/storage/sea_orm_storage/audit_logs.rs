//! 审计日志存储操作

use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs};
use crate::errors::Result;
use crate::models::{
    audit::{
        entities::{AuditLog, NewAuditLog},
        requests::AuditLogListParams,
        responses::AuditLogListResponse,
    },
    common::normalize_page,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn create_audit_log_impl(&self, log: NewAuditLog) -> Result<AuditLog> {
        let model = ActiveModel {
            school_id: Set(log.school_id),
            actor_id: Set(log.actor_id),
            action: Set(log.action),
            target_type: Set(log.target_type),
            target_id: Set(log.target_id),
            details: Set(log.details.map(|v| v.to_string())),
            ip_address: Set(log.ip_address),
            created_at: Set(now_ts()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_err("写入审计日志失败"))?;
        Ok(result.into_audit_log())
    }

    pub async fn list_audit_logs_with_pagination_impl(
        &self,
        school_id: Option<i64>,
        params: AuditLogListParams,
    ) -> Result<AuditLogListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = AuditLogs::find();

        if let Some(school_id) = school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }
        if let Some(action) = params.action
            && !action.trim().is_empty()
        {
            select = select.filter(Column::Action.eq(action.trim()));
        }
        if let Some(actor_id) = params.actor_id {
            select = select.filter(Column::ActorId.eq(actor_id));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let (logs, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询审计日志失败"))?;

        Ok(AuditLogListResponse {
            items: logs.into_iter().map(|m| m.into_audit_log()).collect(),
            pagination,
        })
    }
}

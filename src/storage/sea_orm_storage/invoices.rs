//! 账单存储操作

use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::invoices::{ActiveModel, Column, Entity as Invoices};
use crate::entity::users;
use crate::errors::{Result, SchoolHubError};
use crate::models::{
    common::normalize_page,
    invoices::{
        entities::{Invoice, InvoiceStatus},
        requests::{InvoiceListParams, NewInvoice},
        responses::InvoiceListResponse,
    },
    users::entities::UserRole,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};

impl SeaOrmStorage {
    /// 有效学生数与教师数
    pub async fn count_billable_users_impl(&self, school_id: i64) -> Result<(i64, i64)> {
        let count_role = |role: UserRole| {
            users::Entity::find()
                .filter(users::Column::SchoolId.eq(school_id))
                .filter(users::Column::Role.eq(role.to_string()))
                .filter(users::Column::IsActive.eq(true))
                .count(&self.db)
        };

        let students = count_role(UserRole::Student)
            .await
            .map_err(db_err("统计学生人数失败"))?;
        let teachers = count_role(UserRole::Teacher)
            .await
            .map_err(db_err("统计教师人数失败"))?;

        Ok((students as i64, teachers as i64))
    }

    pub async fn create_invoice_impl(&self, new: NewInvoice) -> Result<Invoice> {
        let now = now_ts();

        let model = ActiveModel {
            school_id: Set(new.school_id),
            invoice_number: Set(new.invoice_number),
            period: Set(new.period),
            student_count: Set(new.student_count),
            teacher_count: Set(new.teacher_count),
            amount: Set(new.amount),
            status: Set(InvoiceStatus::Pending.to_string()),
            due_date: Set(new.due_date),
            paid_at: Set(None),
            payment_reference: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建账单失败"))?;
        Ok(result.into_invoice(now))
    }

    pub async fn get_invoice_by_id_impl(&self, id: i64) -> Result<Option<Invoice>> {
        let result = Invoices::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询账单失败"))?;

        let now = now_ts();
        Ok(result.map(|m| m.into_invoice(now)))
    }

    pub async fn get_invoice_by_period_impl(
        &self,
        school_id: i64,
        period: &str,
    ) -> Result<Option<Invoice>> {
        let result = Invoices::find()
            .filter(Column::SchoolId.eq(school_id))
            .filter(Column::Period.eq(period))
            .one(&self.db)
            .await
            .map_err(db_err("查询账单失败"))?;

        let now = now_ts();
        Ok(result.map(|m| m.into_invoice(now)))
    }

    /// 分页列出账单
    pub async fn list_invoices_with_pagination_impl(
        &self,
        school_id: Option<i64>,
        params: InvoiceListParams,
    ) -> Result<InvoiceListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = Invoices::find();

        if let Some(school_id) = school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }
        if let Some(status) = params.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }
        if let Some(period) = params.period {
            select = select.filter(Column::Period.eq(period));
        }

        select = select.order_by_desc(Column::Period).order_by_desc(Column::Id);

        let (invoices, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询账单列表失败"))?;

        let now = now_ts();
        Ok(InvoiceListResponse {
            items: invoices.into_iter().map(|m| m.into_invoice(now)).collect(),
            pagination,
        })
    }

    /// 更新账单状态，支付时记录时间与流水号
    ///
    /// 状态校验与写入在同一条 UPDATE 中完成，并发的支付与作废只会有一个生效。
    pub async fn update_invoice_status_impl(
        &self,
        id: i64,
        status: InvoiceStatus,
        payment_reference: Option<String>,
    ) -> Result<Option<Invoice>> {
        let now = now_ts();
        let allowed: Vec<String> = InvoiceStatus::predecessors_of(status)
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut update = Invoices::update_many()
            .col_expr(Column::Status, Expr::value(status.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(now));
        if status == InvoiceStatus::Paid {
            update = update
                .col_expr(Column::PaidAt, Expr::value(Some(now)))
                .col_expr(Column::PaymentReference, Expr::value(payment_reference));
        }

        let result = update
            .filter(Column::Id.eq(id))
            .filter(Column::Status.is_in(allowed))
            .exec(&self.db)
            .await
            .map_err(db_err("更新账单状态失败"))?;

        let Some(current) = Invoices::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询账单失败"))?
        else {
            return Ok(None);
        };

        if result.rows_affected == 0 {
            return Err(SchoolHubError::invalid_transition(format!(
                "Invoice cannot move from {} to {}",
                current.status, status
            )));
        }
        Ok(Some(current.into_invoice(now)))
    }
}

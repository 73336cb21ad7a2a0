//! 账单实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub school_id: i64,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub period: String,
    pub student_count: i32,
    pub teacher_count: i32,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub status: String,
    pub due_date: i64,
    pub paid_at: Option<i64>,
    pub payment_reference: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schools::Entity",
        from = "Column::SchoolId",
        to = "super::schools::Column::Id"
    )]
    School,
}

impl Related<super::schools::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `now` 用于计算是否逾期
    pub fn into_invoice(self, now: i64) -> crate::models::invoices::entities::Invoice {
        use crate::models::invoices::entities::{Invoice, InvoiceStatus};

        let status = self.status.parse().unwrap_or(InvoiceStatus::Pending);
        Invoice {
            id: self.id,
            school_id: self.school_id,
            invoice_number: self.invoice_number,
            period: self.period,
            student_count: self.student_count,
            teacher_count: self.teacher_count,
            amount: self.amount,
            status,
            due_date: super::to_datetime(self.due_date),
            paid_at: super::to_datetime_opt(self.paid_at),
            payment_reference: self.payment_reference,
            is_overdue: Invoice::compute_overdue(status, self.due_date, now),
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}

//! 报表统计

use super::{SeaOrmStorage, db_err};
use crate::entity::{assignments, classes, grades, invoices, users};
use crate::errors::Result;
use crate::models::{
    assignments::entities::AssignmentStatus,
    grades::entities::percentage,
    invoices::entities::InvoiceStatus,
    reports::entities::ReportOverview,
    users::entities::UserRole,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};

impl SeaOrmStorage {
    /// 学校概览
    pub async fn report_overview_impl(&self, school_id: i64) -> Result<ReportOverview> {
        let students = users::Entity::find()
            .filter(users::Column::SchoolId.eq(school_id))
            .filter(users::Column::Role.eq(UserRole::Student.to_string()))
            .count(&self.db)
            .await
            .map_err(db_err("统计学生失败"))?;

        let teachers = users::Entity::find()
            .filter(users::Column::SchoolId.eq(school_id))
            .filter(users::Column::Role.eq(UserRole::Teacher.to_string()))
            .count(&self.db)
            .await
            .map_err(db_err("统计教师失败"))?;

        let classes = classes::Entity::find()
            .filter(classes::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await
            .map_err(db_err("统计班级失败"))?;

        let active_assignments = assignments::Entity::find()
            .filter(assignments::Column::SchoolId.eq(school_id))
            .filter(assignments::Column::Status.eq(AssignmentStatus::Active.to_string()))
            .count(&self.db)
            .await
            .map_err(db_err("统计作业失败"))?;

        let pending_invoices = invoices::Entity::find()
            .filter(invoices::Column::SchoolId.eq(school_id))
            .filter(invoices::Column::Status.eq(InvoiceStatus::Pending.to_string()))
            .count(&self.db)
            .await
            .map_err(db_err("统计账单失败"))?;

        // 各数据库对浮点聚合的返回类型不一致，取出后在内存中求平均
        let scores: Vec<(f64, f64)> = grades::Entity::find()
            .select_only()
            .column(grades::Column::Score)
            .column(grades::Column::MaxScore)
            .filter(grades::Column::SchoolId.eq(school_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("统计成绩失败"))?;

        let average_grade_percentage = if scores.is_empty() {
            None
        } else {
            let total: f64 = scores.iter().map(|(s, m)| percentage(*s, *m)).sum();
            Some(((total / scores.len() as f64) * 100.0).round() / 100.0)
        };

        Ok(ReportOverview {
            school_id,
            students: students as i64,
            teachers: teachers as i64,
            classes: classes as i64,
            active_assignments: active_assignments as i64,
            pending_invoices: pending_invoices as i64,
            average_grade_percentage,
        })
    }
}

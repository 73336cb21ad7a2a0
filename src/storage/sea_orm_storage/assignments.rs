//! 作业存储操作

use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::grades;
use crate::errors::{Result, SchoolHubError};
use crate::models::{
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::{AssignmentListQuery, NewAssignment, UpdateAssignmentRequest},
        responses::AssignmentListResponse,
    },
    common::normalize_page,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建作业（初始为草稿）
    pub async fn create_assignment_impl(&self, new: NewAssignment) -> Result<Assignment> {
        let now = now_ts();

        let model = ActiveModel {
            school_id: Set(new.school_id),
            class_id: Set(new.class_id),
            teacher_id: Set(new.teacher_id),
            subject: Set(new.subject),
            title: Set(new.title),
            description: Set(new.description),
            attachment_token: Set(new.attachment_token),
            max_score: Set(new.max_score),
            due_date: Set(new.due_date),
            status: Set(AssignmentStatus::Draft.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建作业失败"))?;
        Ok(result.into_assignment())
    }

    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询作业失败"))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 分页列出作业
    pub async fn list_assignments_with_pagination_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Assignments::find();

        if let Some(school_id) = query.school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }

        if let Some(class_id) = query.class_id {
            select = select.filter(Column::ClassId.eq(class_id));
        }

        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        if let Some(statuses) = query.statuses {
            let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
            select = select.filter(Column::Status.is_in(statuses));
        }

        if let Some(subject) = query.subject {
            select = select.filter(Column::Subject.eq(subject));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let (assignments, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询作业列表失败"))?;

        Ok(AssignmentListResponse {
            items: assignments
                .into_iter()
                .map(|m| m.into_assignment())
                .collect(),
            pagination,
        })
    }

    /// 更新作业内容
    pub async fn update_assignment_impl(
        &self,
        id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        let Some(existing) = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询作业失败"))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        model.updated_at = Set(now_ts());

        if let Some(subject) = update.subject {
            model.subject = Set(subject);
        }
        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(token) = update.attachment_token {
            model.attachment_token = Set(Some(token));
        }
        if let Some(max_score) = update.max_score {
            model.max_score = Set(max_score);
        }
        if let Some(due_date) = update.due_date {
            model.due_date = Set(Some(due_date.timestamp()));
        }

        let result = model.update(&self.db).await.map_err(db_err("更新作业失败"))?;
        Ok(Some(result.into_assignment()))
    }

    /// 条件更新作业状态，当前状态不允许迁移时返回错误
    pub async fn set_assignment_status_impl(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        let allowed: Vec<String> = AssignmentStatus::predecessors_of(status)
            .iter()
            .map(|s| s.to_string())
            .collect();

        let result = Assignments::update_many()
            .col_expr(Column::Status, Expr::value(status.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(now_ts()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.is_in(allowed))
            .exec(&self.db)
            .await
            .map_err(db_err("更新作业状态失败"))?;

        let Some(current) = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询作业失败"))?
        else {
            return Ok(None);
        };

        if result.rows_affected == 0 {
            return Err(SchoolHubError::invalid_transition(format!(
                "Cannot move assignment from {} to {}",
                current.status, status
            )));
        }
        Ok(Some(current.into_assignment()))
    }

    /// 删除作业及其关联成绩
    pub async fn delete_assignment_impl(&self, id: i64) -> Result<bool> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        grades::Entity::delete_many()
            .filter(grades::Column::AssignmentId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除作业成绩失败"))?;

        let result = Assignments::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err("删除作业失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok(result.rows_affected > 0)
    }
}

use super::users::{delete_users_cascade, insert_user_with_profile};
use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::{
    assignments, audit_logs, classes, grades, invoices, messages, notifications,
    schools::{ActiveModel, Column, Entity as Schools},
    timetables, users,
};
use crate::errors::{Result, SchoolHubError};
use crate::models::{
    common::normalize_page,
    schools::{
        entities::{School, SchoolResetSummary, SchoolStats, SchoolStatus},
        requests::{NewSchool, SchoolListParams, UpdateSchoolRequest},
        responses::SchoolListResponse,
    },
    users::{
        entities::{User, UserRole},
        requests::NewUser,
    },
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    ExprTrait, sea_query::Expr,
};

/// 学校下全部用户 ID（可排除某一角色）
async fn school_user_ids<C: ConnectionTrait>(
    conn: &C,
    school_id: i64,
    exclude_role: Option<UserRole>,
) -> Result<Vec<i64>> {
    let mut select = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .filter(users::Column::SchoolId.eq(school_id));
    if let Some(role) = exclude_role {
        select = select.filter(users::Column::Role.ne(role.to_string()));
    }
    select
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err("查询学校用户失败"))
}

async fn count_school_role<C: ConnectionTrait>(
    conn: &C,
    school_id: i64,
    role: UserRole,
) -> Result<i64> {
    let count = users::Entity::find()
        .filter(users::Column::SchoolId.eq(school_id))
        .filter(users::Column::Role.eq(role.to_string()))
        .count(conn)
        .await
        .map_err(db_err("统计学校用户失败"))?;
    Ok(count as i64)
}

/// 删除学校下的教学数据：成绩、作业、课程表
async fn delete_academic_rows<C: ConnectionTrait>(
    conn: &C,
    school_id: i64,
    summary: &mut SchoolResetSummary,
) -> Result<()> {
    summary.grades = grades::Entity::delete_many()
        .filter(grades::Column::SchoolId.eq(school_id))
        .exec(conn)
        .await
        .map_err(db_err("删除成绩失败"))?
        .rows_affected;
    summary.assignments = assignments::Entity::delete_many()
        .filter(assignments::Column::SchoolId.eq(school_id))
        .exec(conn)
        .await
        .map_err(db_err("删除作业失败"))?
        .rows_affected;
    summary.timetables = timetables::Entity::delete_many()
        .filter(timetables::Column::SchoolId.eq(school_id))
        .exec(conn)
        .await
        .map_err(db_err("删除课程表失败"))?
        .rows_affected;
    Ok(())
}

impl SeaOrmStorage {
    /// 创建学校与首个管理员，任一步失败整体回滚
    pub async fn create_school_with_admin_impl(
        &self,
        school: NewSchool,
        admin: NewUser,
    ) -> Result<(School, User)> {
        let now = now_ts();
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let model = ActiveModel {
            name: Set(school.name),
            code: Set(school.code),
            email: Set(school.email),
            phone: Set(school.phone),
            address: Set(school.address),
            status: Set(SchoolStatus::Active.to_string()),
            student_rate: Set(school.student_rate),
            teacher_rate: Set(school.teacher_rate),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let school = model
            .insert(&txn)
            .await
            .map_err(db_err("创建学校失败"))?
            .into_school();

        let admin = NewUser {
            school_id: Some(school.id),
            role: UserRole::Admin,
            ..admin
        };
        let detail = insert_user_with_profile(&txn, admin, now).await?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok((school, detail.user))
    }

    pub async fn get_school_by_id_impl(&self, id: i64) -> Result<Option<School>> {
        let result = Schools::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询学校失败"))?;

        Ok(result.map(|m| m.into_school()))
    }

    pub async fn get_school_by_code_impl(&self, code: &str) -> Result<Option<School>> {
        let result = Schools::find()
            .filter(Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err("查询学校失败"))?;

        Ok(result.map(|m| m.into_school()))
    }

    /// 分页列出学校
    pub async fn list_schools_with_pagination_impl(
        &self,
        params: SchoolListParams,
    ) -> Result<SchoolListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = Schools::find();

        if let Some(ref search) = params.search
            && !search.trim().is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Expr::col(Column::Name).like(like_contains(search)))
                    .add(Expr::col(Column::Code).like(like_contains(search)))
                    .add(Expr::col(Column::Email).like(like_contains(search))),
            );
        }

        if let Some(status) = params.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select.order_by_asc(Column::Name).order_by_asc(Column::Id);

        let (schools, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询学校列表失败"))?;

        Ok(SchoolListResponse {
            items: schools.into_iter().map(|m| m.into_school()).collect(),
            pagination,
        })
    }

    pub async fn update_school_impl(
        &self,
        id: i64,
        update: UpdateSchoolRequest,
    ) -> Result<Option<School>> {
        let Some(existing) = Schools::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询学校失败"))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        model.updated_at = Set(now_ts());

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(phone) = update.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(address) = update.address {
            model.address = Set(Some(address));
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(rate) = update.student_rate {
            model.student_rate = Set(rate);
        }
        if let Some(rate) = update.teacher_rate {
            model.teacher_rate = Set(rate);
        }

        let school = model
            .update(&self.db)
            .await
            .map_err(db_err("更新学校失败"))?
            .into_school();
        Ok(Some(school))
    }

    pub async fn get_school_stats_impl(&self, id: i64) -> Result<SchoolStats> {
        let classes = classes::Entity::find()
            .filter(classes::Column::SchoolId.eq(id))
            .count(&self.db)
            .await
            .map_err(db_err("统计班级失败"))?;

        Ok(SchoolStats {
            students: count_school_role(&self.db, id, UserRole::Student).await?,
            teachers: count_school_role(&self.db, id, UserRole::Teacher).await?,
            admins: count_school_role(&self.db, id, UserRole::Admin).await?,
            classes: classes as i64,
        })
    }

    /// 删除学校及其全部数据，返回需清理的磁盘文件名；学校不存在时返回 None
    pub async fn delete_school_impl(&self, id: i64) -> Result<Option<Vec<String>>> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        if Schools::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询学校失败"))?
            .is_none()
        {
            return Ok(None);
        }

        let user_ids = school_user_ids(&txn, id, None).await?;

        messages::Entity::delete_many()
            .filter(messages::Column::SchoolId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除消息失败"))?;

        let mut summary = SchoolResetSummary::default();
        delete_academic_rows(&txn, id, &mut summary).await?;

        invoices::Entity::delete_many()
            .filter(invoices::Column::SchoolId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除账单失败"))?;

        // 用户的通知、消息、会话与资料随用户一并删除
        let removed = delete_users_cascade(&txn, &user_ids).await?;

        classes::Entity::delete_many()
            .filter(classes::Column::SchoolId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除班级失败"))?;

        audit_logs::Entity::delete_many()
            .filter(audit_logs::Column::SchoolId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除审计日志失败"))?;

        let result = Schools::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err("删除学校失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok((result.rows_affected > 0).then_some(removed.stored_files))
    }

    /// 重置学校：保留学校、管理员与账单
    pub async fn reset_school_impl(&self, id: i64) -> Result<SchoolResetSummary> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        if Schools::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询学校失败"))?
            .is_none()
        {
            return Err(SchoolHubError::not_found(format!("School {id} not found")));
        }

        let mut summary = SchoolResetSummary::default();
        delete_academic_rows(&txn, id, &mut summary).await?;

        summary.messages = messages::Entity::delete_many()
            .filter(messages::Column::SchoolId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除消息失败"))?
            .rows_affected;

        let all_users = school_user_ids(&txn, id, None).await?;
        summary.notifications = notifications::Entity::delete_many()
            .filter(notifications::Column::UserId.is_in(all_users))
            .exec(&txn)
            .await
            .map_err(db_err("删除通知失败"))?
            .rows_affected;

        let removable = school_user_ids(&txn, id, Some(UserRole::Admin)).await?;
        let removed = delete_users_cascade(&txn, &removable).await?;
        summary.users = removed.count;
        summary.stored_files = removed.stored_files;

        summary.classes = classes::Entity::delete_many()
            .filter(classes::Column::SchoolId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除班级失败"))?
            .rows_affected;

        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok(summary)
    }
}

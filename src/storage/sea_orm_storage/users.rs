use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::{
    admin_profiles, files, grades, messages, notifications, schools, sessions, student_profiles,
    teacher_profiles, users::{ActiveModel, Column, Entity as Users},
};
use crate::errors::{Result, SchoolHubError};
use crate::models::{
    common::normalize_page,
    users::{
        entities::{TeacherSubdivision, User, UserDetail, UserProfile, UserRole},
        requests::{NewUser, UpdateUserRequest, UserListParams},
        responses::UserListResponse,
    },
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    ExprTrait, sea_query::Expr,
};

/// 写入用户及其角色资料
pub(super) async fn insert_user_with_profile<C: ConnectionTrait>(
    conn: &C,
    new: NewUser,
    now: i64,
) -> Result<UserDetail> {
    let model = ActiveModel {
        school_id: Set(new.school_id),
        email: Set(new.email),
        password_hash: Set(new.password_hash),
        full_name: Set(new.full_name),
        role: Set(new.role.to_string()),
        is_active: Set(true),
        login_attempts: Set(0),
        locked_until: Set(None),
        last_login: Set(None),
        avatar_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let user = model.insert(conn).await.map_err(db_err("创建用户失败"))?.into_user();

    let profile = new.profile;
    match user.role {
        UserRole::Admin => {
            admin_profiles::ActiveModel {
                user_id: Set(user.id),
                phone: Set(profile.phone.clone()),
                title: Set(profile.title.clone()),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(db_err("创建管理员资料失败"))?;
        }
        UserRole::Teacher => {
            let subdivision = profile
                .subdivision
                .unwrap_or(TeacherSubdivision::SubjectTeacher);
            teacher_profiles::ActiveModel {
                user_id: Set(user.id),
                subdivision: Set(subdivision.to_string()),
                specialty: Set(profile.specialty.clone()),
                employee_number: Set(profile.employee_number.clone()),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(db_err("创建教师资料失败"))?;
        }
        UserRole::Student => {
            student_profiles::ActiveModel {
                user_id: Set(user.id),
                class_id: Set(profile.class_id),
                admission_number: Set(profile.admission_number.clone()),
                guardian_name: Set(profile.guardian_name.clone()),
                guardian_phone: Set(profile.guardian_phone.clone()),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(db_err("创建学生资料失败"))?;
        }
        UserRole::HeadAdmin => {}
    }

    let profile = load_profile(conn, &user).await?;
    Ok(UserDetail { user, profile })
}

/// 读取用户对应角色的资料
pub(super) async fn load_profile<C: ConnectionTrait>(conn: &C, user: &User) -> Result<UserProfile> {
    let mut profile = UserProfile::default();
    match user.role {
        UserRole::Admin => {
            if let Some(p) = admin_profiles::Entity::find()
                .filter(admin_profiles::Column::UserId.eq(user.id))
                .one(conn)
                .await
                .map_err(db_err("查询管理员资料失败"))?
            {
                p.apply_to(&mut profile);
            }
        }
        UserRole::Teacher => {
            if let Some(p) = teacher_profiles::Entity::find()
                .filter(teacher_profiles::Column::UserId.eq(user.id))
                .one(conn)
                .await
                .map_err(db_err("查询教师资料失败"))?
            {
                p.apply_to(&mut profile);
            }
        }
        UserRole::Student => {
            if let Some(p) = student_profiles::Entity::find()
                .filter(student_profiles::Column::UserId.eq(user.id))
                .one(conn)
                .await
                .map_err(db_err("查询学生资料失败"))?
            {
                p.apply_to(&mut profile);
            }
        }
        UserRole::HeadAdmin => {}
    }
    Ok(profile)
}

/// 合并更新角色资料，不存在时创建
async fn upsert_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    role: UserRole,
    update: UserProfile,
) -> Result<()> {
    match role {
        UserRole::Admin => {
            let existing = admin_profiles::Entity::find()
                .filter(admin_profiles::Column::UserId.eq(user_id))
                .one(conn)
                .await
                .map_err(db_err("查询管理员资料失败"))?;
            let mut model = match existing {
                Some(m) => m.into_active_model(),
                None => admin_profiles::ActiveModel {
                    user_id: Set(user_id),
                    ..Default::default()
                },
            };
            if update.phone.is_some() {
                model.phone = Set(update.phone);
            }
            if update.title.is_some() {
                model.title = Set(update.title);
            }
            model.save(conn).await.map_err(db_err("更新管理员资料失败"))?;
        }
        UserRole::Teacher => {
            let existing = teacher_profiles::Entity::find()
                .filter(teacher_profiles::Column::UserId.eq(user_id))
                .one(conn)
                .await
                .map_err(db_err("查询教师资料失败"))?;
            let mut model = match existing {
                Some(m) => m.into_active_model(),
                None => teacher_profiles::ActiveModel {
                    user_id: Set(user_id),
                    subdivision: Set(TeacherSubdivision::SubjectTeacher.to_string()),
                    ..Default::default()
                },
            };
            if let Some(subdivision) = update.subdivision {
                model.subdivision = Set(subdivision.to_string());
            }
            if update.specialty.is_some() {
                model.specialty = Set(update.specialty);
            }
            if update.employee_number.is_some() {
                model.employee_number = Set(update.employee_number);
            }
            model.save(conn).await.map_err(db_err("更新教师资料失败"))?;
        }
        UserRole::Student => {
            let existing = student_profiles::Entity::find()
                .filter(student_profiles::Column::UserId.eq(user_id))
                .one(conn)
                .await
                .map_err(db_err("查询学生资料失败"))?;
            let mut model = match existing {
                Some(m) => m.into_active_model(),
                None => student_profiles::ActiveModel {
                    user_id: Set(user_id),
                    ..Default::default()
                },
            };
            if update.class_id.is_some() {
                model.class_id = Set(update.class_id);
            }
            if update.admission_number.is_some() {
                model.admission_number = Set(update.admission_number);
            }
            if update.guardian_name.is_some() {
                model.guardian_name = Set(update.guardian_name);
            }
            if update.guardian_phone.is_some() {
                model.guardian_phone = Set(update.guardian_phone);
            }
            model.save(conn).await.map_err(db_err("更新学生资料失败"))?;
        }
        UserRole::HeadAdmin => {}
    }
    Ok(())
}

/// 删除一批用户及其从属数据，返回删除的用户数
pub(super) async fn delete_users_cascade<C: ConnectionTrait>(
    conn: &C,
    user_ids: &[i64],
) -> Result<RemovedUsers> {
    if user_ids.is_empty() {
        return Ok(RemovedUsers::default());
    }
    let ids = user_ids.to_vec();

    // 磁盘文件在事务提交后由调用方清理
    let stored_files: Vec<String> = files::Entity::find()
        .select_only()
        .column(files::Column::StoredName)
        .filter(files::Column::UploaderId.is_in(ids.clone()))
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err("查询用户文件失败"))?;
    files::Entity::delete_many()
        .filter(files::Column::UploaderId.is_in(ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("删除用户文件记录失败"))?;

    notifications::Entity::delete_many()
        .filter(notifications::Column::UserId.is_in(ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("删除用户通知失败"))?;
    messages::Entity::delete_many()
        .filter(
            Condition::any()
                .add(messages::Column::SenderId.is_in(ids.clone()))
                .add(messages::Column::RecipientId.is_in(ids.clone())),
        )
        .exec(conn)
        .await
        .map_err(db_err("删除用户消息失败"))?;
    sessions::Entity::delete_many()
        .filter(sessions::Column::UserId.is_in(ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("删除用户会话失败"))?;
    grades::Entity::delete_many()
        .filter(grades::Column::StudentId.is_in(ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("删除学生成绩失败"))?;
    admin_profiles::Entity::delete_many()
        .filter(admin_profiles::Column::UserId.is_in(ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("删除管理员资料失败"))?;
    teacher_profiles::Entity::delete_many()
        .filter(teacher_profiles::Column::UserId.is_in(ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("删除教师资料失败"))?;
    student_profiles::Entity::delete_many()
        .filter(student_profiles::Column::UserId.is_in(ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("删除学生资料失败"))?;

    let result = Users::delete_many()
        .filter(Column::Id.is_in(ids))
        .exec(conn)
        .await
        .map_err(db_err("删除用户失败"))?;
    Ok(RemovedUsers {
        count: result.rows_affected,
        stored_files,
    })
}

/// 级联删除的结果
#[derive(Debug, Default)]
pub(super) struct RemovedUsers {
    pub count: u64,
    /// 被删除用户上传文件的磁盘文件名
    pub stored_files: Vec<String>,
}

/// 学校中除指定用户外的有效管理员数量
async fn other_active_admins<C: ConnectionTrait>(
    conn: &C,
    school_id: i64,
    exclude_user: i64,
) -> Result<u64> {
    Users::find()
        .filter(Column::SchoolId.eq(school_id))
        .filter(Column::Role.eq(UserRole::Admin.to_string()))
        .filter(Column::IsActive.eq(true))
        .filter(Column::Id.ne(exclude_user))
        .count(conn)
        .await
        .map_err(db_err("统计管理员失败"))
}

/// 确认学校在移除该管理员后仍有有效管理员
///
/// 先对学校行加排他锁，同一学校的停用与删除在事务内串行执行。
async fn ensure_other_admin<C: ConnectionTrait>(
    conn: &C,
    school_id: i64,
    admin_id: i64,
) -> Result<()> {
    schools::Entity::find_by_id(school_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err("锁定学校失败"))?;

    if other_active_admins(conn, school_id, admin_id).await? == 0 {
        return Err(last_admin_error());
    }
    Ok(())
}

fn last_admin_error() -> SchoolHubError {
    SchoolHubError::validation("The last active admin of a school cannot be removed or deactivated")
}

impl SeaOrmStorage {
    /// 创建用户（用户与资料在同一事务中写入）
    pub async fn create_user_impl(&self, new: NewUser) -> Result<UserDetail> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;
        let detail = insert_user_with_profile(&txn, new, now_ts()).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok(detail)
    }

    /// 批量导入：任一行失败则整体回滚
    pub async fn import_users_impl(&self, users: Vec<NewUser>) -> Result<Vec<User>> {
        let now = now_ts();
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;
        let mut created = Vec::with_capacity(users.len());
        for new in users {
            let detail = insert_user_with_profile(&txn, new, now).await?;
            created.push(detail.user);
        }
        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok(created)
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询用户失败"))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err("查询用户失败"))?;

        Ok(result.map(|m| m.into_user()))
    }

    pub async fn get_user_detail_impl(&self, id: i64) -> Result<Option<UserDetail>> {
        let Some(user) = self.get_user_by_id_impl(id).await? else {
            return Ok(None);
        };
        let profile = load_profile(&self.db, &user).await?;
        Ok(Some(UserDetail { user, profile }))
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        school_id: Option<i64>,
        params: UserListParams,
    ) -> Result<UserListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = Users::find();

        if let Some(school_id) = school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }

        if let Some(ref search) = params.search
            && !search.trim().is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Expr::col(Column::Email).like(like_contains(search)))
                    .add(Expr::col(Column::FullName).like(like_contains(search))),
            );
        }

        if let Some(role) = params.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        if let Some(is_active) = params.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }

        // 细分角色在教师资料表中
        if let Some(subdivision) = params.subdivision {
            let teacher_ids: Vec<i64> = teacher_profiles::Entity::find()
                .select_only()
                .column(teacher_profiles::Column::UserId)
                .filter(teacher_profiles::Column::Subdivision.eq(subdivision.to_string()))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(db_err("查询教师资料失败"))?;
            select = select.filter(Column::Id.is_in(teacher_ids));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let (users, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询用户列表失败"))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination,
        })
    }

    /// 学校全部用户（含资料），用于导出
    pub async fn list_school_user_details_impl(&self, school_id: i64) -> Result<Vec<UserDetail>> {
        let users = Users::find()
            .filter(Column::SchoolId.eq(school_id))
            .order_by_asc(Column::Role)
            .order_by_asc(Column::FullName)
            .all(&self.db)
            .await
            .map_err(db_err("查询用户列表失败"))?;

        let mut details = Vec::with_capacity(users.len());
        for model in users {
            let user = model.into_user();
            let profile = load_profile(&self.db, &user).await?;
            details.push(UserDetail { user, profile });
        }
        Ok(details)
    }

    pub async fn find_existing_emails_impl(&self, emails: &[String]) -> Result<Vec<String>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        Users::find()
            .select_only()
            .column(Column::Email)
            .filter(Column::Email.is_in(emails.to_vec()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询邮箱失败"))
    }

    pub async fn count_users_by_role_impl(&self, role: UserRole) -> Result<u64> {
        Users::find()
            .filter(Column::Role.eq(role.to_string()))
            .count(&self.db)
            .await
            .map_err(db_err("统计用户失败"))
    }

    pub async fn count_active_admins_impl(&self, school_id: i64) -> Result<u64> {
        Users::find()
            .filter(Column::SchoolId.eq(school_id))
            .filter(Column::Role.eq(UserRole::Admin.to_string()))
            .filter(Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(db_err("统计管理员失败"))
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<UserDetail>> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let Some(existing) = Users::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询用户失败"))?
        else {
            return Ok(None);
        };
        let current = existing.clone().into_user();

        // 停用学校最后一个有效管理员
        if update.is_active == Some(false)
            && current.role == UserRole::Admin
            && current.is_active
            && let Some(school_id) = current.school_id
        {
            ensure_other_admin(&txn, school_id, id).await?;
        }

        let mut model = existing.into_active_model();
        model.updated_at = Set(now_ts());

        if let Some(full_name) = update.full_name {
            model.full_name = Set(full_name);
        }
        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(password_hash) = update.password {
            model.password_hash = Set(password_hash);
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
            if is_active {
                // 重新启用时一并解除锁定
                model.login_attempts = Set(0);
                model.locked_until = Set(None);
            }
        }
        if let Some(avatar_url) = update.avatar_url {
            model.avatar_url = Set(Some(avatar_url));
        }

        let user = model
            .update(&txn)
            .await
            .map_err(db_err("更新用户失败"))?
            .into_user();

        if let Some(profile) = update.profile {
            upsert_profile(&txn, user.id, user.role, profile).await?;
        }

        let profile = load_profile(&txn, &user).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok(Some(UserDetail { user, profile }))
    }

    pub async fn update_user_password_impl(&self, id: i64, password_hash: &str) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(Column::PasswordHash, Expr::value(password_hash.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(now_ts()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err("更新密码失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 删除用户，返回其上传文件的磁盘文件名；用户不存在时返回 None
    pub async fn delete_user_impl(&self, id: i64) -> Result<Option<Vec<String>>> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let Some(existing) = Users::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询用户失败"))?
        else {
            return Ok(None);
        };
        let user = existing.into_user();

        if user.role == UserRole::Admin
            && user.is_active
            && let Some(school_id) = user.school_id
        {
            ensure_other_admin(&txn, school_id, id).await?;
        }

        let removed = delete_users_cascade(&txn, &[id]).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok((removed.count > 0).then_some(removed.stored_files))
    }

    /// 记录一次密码错误
    ///
    /// 计数在 SQL 中自增，并发失败不会丢失；已过期的锁定先清零重新计数，
    /// 锁定期间不再累加。
    pub async fn record_login_failure_impl(
        &self,
        id: i64,
        max_attempts: i32,
        lock_until: i64,
        now: i64,
    ) -> Result<(i32, Option<i64>)> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        Users::update_many()
            .col_expr(Column::LoginAttempts, Expr::value(0))
            .col_expr(Column::LockedUntil, Expr::value(Option::<i64>::None))
            .filter(Column::Id.eq(id))
            .filter(Column::LockedUntil.lte(now))
            .exec(&txn)
            .await
            .map_err(db_err("重置登录锁定失败"))?;

        Users::update_many()
            .col_expr(
                Column::LoginAttempts,
                Expr::col(Column::LoginAttempts).add(1),
            )
            .filter(Column::Id.eq(id))
            .filter(Column::LockedUntil.is_null())
            .exec(&txn)
            .await
            .map_err(db_err("更新登录失败次数失败"))?;

        Users::update_many()
            .col_expr(Column::LockedUntil, Expr::value(Some(lock_until)))
            .filter(Column::Id.eq(id))
            .filter(Column::LockedUntil.is_null())
            .filter(Column::LoginAttempts.gte(std::cmp::Ord::max(max_attempts, 1)))
            .exec(&txn)
            .await
            .map_err(db_err("写入账号锁定失败"))?;

        let Some(user) = Users::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err("查询用户失败"))?
        else {
            return Err(SchoolHubError::not_found(format!("User {id} not found")));
        };

        txn.commit().await.map_err(db_err("提交事务失败"))?;
        Ok((user.login_attempts, user.locked_until))
    }

    pub async fn record_login_success_impl(&self, id: i64) -> Result<()> {
        Users::update_many()
            .col_expr(Column::LoginAttempts, Expr::value(0))
            .col_expr(Column::LockedUntil, Expr::value(Option::<i64>::None))
            .col_expr(Column::LastLogin, Expr::value(now_ts()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err("更新最后登录时间失败"))?;
        Ok(())
    }
}

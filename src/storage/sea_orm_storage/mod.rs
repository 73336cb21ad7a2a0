//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod audit_logs;
mod classes;
mod files;
mod grades;
mod invoices;
mod messages;
mod notifications;
mod reports;
mod schools;
mod sessions;
mod timetables;
mod users;

#[cfg(test)]
mod tests;

use crate::config::AppConfig;
use crate::errors::{Result, SchoolHubError};
use crate::models::PaginationInfo;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Select, SqlErr,
};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;
        let storage = Self::connect(&db_url, config.database.pool_size, config.database.timeout)
            .await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);
        Ok(storage)
    }

    /// 按 URL 连接并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        // 根据数据库类型选择连接方式
        let db = if url.starts_with("sqlite:") {
            Self::connect_sqlite(url, pool_size, timeout).await?
        } else {
            Self::connect_generic(url, pool_size, timeout).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| SchoolHubError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");
        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| SchoolHubError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");
        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("wal_autocheckpoint", "1000");
        }

        // 内存库每个连接各自独立，只能使用单连接
        let max_connections = if in_memory { 1 } else { pool_size.max(1) };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(if in_memory {
                None
            } else {
                Some(Duration::from_secs(300))
            })
            .connect_with(opt)
            .await
            .map_err(|e| SchoolHubError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| SchoolHubError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(SchoolHubError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 数据库错误转换：唯一约束冲突归为 Conflict，其余附带上下文
pub(crate) fn db_err(context: &'static str) -> impl Fn(DbErr) -> SchoolHubError {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            SchoolHubError::conflict(format!("{context}: {detail}"))
        }
        _ => SchoolHubError::database_operation(format!("{context}: {e}")),
    }
}

pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// 通用分页查询
pub(crate) async fn fetch_page<C, E>(
    db: &C,
    select: Select<E>,
    page: u64,
    size: u64,
) -> std::result::Result<(Vec<E::Model>, PaginationInfo), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let paginator = select.paginate(db, size);
    let total = paginator.num_items().await?;
    let pages = paginator.num_pages().await?;
    let items = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((items, PaginationInfo::new(page, size, total, pages)))
}

// Storage trait 实现
use crate::models::{
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::{AssignmentListQuery, NewAssignment, UpdateAssignmentRequest},
        responses::AssignmentListResponse,
    },
    audit::{
        entities::{AuditLog, NewAuditLog},
        requests::AuditLogListParams,
        responses::AuditLogListResponse,
    },
    auth::entities::Session,
    classes::{
        entities::Class,
        requests::{ClassListParams, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    files::entities::File,
    grades::{
        entities::Grade,
        requests::{GradeListParams, GradeUpdate, NewGrade},
        responses::GradeListResponse,
    },
    invoices::{
        entities::{Invoice, InvoiceStatus},
        requests::{InvoiceListParams, NewInvoice},
        responses::InvoiceListResponse,
    },
    messages::{
        entities::{Mailbox, Message},
        requests::{MessageListParams, SendMessageRequest},
        responses::MessageListResponse,
    },
    notifications::{
        entities::{NewNotification, Notification},
        requests::NotificationListParams,
        responses::NotificationListResponse,
    },
    reports::entities::ReportOverview,
    schools::{
        entities::{School, SchoolResetSummary, SchoolStats},
        requests::{NewSchool, SchoolListParams, UpdateSchoolRequest},
        responses::SchoolListResponse,
    },
    timetables::{
        entities::TimetableEntry,
        requests::{TimetableListParams, TimetableSlot},
    },
    users::{
        entities::{User, UserDetail, UserRole},
        requests::{NewUser, UpdateUserRequest, UserListParams},
        responses::UserListResponse,
    },
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| SchoolHubError::database_connection(format!("数据库不可用: {e}")))
    }

    // 学校模块
    async fn create_school_with_admin(
        &self,
        school: NewSchool,
        admin: NewUser,
    ) -> Result<(School, User)> {
        self.create_school_with_admin_impl(school, admin).await
    }

    async fn get_school_by_id(&self, id: i64) -> Result<Option<School>> {
        self.get_school_by_id_impl(id).await
    }

    async fn get_school_by_code(&self, code: &str) -> Result<Option<School>> {
        self.get_school_by_code_impl(code).await
    }

    async fn list_schools_with_pagination(
        &self,
        params: SchoolListParams,
    ) -> Result<SchoolListResponse> {
        self.list_schools_with_pagination_impl(params).await
    }

    async fn update_school(
        &self,
        id: i64,
        update: UpdateSchoolRequest,
    ) -> Result<Option<School>> {
        self.update_school_impl(id, update).await
    }

    async fn get_school_stats(&self, id: i64) -> Result<SchoolStats> {
        self.get_school_stats_impl(id).await
    }

    async fn delete_school(&self, id: i64) -> Result<Option<Vec<String>>> {
        self.delete_school_impl(id).await
    }

    async fn reset_school(&self, id: i64) -> Result<SchoolResetSummary> {
        self.reset_school_impl(id).await
    }

    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<UserDetail> {
        self.create_user_impl(user).await
    }

    async fn import_users(&self, users: Vec<NewUser>) -> Result<Vec<User>> {
        self.import_users_impl(users).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_detail(&self, id: i64) -> Result<Option<UserDetail>> {
        self.get_user_detail_impl(id).await
    }

    async fn list_users_with_pagination(
        &self,
        school_id: Option<i64>,
        params: UserListParams,
    ) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(school_id, params)
            .await
    }

    async fn list_school_user_details(&self, school_id: i64) -> Result<Vec<UserDetail>> {
        self.list_school_user_details_impl(school_id).await
    }

    async fn find_existing_emails(&self, emails: &[String]) -> Result<Vec<String>> {
        self.find_existing_emails_impl(emails).await
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<u64> {
        self.count_users_by_role_impl(role).await
    }

    async fn count_active_admins(&self, school_id: i64) -> Result<u64> {
        self.count_active_admins_impl(school_id).await
    }

    async fn update_user(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<UserDetail>> {
        self.update_user_impl(id, update).await
    }

    async fn update_user_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        self.update_user_password_impl(id, password_hash).await
    }

    async fn delete_user(&self, id: i64) -> Result<Option<Vec<String>>> {
        self.delete_user_impl(id).await
    }

    async fn record_login_failure(
        &self,
        id: i64,
        max_attempts: i32,
        lock_until: i64,
        now: i64,
    ) -> Result<(i32, Option<i64>)> {
        self.record_login_failure_impl(id, max_attempts, lock_until, now)
            .await
    }

    async fn record_login_success(&self, id: i64) -> Result<()> {
        self.record_login_success_impl(id).await
    }

    // 会话模块
    async fn create_session(
        &self,
        user_id: i64,
        token: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
        expires_at: i64,
    ) -> Result<Session> {
        self.create_session_impl(user_id, token, user_agent, ip_address, expires_at)
            .await
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>> {
        self.get_session_by_token_impl(token).await
    }

    async fn delete_session(&self, token: &str) -> Result<bool> {
        self.delete_session_impl(token).await
    }

    async fn delete_user_sessions(
        &self,
        user_id: i64,
        keep: Option<&str>,
    ) -> Result<Vec<String>> {
        self.delete_user_sessions_impl(user_id, keep).await
    }

    async fn list_user_session_tokens(&self, user_id: i64) -> Result<Vec<String>> {
        self.list_user_session_tokens_impl(user_id).await
    }

    async fn delete_school_sessions(&self, school_id: i64) -> Result<Vec<String>> {
        self.delete_school_sessions_impl(school_id).await
    }

    async fn purge_expired_sessions(&self) -> Result<u64> {
        self.purge_expired_sessions_impl().await
    }

    // 班级模块
    async fn create_class(&self, school_id: i64, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(school_id, class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn list_classes_with_pagination(
        &self,
        school_id: Option<i64>,
        params: ClassListParams,
    ) -> Result<ClassListResponse> {
        self.list_classes_with_pagination_impl(school_id, params)
            .await
    }

    async fn list_school_classes(&self, school_id: i64) -> Result<Vec<Class>> {
        self.list_school_classes_impl(school_id).await
    }

    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        self.update_class_impl(class_id, update).await
    }

    async fn delete_class(&self, class_id: i64) -> Result<bool> {
        self.delete_class_impl(class_id).await
    }

    async fn list_class_students(&self, class_id: i64) -> Result<Vec<User>> {
        self.list_class_students_impl(class_id).await
    }

    // 站内信模块
    async fn create_message(
        &self,
        school_id: Option<i64>,
        sender_id: i64,
        message: SendMessageRequest,
    ) -> Result<Message> {
        self.create_message_impl(school_id, sender_id, message)
            .await
    }

    async fn get_message_by_id(&self, id: i64) -> Result<Option<Message>> {
        self.get_message_by_id_impl(id).await
    }

    async fn list_messages_with_pagination(
        &self,
        user_id: i64,
        mailbox: Mailbox,
        params: MessageListParams,
    ) -> Result<MessageListResponse> {
        self.list_messages_with_pagination_impl(user_id, mailbox, params)
            .await
    }

    async fn mark_message_read(&self, id: i64) -> Result<bool> {
        self.mark_message_read_impl(id).await
    }

    async fn delete_message_for_user(&self, id: i64, user_id: i64) -> Result<bool> {
        self.delete_message_for_user_impl(id, user_id).await
    }

    // 通知模块
    async fn create_notification(&self, notification: NewNotification) -> Result<Notification> {
        self.create_notification_impl(notification).await
    }

    async fn create_notifications(&self, notifications: Vec<NewNotification>) -> Result<u64> {
        self.create_notifications_impl(notifications).await
    }

    async fn get_notification_by_id(&self, id: i64) -> Result<Option<Notification>> {
        self.get_notification_by_id_impl(id).await
    }

    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        params: NotificationListParams,
    ) -> Result<NotificationListResponse> {
        self.list_notifications_with_pagination_impl(user_id, params)
            .await
    }

    async fn count_unread_notifications(&self, user_id: i64) -> Result<i64> {
        self.count_unread_notifications_impl(user_id).await
    }

    async fn mark_notification_read(&self, id: i64) -> Result<bool> {
        self.mark_notification_read_impl(id).await
    }

    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<i64> {
        self.mark_all_notifications_read_impl(user_id).await
    }

    async fn delete_notification(&self, id: i64) -> Result<bool> {
        self.delete_notification_impl(id).await
    }

    // 作业模块
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment> {
        self.create_assignment_impl(assignment).await
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(id).await
    }

    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        self.list_assignments_with_pagination_impl(query).await
    }

    async fn update_assignment(
        &self,
        id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_impl(id, update).await
    }

    async fn set_assignment_status(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        self.set_assignment_status_impl(id, status).await
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool> {
        self.delete_assignment_impl(id).await
    }

    // 成绩模块
    async fn create_grade(&self, grade: NewGrade) -> Result<Grade> {
        self.create_grade_impl(grade).await
    }

    async fn get_grade_by_id(&self, id: i64) -> Result<Option<Grade>> {
        self.get_grade_by_id_impl(id).await
    }

    async fn list_grades_with_pagination(
        &self,
        school_id: Option<i64>,
        params: GradeListParams,
    ) -> Result<GradeListResponse> {
        self.list_grades_with_pagination_impl(school_id, params)
            .await
    }

    async fn list_student_grades(
        &self,
        student_id: i64,
        term: Option<&str>,
    ) -> Result<Vec<Grade>> {
        self.list_student_grades_impl(student_id, term).await
    }

    async fn update_grade(&self, id: i64, update: GradeUpdate) -> Result<Option<Grade>> {
        self.update_grade_impl(id, update).await
    }

    async fn delete_grade(&self, id: i64) -> Result<bool> {
        self.delete_grade_impl(id).await
    }

    // 课程表模块
    async fn create_timetable_entry(&self, slot: TimetableSlot) -> Result<TimetableEntry> {
        self.create_timetable_entry_impl(slot).await
    }

    async fn get_timetable_entry(&self, id: i64) -> Result<Option<TimetableEntry>> {
        self.get_timetable_entry_impl(id).await
    }

    async fn list_timetable_entries(
        &self,
        school_id: Option<i64>,
        params: TimetableListParams,
    ) -> Result<Vec<TimetableEntry>> {
        self.list_timetable_entries_impl(school_id, params).await
    }

    async fn update_timetable_entry(
        &self,
        id: i64,
        slot: TimetableSlot,
    ) -> Result<Option<TimetableEntry>> {
        self.update_timetable_entry_impl(id, slot).await
    }

    async fn delete_timetable_entry(&self, id: i64) -> Result<bool> {
        self.delete_timetable_entry_impl(id).await
    }

    async fn teacher_slot_taken(
        &self,
        teacher_id: i64,
        day_of_week: i32,
        period: i32,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        self.teacher_slot_taken_impl(teacher_id, day_of_week, period, exclude_id)
            .await
    }

    // 账单模块
    async fn count_billable_users(&self, school_id: i64) -> Result<(i64, i64)> {
        self.count_billable_users_impl(school_id).await
    }

    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice> {
        self.create_invoice_impl(invoice).await
    }

    async fn get_invoice_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        self.get_invoice_by_id_impl(id).await
    }

    async fn get_invoice_by_period(
        &self,
        school_id: i64,
        period: &str,
    ) -> Result<Option<Invoice>> {
        self.get_invoice_by_period_impl(school_id, period).await
    }

    async fn list_invoices_with_pagination(
        &self,
        school_id: Option<i64>,
        params: InvoiceListParams,
    ) -> Result<InvoiceListResponse> {
        self.list_invoices_with_pagination_impl(school_id, params)
            .await
    }

    async fn update_invoice_status(
        &self,
        id: i64,
        status: InvoiceStatus,
        payment_reference: Option<String>,
    ) -> Result<Option<Invoice>> {
        self.update_invoice_status_impl(id, status, payment_reference)
            .await
    }

    // 审计模块
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<AuditLog> {
        self.create_audit_log_impl(log).await
    }

    async fn list_audit_logs_with_pagination(
        &self,
        school_id: Option<i64>,
        params: AuditLogListParams,
    ) -> Result<AuditLogListResponse> {
        self.list_audit_logs_with_pagination_impl(school_id, params)
            .await
    }

    // 文件模块
    async fn create_file(
        &self,
        download_token: &str,
        original_name: &str,
        stored_name: &str,
        file_size: i64,
        file_type: &str,
        uploader_id: i64,
    ) -> Result<File> {
        self.create_file_impl(
            download_token,
            original_name,
            stored_name,
            file_size,
            file_type,
            uploader_id,
        )
        .await
    }

    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>> {
        self.get_file_by_token_impl(token).await
    }

    // 报表模块
    async fn report_overview(&self, school_id: i64) -> Result<ReportOverview> {
        self.report_overview_impl(school_id).await
    }
}

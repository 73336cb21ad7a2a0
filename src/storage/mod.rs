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

use crate::errors::Result;
use std::sync::Arc;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 系统
    // 数据库连通性检查
    async fn ping(&self) -> Result<()>;

    /// 学校管理方法
    // 创建学校及其首个管理员（单事务）
    async fn create_school_with_admin(
        &self,
        school: NewSchool,
        admin: NewUser,
    ) -> Result<(School, User)>;
    async fn get_school_by_id(&self, id: i64) -> Result<Option<School>>;
    async fn get_school_by_code(&self, code: &str) -> Result<Option<School>>;
    async fn list_schools_with_pagination(
        &self,
        params: SchoolListParams,
    ) -> Result<SchoolListResponse>;
    async fn update_school(&self, id: i64, update: UpdateSchoolRequest)
    -> Result<Option<School>>;
    async fn get_school_stats(&self, id: i64) -> Result<SchoolStats>;
    // 删除学校及其全部数据（单事务），返回待清理的磁盘文件名
    async fn delete_school(&self, id: i64) -> Result<Option<Vec<String>>>;
    // 清空教学数据与非管理员用户（单事务）
    async fn reset_school(&self, id: i64) -> Result<SchoolResetSummary>;

    /// 用户管理方法
    // 创建用户及角色资料
    async fn create_user(&self, user: NewUser) -> Result<UserDetail>;
    // 批量导入，全部成功或全部回滚
    async fn import_users(&self, users: Vec<NewUser>) -> Result<Vec<User>>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_detail(&self, id: i64) -> Result<Option<UserDetail>>;
    // school_id 为 None 时不限学校（总管理员）
    async fn list_users_with_pagination(
        &self,
        school_id: Option<i64>,
        params: UserListParams,
    ) -> Result<UserListResponse>;
    async fn list_school_user_details(&self, school_id: i64) -> Result<Vec<UserDetail>>;
    // 已存在的邮箱（用于导入前校验）
    async fn find_existing_emails(&self, emails: &[String]) -> Result<Vec<String>>;
    async fn count_users_by_role(&self, role: UserRole) -> Result<u64>;
    async fn count_active_admins(&self, school_id: i64) -> Result<u64>;
    // 更新用户，停用最后一个有效管理员时返回校验错误
    async fn update_user(&self, id: i64, update: UpdateUserRequest)
    -> Result<Option<UserDetail>>;
    async fn update_user_password(&self, id: i64, password_hash: &str) -> Result<bool>;
    // 删除用户及其资料、会话、消息、通知与文件记录，返回待清理的磁盘文件名
    async fn delete_user(&self, id: i64) -> Result<Option<Vec<String>>>;
    // 登录失败计数在库内自增，达到阈值时写入锁定时间；返回 (失败次数, 锁定截止)
    async fn record_login_failure(
        &self,
        id: i64,
        max_attempts: i32,
        lock_until: i64,
        now: i64,
    ) -> Result<(i32, Option<i64>)>;
    // 登录成功：清零计数并更新最后登录时间
    async fn record_login_success(&self, id: i64) -> Result<()>;

    /// 会话管理方法
    async fn create_session(
        &self,
        user_id: i64,
        token: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
        expires_at: i64,
    ) -> Result<Session>;
    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>>;
    async fn delete_session(&self, token: &str) -> Result<bool>;
    // 删除用户的会话（可保留当前会话），返回被删除的令牌
    async fn delete_user_sessions(&self, user_id: i64, keep: Option<&str>)
    -> Result<Vec<String>>;
    // 用户当前全部会话令牌，用于清理缓存中的身份
    async fn list_user_session_tokens(&self, user_id: i64) -> Result<Vec<String>>;
    // 删除学校下所有用户的会话，返回被删除的令牌
    async fn delete_school_sessions(&self, school_id: i64) -> Result<Vec<String>>;
    async fn purge_expired_sessions(&self) -> Result<u64>;

    /// 班级管理方法
    async fn create_class(&self, school_id: i64, class: CreateClassRequest) -> Result<Class>;
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    async fn list_classes_with_pagination(
        &self,
        school_id: Option<i64>,
        params: ClassListParams,
    ) -> Result<ClassListResponse>;
    async fn list_school_classes(&self, school_id: i64) -> Result<Vec<Class>>;
    async fn update_class(&self, class_id: i64, update: UpdateClassRequest)
    -> Result<Option<Class>>;
    async fn delete_class(&self, class_id: i64) -> Result<bool>;
    async fn list_class_students(&self, class_id: i64) -> Result<Vec<User>>;

    /// 站内信方法
    async fn create_message(
        &self,
        school_id: Option<i64>,
        sender_id: i64,
        message: SendMessageRequest,
    ) -> Result<Message>;
    async fn get_message_by_id(&self, id: i64) -> Result<Option<Message>>;
    async fn list_messages_with_pagination(
        &self,
        user_id: i64,
        mailbox: Mailbox,
        params: MessageListParams,
    ) -> Result<MessageListResponse>;
    async fn mark_message_read(&self, id: i64) -> Result<bool>;
    // 按发送方/接收方分别软删除，双方都删除后移除记录
    async fn delete_message_for_user(&self, id: i64, user_id: i64) -> Result<bool>;

    /// 通知方法
    async fn create_notification(&self, notification: NewNotification) -> Result<Notification>;
    async fn create_notifications(&self, notifications: Vec<NewNotification>) -> Result<u64>;
    async fn get_notification_by_id(&self, id: i64) -> Result<Option<Notification>>;
    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        params: NotificationListParams,
    ) -> Result<NotificationListResponse>;
    async fn count_unread_notifications(&self, user_id: i64) -> Result<i64>;
    async fn mark_notification_read(&self, id: i64) -> Result<bool>;
    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<i64>;
    async fn delete_notification(&self, id: i64) -> Result<bool>;

    /// 作业方法
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment>;
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>>;
    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse>;
    async fn update_assignment(
        &self,
        id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>>;
    async fn set_assignment_status(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<Option<Assignment>>;
    // 同时删除关联成绩
    async fn delete_assignment(&self, id: i64) -> Result<bool>;

    /// 成绩方法
    async fn create_grade(&self, grade: NewGrade) -> Result<Grade>;
    async fn get_grade_by_id(&self, id: i64) -> Result<Option<Grade>>;
    async fn list_grades_with_pagination(
        &self,
        school_id: Option<i64>,
        params: GradeListParams,
    ) -> Result<GradeListResponse>;
    async fn list_student_grades(&self, student_id: i64, term: Option<&str>)
    -> Result<Vec<Grade>>;
    async fn update_grade(&self, id: i64, update: GradeUpdate) -> Result<Option<Grade>>;
    async fn delete_grade(&self, id: i64) -> Result<bool>;

    /// 课程表方法
    async fn create_timetable_entry(&self, slot: TimetableSlot) -> Result<TimetableEntry>;
    async fn get_timetable_entry(&self, id: i64) -> Result<Option<TimetableEntry>>;
    async fn list_timetable_entries(
        &self,
        school_id: Option<i64>,
        params: TimetableListParams,
    ) -> Result<Vec<TimetableEntry>>;
    async fn update_timetable_entry(
        &self,
        id: i64,
        slot: TimetableSlot,
    ) -> Result<Option<TimetableEntry>>;
    async fn delete_timetable_entry(&self, id: i64) -> Result<bool>;
    // 教师在同一时段是否已有课程（可排除自身）
    async fn teacher_slot_taken(
        &self,
        teacher_id: i64,
        day_of_week: i32,
        period: i32,
        exclude_id: Option<i64>,
    ) -> Result<bool>;

    /// 账单方法
    // 有效学生数与教师数
    async fn count_billable_users(&self, school_id: i64) -> Result<(i64, i64)>;
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice>;
    async fn get_invoice_by_id(&self, id: i64) -> Result<Option<Invoice>>;
    async fn get_invoice_by_period(&self, school_id: i64, period: &str)
    -> Result<Option<Invoice>>;
    async fn list_invoices_with_pagination(
        &self,
        school_id: Option<i64>,
        params: InvoiceListParams,
    ) -> Result<InvoiceListResponse>;
    async fn update_invoice_status(
        &self,
        id: i64,
        status: InvoiceStatus,
        payment_reference: Option<String>,
    ) -> Result<Option<Invoice>>;

    /// 审计日志方法
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<AuditLog>;
    async fn list_audit_logs_with_pagination(
        &self,
        school_id: Option<i64>,
        params: AuditLogListParams,
    ) -> Result<AuditLogListResponse>;

    /// 文件管理方法
    async fn create_file(
        &self,
        download_token: &str,
        original_name: &str,
        stored_name: &str,
        file_size: i64,
        file_type: &str,
        uploader_id: i64,
    ) -> Result<File>;
    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>>;

    /// 报表
    async fn report_overview(&self, school_id: i64) -> Result<ReportOverview>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}

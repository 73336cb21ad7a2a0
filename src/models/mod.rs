pub mod assignments;
pub mod audit;
pub mod auth;
pub mod classes;
pub mod common;
pub mod files;
pub mod grades;
pub mod invoices;
pub mod messages;
pub mod notifications;
pub mod reports;
pub mod schools;
pub mod system;
pub mod timetables;
pub mod users;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间，用于计算运行时长
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
///
/// 0 表示成功；1xxx 通用，2xxx 认证，3xxx 学校，4xxx 用户，
/// 5xxx 班级，6xxx 消息与通知，7xxx 教学，8xxx 账单，9xxx 文件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1005,
    RateLimitExceeded = 1006,
    PayloadTooLarge = 1007,
    InternalServerError = 1099,

    AuthFailed = 2000,
    AccountLocked = 2001,
    AccountInactive = 2002,
    SchoolSuspended = 2003,
    PasswordPolicyFailed = 2004,
    SessionExpired = 2005,

    SchoolNotFound = 3000,
    SchoolAlreadyExists = 3001,

    UserNotFound = 4000,
    UserAlreadyExists = 4001,
    UserEmailInvalid = 4002,
    LastAdmin = 4003,
    CannotDeleteSelf = 4004,
    ImportFailed = 4005,

    ClassNotFound = 5000,
    ClassAlreadyExists = 5001,

    MessageNotFound = 6000,
    RecipientInvalid = 6001,
    NotificationNotFound = 6100,

    AssignmentNotFound = 7000,
    InvalidStatusTransition = 7001,
    GradeNotFound = 7100,
    GradeInvalid = 7101,
    TimetableNotFound = 7200,
    TimetableConflict = 7201,

    InvoiceNotFound = 8000,
    InvoiceAlreadyExists = 8001,

    FileNotFound = 9000,
    FileTypeNotAllowed = 9001,
    FileSizeExceeded = 9002,
    FileUploadFailed = 9003,
}

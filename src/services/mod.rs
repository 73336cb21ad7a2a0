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
#[cfg(test)]
pub(crate) mod testing;
pub mod timetables;
pub mod users;

pub use assignments::AssignmentService;
pub use audit::AuditService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use files::FileService;
pub use grades::GradeService;
pub use invoices::InvoiceService;
pub use messages::MessageService;
pub use notifications::NotificationService;
pub use reports::ReportService;
pub use schools::SchoolService;
pub use system::SystemService;
pub use timetables::TimetableService;
pub use users::UserService;

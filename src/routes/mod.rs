pub mod assignments;

pub mod audit;

pub mod auth;

pub mod classes;

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

pub use assignments::configure_assignment_routes;
pub use audit::configure_audit_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_class_routes;
pub use files::configure_file_routes;
pub use grades::configure_grade_routes;
pub use invoices::configure_invoice_routes;
pub use messages::configure_message_routes;
pub use notifications::configure_notification_routes;
pub use reports::configure_report_routes;
pub use schools::configure_school_routes;
pub use system::configure_system_routes;
pub use timetables::configure_timetable_routes;
pub use users::configure_user_routes;

/// 注册全部 API 路由
pub fn configure_api_routes(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.configure(configure_system_routes)
        .configure(configure_auth_routes)
        .configure(configure_school_routes)
        .configure(configure_user_routes)
        .configure(configure_class_routes)
        .configure(configure_message_routes)
        .configure(configure_notification_routes)
        .configure(configure_assignment_routes)
        .configure(configure_grade_routes)
        .configure(configure_timetable_routes)
        .configure(configure_invoice_routes)
        .configure(configure_audit_routes)
        .configure(configure_report_routes)
        .configure(configure_file_routes);
}

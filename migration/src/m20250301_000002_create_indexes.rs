use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_tables::{
    Assignments, AuditLogs, Classes, Grades, Invoices, Messages, Notifications, Sessions,
    Timetables, Users,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 用户按学校、角色过滤
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_school_role")
                    .table(Users::Table)
                    .col(Users::SchoolId)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_user_id")
                    .table(Sessions::Table)
                    .col(Sessions::UserId)
                    .to_owned(),
            )
            .await?;

        // 同一学校班级名唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_classes_school_name")
                    .table(Classes::Table)
                    .col(Classes::SchoolId)
                    .col(Classes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_messages_recipient")
                    .table(Messages::Table)
                    .col(Messages::RecipientId)
                    .col(Messages::IsRead)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_messages_sender")
                    .table(Messages::Table)
                    .col(Messages::SenderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user_read")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::IsRead)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_class")
                    .table(Assignments::Table)
                    .col(Assignments::ClassId)
                    .col(Assignments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_grades_student_term")
                    .table(Grades::Table)
                    .col(Grades::StudentId)
                    .col(Grades::Term)
                    .to_owned(),
            )
            .await?;

        // 同一班级同一时段只能排一节课
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_timetables_class_slot")
                    .table(Timetables::Table)
                    .col(Timetables::ClassId)
                    .col(Timetables::DayOfWeek)
                    .col(Timetables::Period)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_timetables_teacher_slot")
                    .table(Timetables::Table)
                    .col(Timetables::TeacherId)
                    .col(Timetables::DayOfWeek)
                    .col(Timetables::Period)
                    .to_owned(),
            )
            .await?;

        // 每所学校每个账期一张账单
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_invoices_school_period")
                    .table(Invoices::Table)
                    .col(Invoices::SchoolId)
                    .col(Invoices::Period)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_logs_school_created")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::SchoolId)
                    .col(AuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_audit_logs_school_created")
                    .table(AuditLogs::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_invoices_school_period")
                    .table(Invoices::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_timetables_teacher_slot")
                    .table(Timetables::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_timetables_class_slot")
                    .table(Timetables::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_grades_student_term")
                    .table(Grades::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_assignments_class")
                    .table(Assignments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_notifications_user_read")
                    .table(Notifications::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_messages_sender")
                    .table(Messages::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_messages_recipient")
                    .table(Messages::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_classes_school_name")
                    .table(Classes::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sessions_user_id")
                    .table(Sessions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_users_school_role")
                    .table(Users::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

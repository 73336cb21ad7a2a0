use super::SeaOrmStorage;
use crate::errors::SchoolHubError;
use crate::models::{
    assignments::{entities::AssignmentStatus, requests::NewAssignment},
    audit::{entities::NewAuditLog, requests::AuditLogListParams},
    classes::requests::CreateClassRequest,
    grades::{entities::LetterGrade, requests::NewGrade},
    invoices::{
        entities::InvoiceStatus,
        requests::{InvoiceListParams, NewInvoice},
    },
    messages::{entities::Mailbox, requests::{MessageListParams, SendMessageRequest}},
    notifications::{
        entities::{NewNotification, NotificationType},
        requests::NotificationListParams,
    },
    schools::requests::NewSchool,
    timetables::requests::{TimetableListParams, TimetableSlot},
    users::{
        entities::{TeacherSubdivision, UserProfile, UserRole},
        requests::{NewUser, UpdateUserRequest, UserListParams},
    },
};

async fn memory_storage() -> SeaOrmStorage {
    SeaOrmStorage::connect("sqlite::memory:", 1, 30)
        .await
        .expect("in-memory database should open")
}

fn new_school(code: &str) -> NewSchool {
    NewSchool {
        name: format!("School {code}"),
        code: code.to_string(),
        email: format!("office@{}.edu", code.to_lowercase()),
        phone: None,
        address: None,
        student_rate: 2.5,
        teacher_rate: 5.0,
    }
}

fn new_user(school_id: Option<i64>, email: &str, role: UserRole) -> NewUser {
    NewUser {
        school_id,
        email: email.to_string(),
        password_hash: "hash".to_string(),
        full_name: email.split('@').next().unwrap_or("user").to_string(),
        role,
        profile: UserProfile::default(),
    }
}

/// 创建一所学校并返回 (school_id, admin_id)
async fn seed_school(storage: &SeaOrmStorage, code: &str) -> (i64, i64) {
    let admin_email = format!("admin@{}.edu", code.to_lowercase());
    let (school, admin) = storage
        .create_school_with_admin_impl(new_school(code), new_user(None, &admin_email, UserRole::Admin))
        .await
        .unwrap();
    (school.id, admin.id)
}

#[tokio::test]
async fn test_create_school_with_admin() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;

    let admin = storage.get_user_detail_impl(admin_id).await.unwrap().unwrap();
    assert_eq!(admin.user.school_id, Some(school_id));
    assert_eq!(admin.user.role, UserRole::Admin);
    assert_eq!(storage.count_active_admins_impl(school_id).await.unwrap(), 1);

    let stats = storage.get_school_stats_impl(school_id).await.unwrap();
    assert_eq!(stats.admins, 1);
    assert_eq!(stats.students, 0);
}

#[tokio::test]
async fn test_create_school_rolls_back_on_duplicate_admin_email() {
    let storage = memory_storage().await;
    seed_school(&storage, "GVHS").await;

    // 学校代码不同，但管理员邮箱已被占用
    let result = storage
        .create_school_with_admin_impl(
            new_school("OTHER"),
            new_user(None, "admin@gvhs.edu", UserRole::Admin),
        )
        .await;
    assert!(matches!(result, Err(SchoolHubError::Conflict(_))));
    assert!(storage.get_school_by_code_impl("OTHER").await.unwrap().is_none());
}

#[tokio::test]
async fn test_last_admin_guard() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;

    let deactivate = UpdateUserRequest {
        is_active: Some(false),
        ..Default::default()
    };
    let result = storage.update_user_impl(admin_id, deactivate.clone()).await;
    assert!(matches!(result, Err(SchoolHubError::Validation(_))));
    assert!(matches!(
        storage.delete_user_impl(admin_id).await,
        Err(SchoolHubError::Validation(_))
    ));

    let second = storage
        .create_user_impl(new_user(Some(school_id), "second@gvhs.edu", UserRole::Admin))
        .await
        .unwrap();
    let updated = storage
        .update_user_impl(admin_id, deactivate)
        .await
        .unwrap()
        .unwrap();
    assert!(!updated.user.is_active);

    // 仅剩第二位有效管理员
    assert!(matches!(
        storage.delete_user_impl(second.user.id).await,
        Err(SchoolHubError::Validation(_))
    ));
}

#[tokio::test]
async fn test_concurrent_admin_removal_keeps_one_admin() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;
    let second = storage
        .create_user_impl(new_user(Some(school_id), "second@gvhs.edu", UserRole::Admin))
        .await
        .unwrap();

    let deactivate = UpdateUserRequest {
        is_active: Some(false),
        ..Default::default()
    };
    let (first, other) = tokio::join!(
        storage.update_user_impl(admin_id, deactivate.clone()),
        storage.delete_user_impl(second.user.id),
    );
    assert_ne!(first.is_ok(), other.is_ok());
    assert_eq!(storage.count_active_admins_impl(school_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_teacher_profile_defaults_and_subdivision_filter() {
    let storage = memory_storage().await;
    let (school_id, _) = seed_school(&storage, "GVHS").await;

    let plain = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();
    assert_eq!(
        plain.profile.subdivision,
        Some(TeacherSubdivision::SubjectTeacher)
    );

    let mut coordinator = new_user(Some(school_id), "t2@gvhs.edu", UserRole::Teacher);
    coordinator.profile.subdivision = Some(TeacherSubdivision::Coordinator);
    storage.create_user_impl(coordinator).await.unwrap();

    let list = storage
        .list_users_with_pagination_impl(
            Some(school_id),
            UserListParams {
                subdivision: Some(TeacherSubdivision::Coordinator),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].email, "t2@gvhs.edu");
}

#[tokio::test]
async fn test_import_is_all_or_nothing() {
    let storage = memory_storage().await;
    let (school_id, _) = seed_school(&storage, "GVHS").await;

    let rows = vec![
        new_user(Some(school_id), "s1@gvhs.edu", UserRole::Student),
        new_user(Some(school_id), "s2@gvhs.edu", UserRole::Student),
        // 与已有管理员重复
        new_user(Some(school_id), "admin@gvhs.edu", UserRole::Student),
    ];
    assert!(storage.import_users_impl(rows).await.is_err());
    assert!(storage.get_user_by_email_impl("s1@gvhs.edu").await.unwrap().is_none());

    let rows = vec![
        new_user(Some(school_id), "s1@gvhs.edu", UserRole::Student),
        new_user(Some(school_id), "s2@gvhs.edu", UserRole::Student),
    ];
    let created = storage.import_users_impl(rows).await.unwrap();
    assert_eq!(created.len(), 2);

    let existing = storage
        .find_existing_emails_impl(&["s2@gvhs.edu".to_string(), "nobody@gvhs.edu".to_string()])
        .await
        .unwrap();
    assert_eq!(existing, vec!["s2@gvhs.edu".to_string()]);
}

#[tokio::test]
async fn test_reset_school_keeps_admins() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;

    let class = storage
        .create_class_impl(
            school_id,
            CreateClassRequest {
                name: "7A".to_string(),
                grade_level: Some("7".to_string()),
                class_teacher_id: None,
            },
        )
        .await
        .unwrap();
    let mut student = new_user(Some(school_id), "s1@gvhs.edu", UserRole::Student);
    student.profile.class_id = Some(class.id);
    let student = storage.create_user_impl(student).await.unwrap();
    assert_eq!(student.profile.class_id, Some(class.id));

    let grade = storage
        .create_grade_impl(NewGrade {
            school_id,
            student_id: student.user.id,
            teacher_id: None,
            assignment_id: None,
            subject: "math".to_string(),
            term: "T1".to_string(),
            score: 45.0,
            max_score: 50.0,
            comment: None,
        })
        .await
        .unwrap();
    assert_eq!(grade.letter, LetterGrade::A);

    let summary = storage.reset_school_impl(school_id).await.unwrap();
    assert_eq!(summary.users, 1);
    assert_eq!(summary.classes, 1);
    assert_eq!(summary.grades, 1);

    assert!(storage.get_user_by_id_impl(admin_id).await.unwrap().is_some());
    assert!(storage.get_user_by_id_impl(student.user.id).await.unwrap().is_none());
    assert!(storage.get_school_by_id_impl(school_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_school_removes_everything() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;
    let (other_id, other_admin) = seed_school(&storage, "OTHER").await;

    let teacher = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();
    storage
        .create_message_impl(
            Some(school_id),
            admin_id,
            SendMessageRequest {
                recipient_id: teacher.user.id,
                subject: "hello".to_string(),
                body: "welcome".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(storage.delete_school_impl(school_id).await.unwrap().is_some());
    assert!(storage.get_school_by_id_impl(school_id).await.unwrap().is_none());
    assert!(storage.get_user_by_id_impl(teacher.user.id).await.unwrap().is_none());

    // 其他学校不受影响
    assert!(storage.get_school_by_id_impl(other_id).await.unwrap().is_some());
    assert!(storage.get_user_by_id_impl(other_admin).await.unwrap().is_some());
    assert!(storage.delete_school_impl(school_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_message_soft_delete_per_side() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;
    let teacher = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();

    let message = storage
        .create_message_impl(
            Some(school_id),
            admin_id,
            SendMessageRequest {
                recipient_id: teacher.user.id,
                subject: "timetable".to_string(),
                body: "see the new plan".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(storage.delete_message_for_user_impl(message.id, admin_id).await.unwrap());
    let sent = storage
        .list_messages_with_pagination_impl(admin_id, Mailbox::Sent, MessageListParams::default())
        .await
        .unwrap();
    assert!(sent.items.is_empty());
    let inbox = storage
        .list_messages_with_pagination_impl(
            teacher.user.id,
            Mailbox::Inbox,
            MessageListParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(inbox.items.len(), 1);

    assert!(
        storage
            .delete_message_for_user_impl(message.id, teacher.user.id)
            .await
            .unwrap()
    );
    assert!(storage.get_message_by_id_impl(message.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_message_delete_is_per_caller() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;
    let teacher = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();
    let stranger = storage
        .create_user_impl(new_user(Some(school_id), "t2@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();

    let mut ids = Vec::new();
    for i in 0..10 {
        let message = storage
            .create_message_impl(
                Some(school_id),
                admin_id,
                SendMessageRequest {
                    recipient_id: teacher.user.id,
                    subject: format!("note {i}"),
                    body: "body".to_string(),
                },
            )
            .await
            .unwrap();
        ids.push(message.id);
    }

    // 非收发双方不能删除，重复删除视为不存在
    assert!(!storage.delete_message_for_user_impl(ids[0], stranger.user.id).await.unwrap());
    assert!(storage.delete_message_for_user_impl(ids[0], admin_id).await.unwrap());
    assert!(!storage.delete_message_for_user_impl(ids[0], admin_id).await.unwrap());
    assert!(storage.get_message_by_id_impl(ids[0]).await.unwrap().is_some());

    for id in &ids[1..] {
        let (a, b) = tokio::join!(
            storage.delete_message_for_user_impl(*id, admin_id),
            storage.delete_message_for_user_impl(*id, teacher.user.id),
        );
        assert!(a.unwrap() && b.unwrap());
        assert!(storage.get_message_by_id_impl(*id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_login_counters_and_sessions() {
    let storage = memory_storage().await;
    let (_, admin_id) = seed_school(&storage, "GVHS").await;

    let now = chrono::Utc::now().timestamp();
    let lock_until = now + 7200;
    for expected in 1..5 {
        let (attempts, locked) = storage
            .record_login_failure_impl(admin_id, 5, lock_until, now)
            .await
            .unwrap();
        assert_eq!(attempts, expected);
        assert!(locked.is_none());
    }
    let (attempts, locked) = storage
        .record_login_failure_impl(admin_id, 5, lock_until, now)
        .await
        .unwrap();
    assert_eq!((attempts, locked), (5, Some(lock_until)));

    // 锁定期间不再累加
    let (attempts, _) = storage
        .record_login_failure_impl(admin_id, 5, lock_until + 60, now)
        .await
        .unwrap();
    assert_eq!(attempts, 5);
    let user = storage.get_user_by_id_impl(admin_id).await.unwrap().unwrap();
    assert_eq!(user.login_attempts, 5);
    assert!(user.locked_until.is_some());

    // 锁定过期后重新计数
    let later = lock_until + 1;
    let (attempts, locked) = storage
        .record_login_failure_impl(admin_id, 5, later + 7200, later)
        .await
        .unwrap();
    assert_eq!((attempts, locked), (1, None));

    storage.record_login_success_impl(admin_id).await.unwrap();
    let user = storage.get_user_by_id_impl(admin_id).await.unwrap().unwrap();
    assert_eq!(user.login_attempts, 0);
    assert!(user.locked_until.is_none());
    assert!(user.last_login.is_some());

    let expires = chrono::Utc::now().timestamp() + 3600;
    storage
        .create_session_impl(admin_id, "keep-me", None, None, expires)
        .await
        .unwrap();
    storage
        .create_session_impl(admin_id, "drop-me", None, None, expires)
        .await
        .unwrap();
    storage
        .create_session_impl(admin_id, "stale", None, None, expires - 7200)
        .await
        .unwrap();

    assert_eq!(storage.purge_expired_sessions_impl().await.unwrap(), 1);
    let removed = storage
        .delete_user_sessions_impl(admin_id, Some("keep-me"))
        .await
        .unwrap();
    assert_eq!(removed, vec!["drop-me".to_string()]);
    assert!(storage.get_session_by_token_impl("keep-me").await.unwrap().is_some());
}

fn slot(school_id: i64, class_id: i64, teacher_id: Option<i64>, day: i32, period: i32) -> TimetableSlot {
    TimetableSlot {
        school_id,
        class_id,
        teacher_id,
        subject: "math".to_string(),
        day_of_week: day,
        period,
        start_time: "08:00".to_string(),
        end_time: "08:45".to_string(),
        room: None,
    }
}

async fn seed_class(storage: &SeaOrmStorage, school_id: i64, name: &str) -> i64 {
    storage
        .create_class_impl(
            school_id,
            CreateClassRequest {
                name: name.to_string(),
                grade_level: None,
                class_teacher_id: None,
            },
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_timetable_slots_unique_and_ordered() {
    let storage = memory_storage().await;
    let (school_id, _) = seed_school(&storage, "GVHS").await;
    let class_a = seed_class(&storage, school_id, "7A").await;
    let class_b = seed_class(&storage, school_id, "7B").await;
    let teacher = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();
    let teacher_id = teacher.user.id;

    let later = storage
        .create_timetable_entry_impl(slot(school_id, class_a, Some(teacher_id), 2, 1))
        .await
        .unwrap();
    let first = storage
        .create_timetable_entry_impl(slot(school_id, class_a, None, 1, 3))
        .await
        .unwrap();

    // 同一班级同一时段只能有一条
    assert!(matches!(
        storage
            .create_timetable_entry_impl(slot(school_id, class_a, None, 2, 1))
            .await,
        Err(SchoolHubError::Conflict(_))
    ));

    assert!(storage.teacher_slot_taken_impl(teacher_id, 2, 1, None).await.unwrap());
    assert!(
        !storage
            .teacher_slot_taken_impl(teacher_id, 2, 1, Some(later.id))
            .await
            .unwrap()
    );
    assert!(!storage.teacher_slot_taken_impl(teacher_id, 2, 2, None).await.unwrap());

    storage
        .create_timetable_entry_impl(slot(school_id, class_b, None, 1, 1))
        .await
        .unwrap();
    let class_entries = storage
        .list_timetable_entries_impl(
            Some(school_id),
            TimetableListParams {
                class_id: Some(class_a),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: Vec<i64> = class_entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![first.id, later.id]);
}

#[tokio::test]
async fn test_invoice_lifecycle() {
    let storage = memory_storage().await;
    let (school_id, _) = seed_school(&storage, "GVHS").await;
    storage
        .create_user_impl(new_user(Some(school_id), "s1@gvhs.edu", UserRole::Student))
        .await
        .unwrap();
    storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();
    assert_eq!(storage.count_billable_users_impl(school_id).await.unwrap(), (1, 1));

    let new_invoice = |number: &str| NewInvoice {
        school_id,
        invoice_number: number.to_string(),
        period: "2025-03".to_string(),
        student_count: 1,
        teacher_count: 1,
        amount: 7.5,
        // 已过期
        due_date: chrono::Utc::now().timestamp() - 60,
    };
    let invoice = storage
        .create_invoice_impl(new_invoice("INV-202503-GVHS-AAAA"))
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert!(invoice.is_overdue);

    // 同一学校同一账期只能有一张账单
    assert!(matches!(
        storage.create_invoice_impl(new_invoice("INV-202503-GVHS-BBBB")).await,
        Err(SchoolHubError::Conflict(_))
    ));
    assert!(
        storage
            .get_invoice_by_period_impl(school_id, "2025-03")
            .await
            .unwrap()
            .is_some()
    );

    let paid = storage
        .update_invoice_status_impl(invoice.id, InvoiceStatus::Paid, Some("TX-1".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(paid.paid_at.is_some());
    assert_eq!(paid.payment_reference.as_deref(), Some("TX-1"));
    assert!(!paid.is_overdue);

    // 已支付的账单不能再作废，支付信息保持不变
    assert!(matches!(
        storage
            .update_invoice_status_impl(invoice.id, InvoiceStatus::Cancelled, None)
            .await,
        Err(SchoolHubError::InvalidTransition(_))
    ));
    let still_paid = storage.get_invoice_by_id_impl(invoice.id).await.unwrap().unwrap();
    assert_eq!(still_paid.status, InvoiceStatus::Paid);
    assert_eq!(still_paid.payment_reference.as_deref(), Some("TX-1"));
    assert!(
        storage
            .update_invoice_status_impl(9999, InvoiceStatus::Paid, None)
            .await
            .unwrap()
            .is_none()
    );

    let pending = storage
        .list_invoices_with_pagination_impl(
            Some(school_id),
            InvoiceListParams {
                status: Some(InvoiceStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(pending.items.is_empty());
}

#[tokio::test]
async fn test_report_overview_counts() {
    let storage = memory_storage().await;
    let (school_id, _) = seed_school(&storage, "GVHS").await;
    seed_class(&storage, school_id, "7A").await;
    let student = storage
        .create_user_impl(new_user(Some(school_id), "s1@gvhs.edu", UserRole::Student))
        .await
        .unwrap();

    let empty = storage.report_overview_impl(school_id).await.unwrap();
    assert_eq!(empty.students, 1);
    assert_eq!(empty.classes, 1);
    assert_eq!(empty.average_grade_percentage, None);

    for (score, max) in [(40.0, 50.0), (30.0, 50.0)] {
        storage
            .create_grade_impl(NewGrade {
                school_id,
                student_id: student.user.id,
                teacher_id: None,
                assignment_id: None,
                subject: "math".to_string(),
                term: "T1".to_string(),
                score,
                max_score: max,
                comment: None,
            })
            .await
            .unwrap();
    }
    let report = storage.report_overview_impl(school_id).await.unwrap();
    assert_eq!(report.average_grade_percentage, Some(70.0));
    assert_eq!(report.pending_invoices, 0);
}

#[tokio::test]
async fn test_audit_logs_scoped_by_school() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;
    let (other_id, other_admin) = seed_school(&storage, "OTHER").await;

    storage
        .create_audit_log_impl(
            NewAuditLog::new("class.create", "class")
                .actor(admin_id, Some(school_id))
                .target(1),
        )
        .await
        .unwrap();
    storage
        .create_audit_log_impl(NewAuditLog::new("class.create", "class").actor(other_admin, Some(other_id)))
        .await
        .unwrap();
    storage
        .create_audit_log_impl(NewAuditLog::new("user.delete", "user").actor(admin_id, Some(school_id)))
        .await
        .unwrap();

    let own = storage
        .list_audit_logs_with_pagination_impl(Some(school_id), AuditLogListParams::default())
        .await
        .unwrap();
    assert_eq!(own.items.len(), 2);

    let filtered = storage
        .list_audit_logs_with_pagination_impl(
            None,
            AuditLogListParams {
                action: Some("class.create".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.items.len(), 2);
}

#[tokio::test]
async fn test_file_records() {
    let storage = memory_storage().await;
    let (_, admin_id) = seed_school(&storage, "GVHS").await;

    let token = "0123456789abcdef0123456789abcdef";
    let file = storage
        .create_file_impl(token, "notes.pdf", &format!("{token}.pdf"), 1024, ".pdf", admin_id)
        .await
        .unwrap();
    assert_eq!(file.original_name, "notes.pdf");

    let found = storage.get_file_by_token_impl(token).await.unwrap().unwrap();
    assert_eq!(found.stored_name, format!("{token}.pdf"));
    assert!(storage.get_file_by_token_impl("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_deletions_report_stored_files() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;
    let teacher = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();
    let student = storage
        .create_user_impl(new_user(Some(school_id), "s1@gvhs.edu", UserRole::Student))
        .await
        .unwrap();
    for (token, owner) in [
        ("a".repeat(32), teacher.user.id),
        ("b".repeat(32), student.user.id),
        ("c".repeat(32), admin_id),
    ] {
        storage
            .create_file_impl(&token, "f.pdf", &format!("{token}.pdf"), 10, ".pdf", owner)
            .await
            .unwrap();
    }

    let removed = storage.delete_user_impl(teacher.user.id).await.unwrap().unwrap();
    assert_eq!(removed, vec![format!("{}.pdf", "a".repeat(32))]);
    assert!(storage.get_file_by_token_impl(&"a".repeat(32)).await.unwrap().is_none());
    assert!(storage.delete_user_impl(teacher.user.id).await.unwrap().is_none());

    // 重置只清理非管理员的文件
    let summary = storage.reset_school_impl(school_id).await.unwrap();
    assert_eq!(summary.stored_files, vec![format!("{}.pdf", "b".repeat(32))]);
    assert!(storage.get_file_by_token_impl(&"c".repeat(32)).await.unwrap().is_some());

    let removed = storage.delete_school_impl(school_id).await.unwrap().unwrap();
    assert_eq!(removed, vec![format!("{}.pdf", "c".repeat(32))]);
    assert!(storage.get_file_by_token_impl(&"c".repeat(32)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_notifications_unread_flow() {
    let storage = memory_storage().await;
    let (_, admin_id) = seed_school(&storage, "GVHS").await;

    let first = storage
        .create_notification_impl(
            NewNotification::new(admin_id, NotificationType::System, "Welcome")
                .with_content("Account ready"),
        )
        .await
        .unwrap();
    assert!(!first.is_read);
    assert_eq!(first.content.as_deref(), Some("Account ready"));

    let inserted = storage
        .create_notifications_impl(vec![
            NewNotification::new(admin_id, NotificationType::Invoice, "Invoice 2025-01")
                .with_reference("invoice", 1),
            NewNotification::new(admin_id, NotificationType::Message, "New message"),
        ])
        .await
        .unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(storage.count_unread_notifications_impl(admin_id).await.unwrap(), 3);

    assert!(storage.mark_notification_read_impl(first.id).await.unwrap());
    let unread = storage
        .list_notifications_with_pagination_impl(
            admin_id,
            NotificationListParams {
                unread_only: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unread.pagination.total, 2);
    assert!(unread.items.iter().all(|n| n.id != first.id));

    assert_eq!(storage.mark_all_notifications_read_impl(admin_id).await.unwrap(), 2);
    assert_eq!(storage.count_unread_notifications_impl(admin_id).await.unwrap(), 0);

    assert!(storage.delete_notification_impl(first.id).await.unwrap());
    assert!(storage.get_notification_by_id_impl(first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invoice_pay_and_cancel_race_has_one_winner() {
    let storage = memory_storage().await;
    let (school_id, _) = seed_school(&storage, "GVHS").await;
    let invoice = storage
        .create_invoice_impl(NewInvoice {
            school_id,
            invoice_number: "INV-202504-GVHS-CCCC".to_string(),
            period: "2025-04".to_string(),
            student_count: 0,
            teacher_count: 0,
            amount: 0.0,
            due_date: chrono::Utc::now().timestamp() + 3600,
        })
        .await
        .unwrap();

    let (pay, cancel) = tokio::join!(
        storage.update_invoice_status_impl(invoice.id, InvoiceStatus::Paid, Some("TX-2".into())),
        storage.update_invoice_status_impl(invoice.id, InvoiceStatus::Cancelled, None),
    );
    assert_ne!(pay.is_ok(), cancel.is_ok());

    let stored = storage.get_invoice_by_id_impl(invoice.id).await.unwrap().unwrap();
    match stored.status {
        InvoiceStatus::Paid => assert!(stored.paid_at.is_some()),
        InvoiceStatus::Cancelled => assert!(stored.paid_at.is_none()),
        InvoiceStatus::Pending => panic!("invoice left pending"),
    }
}

#[tokio::test]
async fn test_assignment_status_moves_forward_once() {
    let storage = memory_storage().await;
    let (school_id, _) = seed_school(&storage, "GVHS").await;
    let class_id = seed_class(&storage, school_id, "7A").await;
    let teacher = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();
    let assignment = storage
        .create_assignment_impl(NewAssignment {
            school_id,
            class_id,
            teacher_id: teacher.user.id,
            subject: "Math".to_string(),
            title: "Fractions".to_string(),
            description: None,
            attachment_token: None,
            max_score: 100.0,
            due_date: None,
        })
        .await
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Draft);

    // 草稿不能直接关闭
    assert!(matches!(
        storage
            .set_assignment_status_impl(assignment.id, AssignmentStatus::Closed)
            .await,
        Err(SchoolHubError::InvalidTransition(_))
    ));

    // 并发发布只有一次成功
    let (first, second) = tokio::join!(
        storage.set_assignment_status_impl(assignment.id, AssignmentStatus::Active),
        storage.set_assignment_status_impl(assignment.id, AssignmentStatus::Active),
    );
    assert_ne!(first.is_ok(), second.is_ok());

    let closed = storage
        .set_assignment_status_impl(assignment.id, AssignmentStatus::Closed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(closed.status, AssignmentStatus::Closed);
    assert!(
        storage
            .set_assignment_status_impl(9999, AssignmentStatus::Active)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_concurrent_login_failures_still_lock() {
    let storage = memory_storage().await;
    let (_, admin_id) = seed_school(&storage, "GVHS").await;
    let now = chrono::Utc::now().timestamp();
    let lock_until = now + 7200;

    let (a, b, c, d, e) = tokio::join!(
        storage.record_login_failure_impl(admin_id, 5, lock_until, now),
        storage.record_login_failure_impl(admin_id, 5, lock_until, now),
        storage.record_login_failure_impl(admin_id, 5, lock_until, now),
        storage.record_login_failure_impl(admin_id, 5, lock_until, now),
        storage.record_login_failure_impl(admin_id, 5, lock_until, now),
    );
    for result in [a, b, c, d, e] {
        result.unwrap();
    }

    let user = storage.get_user_by_id_impl(admin_id).await.unwrap().unwrap();
    assert_eq!(user.login_attempts, 5);
    assert_eq!(
        user.locked_until.map(|t| t.timestamp()),
        Some(lock_until)
    );
}

#[tokio::test]
async fn test_session_tokens_by_user_and_school() {
    let storage = memory_storage().await;
    let (school_id, admin_id) = seed_school(&storage, "GVHS").await;
    let (_, other_admin) = seed_school(&storage, "NHS").await;
    let teacher = storage
        .create_user_impl(new_user(Some(school_id), "t1@gvhs.edu", UserRole::Teacher))
        .await
        .unwrap();

    let expires = chrono::Utc::now().timestamp() + 3600;
    for (user_id, token) in [
        (admin_id, "admin-a"),
        (teacher.user.id, "teacher-a"),
        (teacher.user.id, "teacher-b"),
        (other_admin, "other-a"),
    ] {
        storage
            .create_session_impl(user_id, token, None, None, expires)
            .await
            .unwrap();
    }

    let mut tokens = storage.list_user_session_tokens_impl(teacher.user.id).await.unwrap();
    tokens.sort();
    assert_eq!(tokens, vec!["teacher-a".to_string(), "teacher-b".to_string()]);

    let mut revoked = storage.delete_school_sessions_impl(school_id).await.unwrap();
    revoked.sort();
    assert_eq!(revoked, vec!["admin-a", "teacher-a", "teacher-b"]);
    assert!(storage.get_session_by_token_impl("teacher-a").await.unwrap().is_none());
    assert!(storage.get_session_by_token_impl("other-a").await.unwrap().is_some());
    assert!(storage.delete_school_sessions_impl(school_id).await.unwrap().is_empty());
}

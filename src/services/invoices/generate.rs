use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::InvoiceService;
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    invoices::{
        entities::{invoice_amount, invoice_number},
        requests::{GenerateInvoiceRequest, NewInvoice},
        responses::InvoiceResponse,
    },
    notifications::entities::{NewNotification, NotificationType},
    users::entities::UserRole,
};
use crate::services::common::{
    audit, bad_request, current_user, error_response, not_found, notify,
};
use crate::utils::random_code::generate_code;
use crate::utils::validate::validate_billing_period;

const DEFAULT_DUE_DAYS: i64 = 30;
const MAX_DUE_DAYS: i64 = 365;

fn due_days(requested: Option<i64>) -> Result<i64, &'static str> {
    match requested {
        None => Ok(DEFAULT_DUE_DAYS),
        Some(days) if (1..=MAX_DUE_DAYS).contains(&days) => Ok(days),
        Some(_) => Err("due_in_days must be between 1 and 365"),
    }
}

fn conflict() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::InvoiceAlreadyExists,
        "An invoice for this period already exists",
    ))
}

pub async fn generate_invoice(
    service: &InvoiceService,
    request: &HttpRequest,
    req: GenerateInvoiceRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let period = req.period.trim().to_string();
    if let Err(msg) = validate_billing_period(&period) {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    let days = match due_days(req.due_in_days) {
        Ok(days) => days,
        Err(msg) => return Ok(bad_request(ErrorCode::ValidationFailed, msg)),
    };

    let school = match storage.get_school_by_id(req.school_id).await {
        Ok(Some(school)) => school,
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "School not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    match storage.get_invoice_by_period(school.id, &period).await {
        Ok(Some(_)) => return Ok(conflict()),
        Ok(None) => {}
        Err(e) => return Ok(error_response(&e)),
    }

    let (students, teachers) = match storage.count_billable_users(school.id).await {
        Ok(counts) => counts,
        Err(e) => return Ok(error_response(&e)),
    };

    let amount = invoice_amount(students, teachers, school.student_rate, school.teacher_rate);
    let due_date = (chrono::Utc::now() + chrono::Duration::days(days)).timestamp();
    let new_invoice = NewInvoice {
        school_id: school.id,
        invoice_number: invoice_number(&period, &school.code, &generate_code(4)),
        period,
        student_count: students as i32,
        teacher_count: teachers as i32,
        amount,
        due_date,
    };

    let invoice = match storage.create_invoice(new_invoice).await {
        Ok(invoice) => invoice,
        Err(SchoolHubError::Conflict(_)) => return Ok(conflict()),
        Err(e) => return Ok(error_response(&e)),
    };

    info!(
        "Invoice {} generated for school {}: {:.2}",
        invoice.invoice_number, school.id, invoice.amount
    );

    // 通知学校管理员
    match storage.list_school_user_details(school.id).await {
        Ok(details) => {
            let title = format!("New invoice {}", invoice.invoice_number);
            let content = format!(
                "Amount {:.2} for {}, due {}",
                invoice.amount,
                invoice.period,
                invoice.due_date.format("%Y-%m-%d")
            );
            let notifications = details
                .into_iter()
                .filter(|d| d.user.role == UserRole::Admin && d.user.is_active)
                .map(|d| {
                    NewNotification::new(d.user.id, NotificationType::Invoice, title.clone())
                        .with_content(content.clone())
                        .with_reference("invoice", invoice.id)
                })
                .collect();
            notify(&storage, notifications).await;
        }
        Err(e) => tracing::warn!("Failed to load admins for invoice notification: {}", e),
    }

    audit(
        &storage,
        request,
        NewAuditLog::new("invoice.generate", "invoice")
            .actor(current.id, current.school_id)
            .school(Some(school.id))
            .target(invoice.id)
            .details(serde_json::json!({
                "period": invoice.period,
                "amount": invoice.amount,
                "students": students,
                "teachers": teachers,
            })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        InvoiceResponse { invoice },
        "Invoice generated",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_days() {
        assert_eq!(due_days(None), Ok(30));
        assert_eq!(due_days(Some(14)), Ok(14));
        assert!(due_days(Some(0)).is_err());
        assert!(due_days(Some(400)).is_err());
    }
}

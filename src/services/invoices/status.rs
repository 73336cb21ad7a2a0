use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{InvoiceService, visible_invoice};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    invoices::{entities::InvoiceStatus, responses::InvoiceResponse},
};
use crate::services::common::{
    audit, bad_request, current_user, error_response, forbidden, not_found,
};

pub async fn transition(
    service: &InvoiceService,
    request: &HttpRequest,
    id: i64,
    next: InvoiceStatus,
    payment_reference: Option<String>,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 仅总管理员可以作废账单
    if next == InvoiceStatus::Cancelled && !current.is_head_admin() {
        return Ok(forbidden("Only the head admin can cancel invoices"));
    }

    let invoice = match visible_invoice(&storage, &current, id).await {
        Ok(invoice) => invoice,
        Err(resp) => return Ok(resp),
    };

    if !invoice.status.can_transition_to(next) {
        return Ok(bad_request(
            ErrorCode::InvalidStatusTransition,
            format!("Invoice cannot move from {} to {}", invoice.status, next),
        ));
    }

    let reference = payment_reference
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if reference.as_ref().is_some_and(|r| r.len() > 100) {
        return Ok(bad_request(
            ErrorCode::ValidationFailed,
            "payment_reference must be at most 100 characters",
        ));
    }

    match storage.update_invoice_status(id, next, reference).await {
        Ok(Some(invoice)) => {
            let action = match next {
                InvoiceStatus::Paid => "invoice.pay",
                _ => "invoice.cancel",
            };
            audit(
                &storage,
                request,
                NewAuditLog::new(action, "invoice")
                    .actor(current.id, current.school_id)
                    .school(Some(invoice.school_id))
                    .target(invoice.id),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                InvoiceResponse { invoice },
                format!("Invoice {next}"),
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::InvoiceNotFound, "Invoice not found")),
        Err(e) => Ok(error_response(&e)),
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{GradeService, school_grade};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    grades::{
        requests::{GradeUpdate, UpdateGradeRequest},
        responses::GradeResponse,
    },
};
use crate::services::common::{audit, bad_request, current_user, error_response, not_found};
use crate::utils::validate::{validate_required_text, validate_score};

pub async fn update_grade(
    service: &GradeService,
    request: &HttpRequest,
    id: i64,
    update: UpdateGradeRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let existing = match school_grade(&storage, &current, id).await {
        Ok(grade) => grade,
        Err(resp) => return Ok(resp),
    };

    // 分数与满分合并后整体校验
    let score = update.score.unwrap_or(existing.score);
    let max_score = update.max_score.unwrap_or(existing.max_score);
    if let Err(msg) = validate_score(score, max_score) {
        return Ok(bad_request(ErrorCode::GradeInvalid, msg));
    }
    for (field, value, max) in [("subject", &update.subject, 100), ("term", &update.term, 50)] {
        if let Some(value) = value
            && let Err(msg) = validate_required_text(value, max)
        {
            return Ok(bad_request(ErrorCode::ValidationFailed, format!("{field}: {msg}")));
        }
    }

    let grade_update = GradeUpdate {
        subject: update.subject.map(|s| s.trim().to_string()),
        term: update.term.map(|t| t.trim().to_string()),
        score,
        max_score,
        comment: update.comment,
    };

    match storage.update_grade(id, grade_update).await {
        Ok(Some(grade)) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("grade.update", "grade")
                    .actor(current.id, current.school_id)
                    .target(id),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(GradeResponse { grade }, "Grade updated")))
        }
        Ok(None) => Ok(not_found(ErrorCode::GradeNotFound, "Grade not found")),
        Err(e) => Ok(error_response(&e)),
    }
}

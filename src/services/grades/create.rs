use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{GradeService, school_student};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    grades::{
        requests::{CreateGradeRequest, NewGrade},
        responses::GradeResponse,
    },
    notifications::entities::{NewNotification, NotificationType},
};
use crate::services::common::{
    audit, bad_request, current_user, error_response, notify, resolve_school,
};
use crate::utils::validate::{validate_required_text, validate_score};

pub async fn create_grade(
    service: &GradeService,
    request: &HttpRequest,
    req: CreateGradeRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, None) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = validate_score(req.score, req.max_score) {
        return Ok(bad_request(ErrorCode::GradeInvalid, msg));
    }
    if let Err(msg) = validate_required_text(&req.subject, 100) {
        return Ok(bad_request(ErrorCode::ValidationFailed, format!("subject: {msg}")));
    }
    if let Err(msg) = validate_required_text(&req.term, 50) {
        return Ok(bad_request(ErrorCode::ValidationFailed, format!("term: {msg}")));
    }

    let student = match school_student(&storage, &current, req.student_id).await {
        Ok(student) => student,
        Err(resp) => return Ok(resp),
    };

    if let Some(assignment_id) = req.assignment_id {
        match storage.get_assignment_by_id(assignment_id).await {
            Ok(Some(a)) if a.school_id == school_id => {}
            Ok(_) => {
                return Ok(bad_request(
                    ErrorCode::AssignmentNotFound,
                    "Assignment does not belong to this school",
                ));
            }
            Err(e) => return Ok(error_response(&e)),
        }
    }

    let new_grade = NewGrade {
        school_id,
        student_id: student.id,
        teacher_id: Some(current.id),
        assignment_id: req.assignment_id,
        subject: req.subject.trim().to_string(),
        term: req.term.trim().to_string(),
        score: req.score,
        max_score: req.max_score,
        comment: req.comment,
    };

    match storage.create_grade(new_grade).await {
        Ok(grade) => {
            notify(
                &storage,
                vec![
                    NewNotification::new(
                        student.id,
                        NotificationType::Grade,
                        format!("New grade in {}", grade.subject),
                    )
                    .with_content(format!("{} / {} ({})", grade.score, grade.max_score, grade.letter))
                    .with_reference("grade", grade.id),
                ],
            )
            .await;
            audit(
                &storage,
                request,
                NewAuditLog::new("grade.create", "grade")
                    .actor(current.id, current.school_id)
                    .target(grade.id)
                    .details(serde_json::json!({ "student_id": student.id })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(GradeResponse { grade }, "Grade recorded")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

//! 用户批量导入（CSV）
//!
//! 先逐行校验，任一行有误则整体拒绝；全部通过后在一个事务内写入。

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use tracing::{info, warn};

use super::UserService;
use crate::config::AppConfig;
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    users::{
        entities::{TeacherSubdivision, UserProfile, UserRole},
        requests::{NewUser, UserSchoolParams},
        responses::{ImportRowError, UserImportResponse},
    },
};
use crate::services::common::{audit, bad_request, current_user, error_response, resolve_school};
use crate::utils::password::hash_password_blocking;
use crate::utils::validate::{
    normalize_email, validate_email, validate_full_name, validate_password_simple,
};

/// 单次导入的最大行数
pub const MAX_IMPORT_ROWS: usize = 1000;

const REQUIRED_COLUMNS: [&str; 4] = ["full_name", "email", "password", "role"];

/// CSV 中的一行（未校验）
#[derive(Debug, Clone, Default)]
struct ImportRow {
    row_num: usize,
    full_name: String,
    email: String,
    password: String,
    role: String,
    subdivision: Option<String>,
    class_name: Option<String>,
    admission_number: Option<String>,
}

/// 校验通过、待写入的行
#[derive(Debug, Clone)]
struct ValidRow {
    email: String,
    password: String,
    full_name: String,
    role: UserRole,
    profile: UserProfile,
}

fn row_error(row: usize, field: &str, message: impl Into<String>) -> ImportRowError {
    ImportRowError {
        row,
        field: field.to_string(),
        message: message.into(),
    }
}

fn parse_csv(data: &[u8]) -> Result<Vec<ImportRow>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(data));

    let headers = rdr
        .headers()
        .map_err(|e| format!("Failed to read header row: {e}"))?;
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').to_lowercase(), i))
        .collect();

    for column in REQUIRED_COLUMNS {
        if !header_map.contains_key(column) {
            return Err(format!("Missing required column: {column}"));
        }
    }
    let idx = |name: &str| header_map.get(name).copied();

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| format!("Row {} could not be parsed: {e}", i + 2))?;
        // 行号按文件实际行计算，第 1 行是表头
        let row_num = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);
        let get = |name: &str| {
            idx(name)
                .and_then(|i| record.get(i))
                .unwrap_or("")
                .to_string()
        };
        let optional = |name: &str| Some(get(name)).filter(|s| !s.is_empty());

        // 跳过空行
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        rows.push(ImportRow {
            row_num,
            full_name: get("full_name"),
            email: get("email"),
            password: get("password"),
            role: get("role"),
            subdivision: optional("subdivision"),
            class_name: optional("class_name"),
            admission_number: optional("admission_number"),
        });
    }

    Ok(rows)
}

/// 逐行校验并检查文件内重复；`classes` 为本校班级名到 ID 的映射
fn validate_rows(
    rows: &[ImportRow],
    classes: &HashMap<String, i64>,
) -> (Vec<ValidRow>, Vec<ImportRowError>) {
    let mut valid = Vec::new();
    let mut errors = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let before = errors.len();
        let email = normalize_email(&row.email);

        if let Err(msg) = validate_full_name(&row.full_name) {
            errors.push(row_error(row.row_num, "full_name", msg));
        }
        if let Err(msg) = validate_email(&email) {
            errors.push(row_error(row.row_num, "email", msg));
        } else if let Some(first) = seen.get(&email) {
            errors.push(row_error(
                row.row_num,
                "email",
                format!("Duplicate email, first seen on row {first}"),
            ));
        } else {
            seen.insert(email.clone(), row.row_num);
        }
        if let Err(msg) = validate_password_simple(&row.password) {
            errors.push(row_error(row.row_num, "password", msg));
        }

        let role = match row.role.to_lowercase().parse::<UserRole>() {
            Ok(UserRole::HeadAdmin) | Err(_) => {
                errors.push(row_error(
                    row.row_num,
                    "role",
                    format!("Role must be admin, teacher or student, got '{}'", row.role),
                ));
                None
            }
            Ok(role) => Some(role),
        };

        let mut profile = UserProfile::default();
        match role {
            Some(UserRole::Teacher) => {
                if let Some(raw) = &row.subdivision {
                    match raw.to_lowercase().parse::<TeacherSubdivision>() {
                        Ok(sub) => profile.subdivision = Some(sub),
                        Err(_) => errors.push(row_error(
                            row.row_num,
                            "subdivision",
                            format!("Unknown subdivision '{raw}'"),
                        )),
                    }
                }
            }
            Some(UserRole::Student) => {
                if let Some(name) = &row.class_name {
                    match classes.get(&name.to_lowercase()) {
                        Some(id) => profile.class_id = Some(*id),
                        None => errors.push(row_error(
                            row.row_num,
                            "class_name",
                            format!("Class '{name}' does not exist"),
                        )),
                    }
                }
                profile.admission_number = row.admission_number.clone();
            }
            _ => {}
        }

        if errors.len() == before
            && let Some(role) = role
        {
            valid.push(ValidRow {
                email,
                password: row.password.clone(),
                full_name: row.full_name.clone(),
                role,
                profile,
            });
        }
    }

    (valid, errors)
}

async fn read_csv_field(payload: &mut Multipart, max_size: usize) -> Result<Vec<u8>, String> {
    let mut data = Vec::new();
    let mut found = false;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("Failed to read multipart field: {e}"))?;
        if field.name() != Some("file") {
            continue;
        }
        found = true;
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| format!("Failed to read upload: {e}"))?;
            if data.len() + chunk.len() > max_size {
                return Err(format!("File exceeds the {max_size} byte limit"));
            }
            data.extend_from_slice(&chunk);
        }
    }

    if !found {
        return Err("Missing 'file' field".to_string());
    }
    if data.is_empty() {
        return Err("Uploaded file is empty".to_string());
    }
    Ok(data)
}

fn import_failed(total: usize, errors: Vec<ImportRowError>) -> HttpResponse {
    let message = format!("Import rejected: {} invalid rows", errors.len());
    HttpResponse::BadRequest().json(ApiResponse::error(
        ErrorCode::ImportFailed,
        UserImportResponse {
            total,
            created: 0,
            errors,
        },
        message,
    ))
}

pub async fn import_users(
    service: &UserService,
    request: &HttpRequest,
    params: UserSchoolParams,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, params.school_id) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    // 1. 读取并解析文件
    let data = match read_csv_field(&mut payload, AppConfig::get().upload.max_size).await {
        Ok(data) => data,
        Err(msg) => return Ok(bad_request(ErrorCode::ImportFailed, msg)),
    };
    let rows = match parse_csv(&data) {
        Ok(rows) => rows,
        Err(msg) => return Ok(bad_request(ErrorCode::ImportFailed, msg)),
    };
    if rows.is_empty() {
        return Ok(bad_request(ErrorCode::ImportFailed, "File contains no data rows"));
    }
    if rows.len() > MAX_IMPORT_ROWS {
        return Ok(bad_request(
            ErrorCode::ImportFailed,
            format!("At most {MAX_IMPORT_ROWS} rows can be imported at once"),
        ));
    }

    // 2. 逐行校验
    let classes = match storage.list_school_classes(school_id).await {
        Ok(classes) => classes
            .into_iter()
            .map(|c| (c.name.to_lowercase(), c.id))
            .collect::<HashMap<_, _>>(),
        Err(e) => return Ok(error_response(&e)),
    };
    let (valid, mut errors) = validate_rows(&rows, &classes);

    // 3. 与数据库中已有邮箱比对
    let emails: Vec<String> = valid.iter().map(|r| r.email.clone()).collect();
    let existing: HashSet<String> = match storage.find_existing_emails(&emails).await {
        Ok(found) => found.into_iter().collect(),
        Err(e) => return Ok(error_response(&e)),
    };
    for row in &rows {
        if existing.contains(&normalize_email(&row.email)) {
            errors.push(row_error(row.row_num, "email", "Email is already registered"));
        }
    }

    if !errors.is_empty() {
        errors.sort_by_key(|e| e.row);
        warn!("User import rejected for school {}: {} errors", school_id, errors.len());
        return Ok(import_failed(rows.len(), errors));
    }

    // 4. 哈希密码后整体写入
    let mut new_users = Vec::with_capacity(valid.len());
    for row in valid {
        let password_hash = match hash_password_blocking(row.password).await {
            Ok(hash) => hash,
            Err(e) => return Ok(error_response(&e)),
        };
        new_users.push(NewUser {
            school_id: Some(school_id),
            email: row.email,
            password_hash,
            full_name: row.full_name.trim().to_string(),
            role: row.role,
            profile: row.profile,
        });
    }

    match storage.import_users(new_users).await {
        Ok(created) => {
            info!("Imported {} users into school {}", created.len(), school_id);
            audit(
                &storage,
                request,
                NewAuditLog::new("user.import", "school")
                    .school(Some(school_id))
                    .actor(current.id, current.school_id)
                    .target(school_id)
                    .details(serde_json::json!({ "created": created.len() })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserImportResponse {
                    total: rows.len(),
                    created: created.len(),
                    errors: Vec::new(),
                },
                "Import completed",
            )))
        }
        Err(SchoolHubError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "An email is already in use"),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "full_name,email,password,role,subdivision,class_name,admission_number\n\
        Ada Lovelace,ada@gvhs.edu,Classroom42,teacher,coordinator,,\n\
        Alan Turing,ALAN@gvhs.edu,Classroom42,student,,7A,S-001\n";

    fn classes() -> HashMap<String, i64> {
        HashMap::from([("7a".to_string(), 11)])
    }

    #[test]
    fn test_parse_and_validate() {
        let rows = parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_num, 3);

        let (valid, errors) = validate_rows(&rows, &classes());
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(valid[0].profile.subdivision, Some(TeacherSubdivision::Coordinator));
        assert_eq!(valid[1].email, "alan@gvhs.edu");
        assert_eq!(valid[1].profile.class_id, Some(11));
        assert_eq!(valid[1].profile.admission_number.as_deref(), Some("S-001"));
    }

    #[test]
    fn test_missing_column() {
        let err = parse_csv(b"full_name,email,role\nA,a@b.edu,student\n").unwrap_err();
        assert!(err.contains("password"));
    }

    #[test]
    fn test_row_errors_and_duplicates() {
        let data = "full_name,email,password,role,class_name\n\
            Ada,ada@gvhs.edu,Classroom42,student,9Z\n\
            Ada Again,ada@gvhs.edu,Classroom42,student,\n\
            Root,root@gvhs.edu,Classroom42,head_admin,\n\
            Weak,weak@gvhs.edu,123,student,\n";
        let rows = parse_csv(data.as_bytes()).unwrap();
        let (valid, errors) = validate_rows(&rows, &classes());
        assert!(valid.is_empty());

        let fields: Vec<(usize, &str)> = errors.iter().map(|e| (e.row, e.field.as_str())).collect();
        assert!(fields.contains(&(2, "class_name")));
        assert!(fields.contains(&(3, "email")));
        assert!(fields.contains(&(4, "role")));
        assert!(fields.contains(&(5, "password")));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let data = "full_name,email,password,role\n\n,,,\nA B,a@b.edu,Classroom42,admin\n";
        let rows = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, "admin");
    }
}

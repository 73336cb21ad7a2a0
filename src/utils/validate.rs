use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("Invalid time regex"));

static PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("Invalid period regex"));

static SCHOOL_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{2,16}$").expect("Invalid school code regex"));

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 统一邮箱大小写与空白
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_full_name(name: &str) -> Result<(), &'static str> {
    let len = name.trim().chars().count();
    if len == 0 || len > 100 {
        return Err("Full name must be between 1 and 100 characters");
    }
    Ok(())
}

/// 非空且不超过给定长度的文本字段
pub fn validate_required_text(value: &str, max_len: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err("Field must not be empty".to_string());
    }
    if len > max_len {
        return Err(format!("Field must be at most {max_len} characters"));
    }
    Ok(())
}

pub fn validate_school_code(code: &str) -> Result<(), &'static str> {
    if !SCHOOL_CODE_RE.is_match(code) {
        return Err("School code must be 2-16 letters or digits");
    }
    Ok(())
}

/// 验证 HH:MM 格式的时间
pub fn validate_time(value: &str) -> Result<(), &'static str> {
    if !TIME_RE.is_match(value) {
        return Err("Time must be in HH:MM format");
    }
    Ok(())
}

/// 验证时间段：开始早于结束（同为 HH:MM，可直接按字符串比较）
pub fn validate_time_range(start: &str, end: &str) -> Result<(), &'static str> {
    validate_time(start)?;
    validate_time(end)?;
    if start >= end {
        return Err("Start time must be earlier than end time");
    }
    Ok(())
}

/// 验证账期 YYYY-MM
pub fn validate_billing_period(period: &str) -> Result<(), &'static str> {
    if !PERIOD_RE.is_match(period) {
        return Err("Billing period must be in YYYY-MM format");
    }
    Ok(())
}

pub fn validate_day_of_week(day: i32) -> Result<(), &'static str> {
    if !(1..=7).contains(&day) {
        return Err("day_of_week must be between 1 and 7");
    }
    Ok(())
}

pub fn validate_score(score: f64, max_score: f64) -> Result<(), &'static str> {
    if !score.is_finite() || !max_score.is_finite() {
        return Err("Score must be a finite number");
    }
    if max_score <= 0.0 {
        return Err("max_score must be greater than 0");
    }
    if score < 0.0 || score > max_score {
        return Err("Score must be between 0 and max_score");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 至少 8 个字符，包含大写字母、小写字母和数字，且不是常见弱密码。
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if password.len() > 128 {
        errors.push("Password must be at most 128 bytes long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    const WEAK_PASSWORDS: [&str; 7] = [
        "password1",
        "qwerty123",
        "admin1234",
        "welcome1",
        "school123",
        "teacher1",
        "abcd1234",
    ];
    if WEAK_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 简化的密码验证（返回 Result）
pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("head@school.edu").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());
        assert!(validate_email("no-at-sign.org").is_err());
        assert!(validate_email("x@y").is_err());
        assert_eq!(normalize_email("  Mixed@Case.ORG "), "mixed@case.org");
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("SecurePass123").is_valid);

        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );

        let result = validate_password("abcd12345");
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );

        let result = validate_password("School123");
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }

    #[test]
    fn test_time_range() {
        assert!(validate_time("08:00").is_ok());
        assert!(validate_time("23:59").is_ok());
        assert!(validate_time("24:00").is_err());
        assert!(validate_time("8:00").is_err());
        assert!(validate_time_range("08:00", "08:45").is_ok());
        assert!(validate_time_range("09:00", "08:45").is_err());
        assert!(validate_time_range("09:00", "09:00").is_err());
    }

    #[test]
    fn test_billing_period() {
        assert!(validate_billing_period("2025-01").is_ok());
        assert!(validate_billing_period("2025-12").is_ok());
        assert!(validate_billing_period("2025-13").is_err());
        assert!(validate_billing_period("202501").is_err());
    }

    #[test]
    fn test_score_and_day() {
        assert!(validate_score(0.0, 100.0).is_ok());
        assert!(validate_score(100.0, 100.0).is_ok());
        assert!(validate_score(101.0, 100.0).is_err());
        assert!(validate_score(-1.0, 100.0).is_err());
        assert!(validate_score(5.0, 0.0).is_err());
        assert!(validate_day_of_week(1).is_ok());
        assert!(validate_day_of_week(7).is_ok());
        assert!(validate_day_of_week(0).is_err());
        assert!(validate_day_of_week(8).is_err());
    }

    #[test]
    fn test_school_code_and_text() {
        assert!(validate_school_code("GVHS01").is_ok());
        assert!(validate_school_code("G").is_err());
        assert!(validate_school_code("has space").is_err());
        assert!(validate_required_text("  ", 10).is_err());
        assert!(validate_required_text("Algebra", 10).is_ok());
        assert!(validate_required_text("Algebra basics", 10).is_err());
    }
}

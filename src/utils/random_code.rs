use rand::Rng;

const UPPER_ALNUM: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";

fn random_from(charset: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

/// 大写字母与数字组成的随机码（去掉易混淆的 0/O/1/I）
pub fn generate_code(length: usize) -> String {
    random_from(UPPER_ALNUM, length)
}

/// 随机初始密码，保证包含大小写字母与数字
pub fn generate_password(length: usize) -> String {
    let length = length.max(8);
    loop {
        let candidate = random_from(PASSWORD_CHARSET, length);
        if candidate.chars().any(|c| c.is_ascii_uppercase())
            && candidate.chars().any(|c| c.is_ascii_lowercase())
            && candidate.chars().any(|c| c.is_ascii_digit())
        {
            return candidate;
        }
    }
}

/// 会话令牌
pub fn generate_session_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_charset() {
        let code = generate_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| UPPER_ALNUM.contains(&b)));
    }

    #[test]
    fn test_password_complexity() {
        let pwd = generate_password(4);
        assert_eq!(pwd.len(), 8);
        assert!(pwd.chars().any(|c| c.is_ascii_uppercase()));
        assert!(pwd.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_session_tokens_unique() {
        assert_ne!(generate_session_token(), generate_session_token());
        assert_eq!(generate_session_token().len(), 32);
    }
}

//! 登录失败计数与账号锁定规则

use chrono::{DateTime, Duration, Utc};

/// 锁定剩余分钟数（向上取整），未锁定或已过期返回 None
pub fn remaining_lock_minutes(locked_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let until = locked_until?;
    if until <= now {
        return None;
    }
    let seconds = (until - now).num_seconds();
    Some((seconds + 59) / 60)
}

/// 本次失败触发锁定时的截止时间（Unix 秒）
pub fn lock_deadline(now: DateTime<Utc>, lockout_minutes: i64) -> i64 {
    (now + Duration::minutes(lockout_minutes)).timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_deadline() {
        let now = Utc::now();
        let deadline = lock_deadline(now, 120);
        assert_eq!(deadline - now.timestamp(), 7200);
        let until = chrono::DateTime::from_timestamp(deadline, 0);
        assert_eq!(remaining_lock_minutes(until, now), Some(120));
    }

    #[test]
    fn test_expired_lock_is_ignored() {
        let now = Utc::now();
        assert_eq!(remaining_lock_minutes(Some(now - Duration::minutes(1)), now), None);
    }

    #[test]
    fn test_remaining_minutes_round_up() {
        let now = Utc::now();
        let until = Some(now + Duration::seconds(61));
        assert_eq!(remaining_lock_minutes(until, now), Some(2));
        assert_eq!(remaining_lock_minutes(None, now), None);
    }
}

//! # 문자열 유틸리티
//!
//! 이메일 정규화, 필수 문자열 검증, base36 인코딩 등 공통 함수입니다.

use crate::core::AppError;

/// 이메일을 저장/조회용 형태로 정규화합니다 (앞뒤 공백 제거 + 소문자).
///
/// 이메일 유일성은 대소문자를 구분하지 않으므로, 저장소에 닿는 모든 이메일은
/// 이 함수를 거쳐야 합니다.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 필수 문자열 필드를 검증하고 trim된 값을 반환합니다.
///
/// # Errors
///
/// 공백만 있거나 비어 있으면 `AppError::ValidationError`
pub fn validate_required_string(value: &str, field_name: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!(
            "{}은(는) 필수입니다",
            field_name
        )));
    }
    Ok(trimmed.to_string())
}

/// 비어 있는 문자열을 `None`으로 정리합니다.
pub fn clean_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 부호 없는 정수를 소문자 base36 문자열로 변환합니다.
pub fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
        assert_eq!(normalize_email("b@x.com"), "b@x.com");
    }

    #[test]
    fn test_validate_required_string() {
        assert_eq!(validate_required_string("  Hello ", "name").unwrap(), "Hello");
        assert!(validate_required_string("   ", "name").is_err());
        assert!(validate_required_string("", "name").is_err());
    }

    #[test]
    fn test_clean_optional_string() {
        assert_eq!(clean_optional_string(Some("  hi ".into())), Some("hi".to_string()));
        assert_eq!(clean_optional_string(Some("   ".into())), None);
        assert_eq!(clean_optional_string(None), None);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
        assert_eq!(to_base36(u128::MAX).len(), 25);
    }
}

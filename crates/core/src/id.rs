//! Sinh và kiểm tra ID cho các entity (UUID v4 dạng chuỗi).

use uuid::Uuid;

/// Tạo ID mới
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Kiểm tra chuỗi có phải ID hợp lệ không
pub fn is_well_formed_id(raw: &str) -> bool {
    Uuid::parse_str(raw.trim()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_well_formed() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert!(is_well_formed_id(&a));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(!is_well_formed_id(""));
        assert!(!is_well_formed_id("TXN_000001"));
        assert!(!is_well_formed_id("65f0c0ffee0000000000000z"));
    }
}

//! Panic payload helpers for code that catches unwinding builds and scans.

use std::any::Any;

/// Extracts a readable message from a panic payload.
///
/// `panic!` with a literal yields a `&str` payload and a formatted message
/// yields a `String`; anything else is reported generically.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_formatted_payloads() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned.as_ref()), "bang");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }

    #[test]
    fn caught_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("rule {} failed", "LineLength"))
            .unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "rule LineLength failed");
    }
}

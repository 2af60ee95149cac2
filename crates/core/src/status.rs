//! Booking record status constants and validation.
//!
//! A record moves between three statuses with no terminal state: a rejected
//! booking may be re-confirmed and a confirmed one re-rejected. Confirmation
//! is exclusive per slot; the cascade that enforces this lives in the record
//! repository.

/// Awaiting the provider's decision. Every record starts here.
pub const STATUS_PENDING: &str = "pending";

/// Accepted by the provider. At most one per slot.
pub const STATUS_CONFIRM: &str = "confirm";

/// Declined by the provider (or displaced by a confirmation elsewhere on the slot).
pub const STATUS_REJECT: &str = "reject";

/// All valid status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_CONFIRM, STATUS_REJECT];

/// Validate that a status string is one of the accepted values.
pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_statuses_accepted() {
        assert!(validate_status(STATUS_PENDING).is_ok());
        assert!(validate_status(STATUS_CONFIRM).is_ok());
        assert!(validate_status(STATUS_REJECT).is_ok());
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result = validate_status("cancelled");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status"));
    }

    #[test]
    fn test_empty_status_rejected() {
        assert!(validate_status("").is_err());
    }
}

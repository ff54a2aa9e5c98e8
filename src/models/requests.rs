use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::UserRecord;

/// Request to pair a snapshot of users
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PairUsersRequest {
    #[validate(length(max = 5000))]
    #[validate(nested)]
    pub users: Vec<UserRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_original_field_names() {
        let json = r#"{"users": [
            {"username": "alex", "sex": "male", "interests": "chess", "time_ranges": "101000"},
            {"handle": "bella", "gender": "female", "about": "@alex", "availability": "100010"}
        ]}"#;

        let req: PairUsersRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.users[0].handle, "alex");
        assert_eq!(req.users[0].about, "chess");
        assert_eq!(req.users[1].availability.to_string(), "100010");
    }

    #[test]
    fn test_free_time_key_and_missing_availability() {
        let json = r#"{"users": [
            {"username": "alex", "sex": "male", "free_time": "011000"},
            {"username": "bella", "sex": "female"}
        ]}"#;

        let req: PairUsersRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.users[0].availability.to_string(), "011000");
        assert_eq!(req.users[1].availability.to_string(), "000000");
        assert!(!req.users[1].availability.has_overlap());
    }

    #[test]
    fn test_empty_handle_fails_validation() {
        let json = r#"{"users": [{"handle": "", "gender": "male", "availability": "000000"}]}"#;

        let req: PairUsersRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bad_mask_fails_to_parse() {
        let json = r#"{"users": [{"handle": "a", "gender": "male", "availability": "10a"}]}"#;
        assert!(serde_json::from_str::<PairUsersRequest>(json).is_err());
    }
}

//! The token stored in the auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::UserId;

// The default [OffsetDateTime] serializer writes midnight with single-digit
// hours ("0:00:00.0") which its own parser then rejects, so the expiry is
// pinned to an explicit two-digit format.
time::serde::format_description!(
    expiry_format,
    OffsetDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour sign:mandatory]:[offset_minute]:[offset_second]"
);

/// A token for authorization and authentication.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserId,

    #[serde(with = "expiry_format")]
    pub expires_at: OffsetDateTime,
}

#[cfg(test)]
mod token_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::auth::{UserId, token::Token};

    fn token_expiring_at(expires_at: time::PrimitiveDateTime) -> Token {
        Token {
            user_id: UserId::new(1),
            expires_at: expires_at.assume_offset(UtcOffset::UTC),
        }
    }

    #[test]
    fn token_serializes_with_two_digit_hours() {
        let token = token_expiring_at(datetime!(2025-12-21 03:54:00));

        let serialized = serde_json::to_string(&token).unwrap();

        assert_eq!(
            serialized,
            r#"{"user_id":1,"expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#
        );
    }

    #[test]
    fn token_deserializes() {
        let token_string = r#"{"user_id":1,"expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#;

        let parsed: Token = serde_json::from_str(token_string).unwrap();

        assert_eq!(parsed, token_expiring_at(datetime!(2025-12-21 03:54:00)));
    }

    #[test]
    fn token_with_midnight_expiry_round_trips() {
        let token = token_expiring_at(datetime!(2025-12-21 00:00:00));

        let serialized = serde_json::to_string(&token).unwrap();
        let parsed: Token = serde_json::from_str(&serialized).unwrap();

        assert_eq!(parsed, token);
    }
}

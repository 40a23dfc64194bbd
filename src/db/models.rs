use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::directory::display_name;

/// Stored user row. Carries the password hash, so it never leaves the server;
/// handlers answer with [`ProfileSnapshot`] instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_picture: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const COLUMNS: &'static str = "id, email, password_hash, first_name, last_name, nickname, \
         date_of_birth, profile_picture, is_anonymous, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            nickname: row.get(5)?,
            date_of_birth: row.get(6)?,
            profile_picture: row.get(7)?,
            is_anonymous: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    pub fn profile(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            nickname: self.nickname.clone(),
            date_of_birth: self.date_of_birth,
            profile_picture: self.profile_picture.clone(),
            is_anonymous: self.is_anonymous,
            created_at: self.created_at,
        }
    }
}

/// Everything about a user except credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_picture: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl ProfileSnapshot {
    pub fn display_name(&self) -> String {
        display_name(
            self.is_anonymous,
            self.nickname.as_deref(),
            self.first_name.as_deref(),
            &self.email,
        )
    }
}

/// Entry in the suggested-accounts listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub profile_picture: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        let display_name = display_name(
            user.is_anonymous,
            user.nickname.as_deref(),
            user.first_name.as_deref(),
            &user.email,
        );
        UserSummary {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            nickname: user.nickname,
            profile_picture: user.profile_picture,
            is_anonymous: user.is_anonymous,
            created_at: user.created_at,
            display_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    Items,
    Food,
    Service,
    Unboxing,
}

impl ReviewKind {
    pub const ALL: [ReviewKind; 4] = [
        ReviewKind::Items,
        ReviewKind::Food,
        ReviewKind::Service,
        ReviewKind::Unboxing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Items => "items",
            ReviewKind::Food => "food",
            ReviewKind::Service => "service",
            ReviewKind::Unboxing => "unboxing",
        }
    }

    /// Unboxing posts carry no star rating.
    pub fn is_rated(&self) -> bool {
        !matches!(self, ReviewKind::Unboxing)
    }
}

impl fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown review type: {0}")]
pub struct UnknownReviewKind(pub String);

impl FromStr for ReviewKind {
    type Err = UnknownReviewKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReviewKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownReviewKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: ReviewKind,
    pub image: String,
    pub item_description: Option<String>,
    pub brand: Option<String>,
    pub food_description: Option<String>,
    pub shop_name: Option<String>,
    pub shop_address: Option<String>,
    pub review_description: Option<String>,
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// The author identity shown next to a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub profile_picture: Option<String>,
    pub is_anonymous: bool,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub author: Author,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "u1".into(),
            email: "ana@example.com".into(),
            password_hash: "$2b$04$secret".into(),
            first_name: Some("Ana".into()),
            last_name: Some("Lima".into()),
            nickname: None,
            date_of_birth: NaiveDate::from_ymd_opt(2000, 2, 29),
            profile_picture: None,
            is_anonymous: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn profile_snapshot_omits_password_hash() {
        let json = serde_json::to_value(sample_user().profile()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["firstName"], "Ana");
        assert_eq!(json["dateOfBirth"], "2000-02-29");
        assert_eq!(json["isAnonymous"], false);
    }

    #[test]
    fn review_kind_parses_only_known_types() {
        assert_eq!("food".parse::<ReviewKind>(), Ok(ReviewKind::Food));
        assert_eq!("unboxing".parse::<ReviewKind>(), Ok(ReviewKind::Unboxing));
        assert!("Food".parse::<ReviewKind>().is_err());
        assert!("movies".parse::<ReviewKind>().is_err());
    }

    #[test]
    fn only_unboxing_is_unrated() {
        assert!(ReviewKind::Items.is_rated());
        assert!(ReviewKind::Food.is_rated());
        assert!(ReviewKind::Service.is_rated());
        assert!(!ReviewKind::Unboxing.is_rated());
    }

    #[test]
    fn review_serializes_kind_as_type() {
        let review = Review {
            id: "r1".into(),
            user_id: "u1".into(),
            kind: ReviewKind::Service,
            image: "data:image/png;base64,AAAA".into(),
            item_description: None,
            brand: None,
            food_description: None,
            shop_name: Some("Kopi".into()),
            shop_address: Some("1 Main St".into()),
            review_description: None,
            rating: Some(4),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["type"], "service");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["shopName"], "Kopi");
    }

    #[test]
    fn summary_resolves_display_name() {
        let summary = UserSummary::from(sample_user());
        assert_eq!(summary.display_name, "Ana");
    }
}

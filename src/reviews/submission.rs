use serde::{Deserialize, Serialize};

use crate::db::models::ReviewKind;
use crate::error::{AppError, AppResult};

/// Ratings arrive as numbers from API clients and as strings from HTML forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Number(i64),
    Text(String),
}

/// Body of `POST /api/reviews`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub food_description: Option<String>,
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub shop_address: Option<String>,
    #[serde(default)]
    pub review_description: Option<String>,
    #[serde(default)]
    pub rating: Option<RatingInput>,
}

/// A validated review with only the fields its kind uses.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub user_id: String,
    pub kind: ReviewKind,
    pub image: String,
    pub item_description: Option<String>,
    pub brand: Option<String>,
    pub food_description: Option<String>,
    pub shop_name: Option<String>,
    pub shop_address: Option<String>,
    pub review_description: Option<String>,
    pub rating: Option<u8>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, label: &str) -> AppResult<String> {
    present(value).ok_or_else(|| AppError::Validation(format!("{} is required", label)))
}

fn parse_rating(input: Option<RatingInput>) -> AppResult<u8> {
    let value = match input {
        None => return Err(AppError::Validation("Rating is required".into())),
        Some(RatingInput::Number(n)) => n,
        Some(RatingInput::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::Validation("Rating must be a whole number".into()))?,
    };
    match u8::try_from(value) {
        Ok(rating @ 1..=5) => Ok(rating),
        _ => Err(AppError::Validation("Rating must be between 1 and 5".into())),
    }
}

impl ReviewSubmission {
    pub fn validate(self) -> AppResult<NewReview> {
        let (Some(user_id), Some(kind), Some(image)) =
            (present(self.user_id), present(self.kind), present(self.image))
        else {
            return Err(AppError::Validation(
                "userId, type and image are required".into(),
            ));
        };
        let kind: ReviewKind = kind.parse()?;

        let mut review = NewReview {
            user_id,
            kind,
            image,
            item_description: None,
            brand: None,
            food_description: None,
            shop_name: None,
            shop_address: None,
            review_description: present(self.review_description),
            rating: None,
        };

        match kind {
            ReviewKind::Items | ReviewKind::Unboxing => {
                review.item_description =
                    Some(required(self.item_description, "Item description")?);
                review.brand = Some(required(self.brand, "Brand")?);
            }
            ReviewKind::Food => {
                review.food_description =
                    Some(required(self.food_description, "Food description")?);
                review.shop_name = Some(required(self.shop_name, "Shop name")?);
                review.shop_address = Some(required(self.shop_address, "Shop address")?);
            }
            ReviewKind::Service => {
                review.shop_name = Some(required(self.shop_name, "Shop name")?);
                review.shop_address = Some(required(self.shop_address, "Shop address")?);
            }
        }

        if kind.is_rated() {
            review.rating = Some(parse_rating(self.rating)?);
        }

        Ok(review)
    }
}

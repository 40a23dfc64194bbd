use std::sync::Arc;

use chrono::Utc;

use crate::db::models::{Review, ReviewWithAuthor};
use crate::db::repository::RepositoryError;
use crate::error::{AppError, AppResult};
use crate::reviews::repository::ReviewRepository;
use crate::reviews::submission::ReviewSubmission;

/// Append-only store of submitted reviews.
#[derive(Clone)]
pub struct ReviewLedger {
    repo: Arc<dyn ReviewRepository>,
}

impl ReviewLedger {
    pub fn new(repo: Arc<dyn ReviewRepository>) -> Self {
        Self { repo }
    }

    /// Validate and store a review, returning its id. Identical submissions
    /// are stored as separate reviews.
    pub async fn submit_review(&self, submission: ReviewSubmission) -> AppResult<String> {
        let new = submission.validate()?;
        let review = Review {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: new.user_id,
            kind: new.kind,
            image: new.image,
            item_description: new.item_description,
            brand: new.brand,
            food_description: new.food_description,
            shop_name: new.shop_name,
            shop_address: new.shop_address,
            review_description: new.review_description,
            rating: new.rating,
            created_at: Utc::now(),
        };
        let id = review.id.clone();
        let kind = review.kind;

        self.repo.insert(review).await.map_err(|e| match e {
            RepositoryError::ForeignKey(_) => AppError::Validation("Unknown user".into()),
            other => other.into(),
        })?;

        tracing::info!(review_id = %id, kind = %kind, "Review submitted");
        Ok(id)
    }

    /// Every review with its author, newest first.
    pub async fn list_reviews(&self) -> AppResult<Vec<ReviewWithAuthor>> {
        Ok(self.repo.list_with_authors().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ReviewKind;
    use crate::db::test_pool;
    use crate::reviews::repository::SqliteReviewRepository;
    use crate::users::repository::{NewUser, SqliteUserRepository, UserRepository};
    use serde_json::json;

    async fn ledger_with_user() -> (ReviewLedger, String) {
        let pool = test_pool();
        let users = SqliteUserRepository::new(pool.clone());
        let user_id = uuid::Uuid::now_v7().to_string();
        users
            .insert(NewUser {
                id: user_id.clone(),
                email: "ana@x.com".into(),
                password_hash: "h".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let ledger = ReviewLedger::new(Arc::new(SqliteReviewRepository::new(pool)));
        (ledger, user_id)
    }

    fn service_review(user_id: &str) -> ReviewSubmission {
        serde_json::from_value(json!({
            "userId": user_id,
            "type": "service",
            "image": "img",
            "shopName": "Barber",
            "shopAddress": "1 Main St",
            "rating": 5
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn submitted_review_appears_first_in_feed() {
        let (ledger, user_id) = ledger_with_user().await;
        let first = ledger.submit_review(service_review(&user_id)).await.unwrap();
        let second = ledger.submit_review(service_review(&user_id)).await.unwrap();
        assert_ne!(first, second);

        let feed = ledger.list_reviews().await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].review.id, second);
        assert_eq!(feed[0].review.kind, ReviewKind::Service);
        assert_eq!(feed[0].author.email, "ana@x.com");
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let (ledger, _) = ledger_with_user().await;
        let result = ledger.submit_review(service_review("nobody")).await;
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg == "Unknown user"));
        assert!(ledger.list_reviews().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_submission_stores_nothing() {
        let (ledger, user_id) = ledger_with_user().await;
        let mut submission = service_review(&user_id);
        submission.kind = Some("movies".into());
        assert!(matches!(
            ledger.submit_review(submission).await,
            Err(AppError::UnknownType(_))
        ));
        assert!(ledger.list_reviews().await.unwrap().is_empty());
    }
}

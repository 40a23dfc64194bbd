use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::db::models::{Author, Review, ReviewKind, ReviewWithAuthor};
use crate::db::repository::{with_conn, RepositoryError};
use crate::directory::display_name;
use crate::state::DbPool;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Append a review. An unknown author surfaces as
    /// [`RepositoryError::ForeignKey`].
    async fn insert(&self, review: Review) -> Result<(), RepositoryError>;

    /// Every review joined with its author, newest first.
    async fn list_with_authors(&self) -> Result<Vec<ReviewWithAuthor>, RepositoryError>;
}

pub struct SqliteReviewRepository {
    pool: DbPool,
}

impl SqliteReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn review_with_author(row: &Row<'_>) -> rusqlite::Result<ReviewWithAuthor> {
    let kind: String = row.get(2)?;
    let kind = kind.parse::<ReviewKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let review = Review {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        image: row.get(3)?,
        item_description: row.get(4)?,
        brand: row.get(5)?,
        food_description: row.get(6)?,
        shop_name: row.get(7)?,
        shop_address: row.get(8)?,
        review_description: row.get(9)?,
        rating: row.get(10)?,
        created_at: row.get(11)?,
    };

    let email: String = row.get(12)?;
    let first_name: Option<String> = row.get(13)?;
    let nickname: Option<String> = row.get(15)?;
    let is_anonymous: bool = row.get(17)?;
    let author = Author {
        display_name: display_name(
            is_anonymous,
            nickname.as_deref(),
            first_name.as_deref(),
            &email,
        ),
        email,
        first_name,
        last_name: row.get(14)?,
        nickname,
        profile_picture: row.get(16)?,
        is_anonymous,
    };

    Ok(ReviewWithAuthor { review, author })
}

#[async_trait]
impl ReviewRepository for SqliteReviewRepository {
    async fn insert(&self, review: Review) -> Result<(), RepositoryError> {
        with_conn(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO reviews (id, user_id, review_type, image, item_description, brand,
                     food_description, shop_name, shop_address, review_description, rating, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    review.id,
                    review.user_id,
                    review.kind.as_str(),
                    review.image,
                    review.item_description,
                    review.brand,
                    review.food_description,
                    review.shop_name,
                    review.shop_address,
                    review.review_description,
                    review.rating,
                    review.created_at,
                ],
            )
            .map_err(RepositoryError::classify)?;
            Ok(())
        })
        .await
    }

    async fn list_with_authors(&self) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        with_conn(&self.pool, |conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.user_id, r.review_type, r.image, r.item_description, r.brand,
                        r.food_description, r.shop_name, r.shop_address, r.review_description,
                        r.rating, r.created_at,
                        u.email, u.first_name, u.last_name, u.nickname, u.profile_picture,
                        u.is_anonymous
                 FROM reviews r
                 JOIN users u ON u.id = r.user_id
                 ORDER BY r.created_at DESC, r.rowid DESC",
            )?;
            let reviews = stmt
                .query_map([], review_with_author)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(reviews)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::{Duration, Utc};

    fn seed_user(pool: &DbPool, id: &str, email: &str) {
        pool.get()
            .unwrap()
            .execute(
                "INSERT INTO users (id, email, password_hash, first_name, created_at)
                 VALUES (?1, ?2, 'h', 'Ana', ?3)",
                params![id, email, Utc::now()],
            )
            .unwrap();
    }

    fn review(id: &str, user_id: &str, minutes_ago: i64) -> Review {
        Review {
            id: id.into(),
            user_id: user_id.into(),
            kind: ReviewKind::Items,
            image: "img".into(),
            item_description: Some("Mug".into()),
            brand: Some("Acme".into()),
            food_description: None,
            shop_name: None,
            shop_address: None,
            review_description: None,
            rating: Some(4),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn insert_and_list_newest_first_with_author() {
        let pool = test_pool();
        seed_user(&pool, "u1", "ana@x.com");
        let repo = SqliteReviewRepository::new(pool);

        repo.insert(review("old", "u1", 10)).await.unwrap();
        repo.insert(review("new", "u1", 1)).await.unwrap();

        let listed = repo.list_with_authors().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.review.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
        assert_eq!(listed[0].author.email, "ana@x.com");
        assert_eq!(listed[0].author.display_name, "Ana");
        assert_eq!(listed[0].review.rating, Some(4));
    }

    #[tokio::test]
    async fn unknown_author_is_foreign_key_error() {
        let repo = SqliteReviewRepository::new(test_pool());
        let result = repo.insert(review("r1", "ghost", 0)).await;
        assert!(matches!(result, Err(RepositoryError::ForeignKey(_))));
    }

    #[tokio::test]
    async fn duplicate_submissions_are_kept() {
        let pool = test_pool();
        seed_user(&pool, "u1", "ana@x.com");
        let repo = SqliteReviewRepository::new(pool);

        repo.insert(review("r1", "u1", 0)).await.unwrap();
        repo.insert(review("r2", "u1", 0)).await.unwrap();
        assert_eq!(repo.list_with_authors().await.unwrap().len(), 2);
    }
}

//! The persistence gateway.
//!
//! Every domain operation talks to the relational store through the
//! [`Gateway`] trait, which is always passed in explicitly; there is no
//! hidden global pool. Production code uses the Postgres implementation
//! (on [`crate::db::Connection`]), tests substitute [`MemGateway`].

use failure::Fail;

use crate::db::models as db;

mod mem;
mod pg;

pub use self::mem::MemGateway;

/// Error talking to the persistence gateway.
#[derive(Clone, Debug, Fail)]
pub enum StoreError {
    /// A unique constraint was violated.
    #[fail(display = "duplicate key: {}", _0)]
    Duplicate(String),
    /// Any other datastore failure.
    #[fail(display = "database error: {}", _0)]
    Database(String),
}

/// A notification joined with its origin user's public data.
#[derive(Clone, Debug)]
pub struct NotificationRow {
    pub notification: db::Notification,
    pub origen_nombre: Option<String>,
    pub origen_foto: Option<String>,
}

/// A publication joined with its author's and category's names.
#[derive(Clone, Debug)]
pub struct PublicationMeta {
    pub publication: db::Publication,
    pub autor: String,
    pub autor_foto: Option<String>,
    pub tipo_publicacion: String,
}

/// A comment joined with its author's display name.
#[derive(Clone, Debug)]
pub struct CommentRow {
    pub comment: db::Comment,
    pub autor: String,
}

/// Transactional access to the relational store, at the granularity the
/// domain needs. Multi-statement operations wrap their calls in
/// [`Gateway::transaction`].
pub trait Gateway {
    /// Run `f` inside a transaction. If it returns `Err` every write made
    /// within is rolled back.
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
        Self: Sized;

    // Users

    fn user_by_id(&mut self, id: i32) -> Result<Option<db::User>, StoreError>;

    // Categories

    fn category_exists(&mut self, id: i32) -> Result<bool, StoreError>;

    fn categories(&mut self) -> Result<Vec<db::PublicationType>, StoreError>;

    // Publications

    fn insert_publication(&mut self, new: &db::NewPublication)
    -> Result<db::Publication, StoreError>;

    /// Insert a publication under an explicit, client-reserved ID.
    fn insert_publication_with_id(&mut self, id: i32, new: &db::NewPublication)
    -> Result<db::Publication, StoreError>;

    fn publication_by_id(&mut self, id: i32)
    -> Result<Option<db::Publication>, StoreError>;

    fn publication_with_meta(&mut self, id: i32)
    -> Result<Option<PublicationMeta>, StoreError>;

    /// Highest publication ID currently in the store.
    fn max_publication_id(&mut self) -> Result<Option<i32>, StoreError>;

    /// Apply a partial update; returns the number of rows affected.
    fn update_publication(&mut self, id: i32, change: &db::PublicationChange)
    -> Result<usize, StoreError>;

    fn publications_of_user(&mut self, user: i32)
    -> Result<Vec<db::Publication>, StoreError>;

    fn recent_published(&mut self, limit: i64)
    -> Result<Vec<db::Publication>, StoreError>;

    /// Submissions awaiting review, newest first.
    fn pending_review(&mut self) -> Result<Vec<db::Publication>, StoreError>;

    fn published_count_of_user(&mut self, user: i32) -> Result<i64, StoreError>;

    // Favorites

    fn favorite_of(&mut self, user: i32, publication: i32)
    -> Result<Option<db::Favorite>, StoreError>;

    fn insert_favorite(&mut self, new: &db::NewFavorite)
    -> Result<db::Favorite, StoreError>;

    fn delete_favorite(&mut self, id: i32) -> Result<usize, StoreError>;

    fn favorite_count(&mut self, publication: i32) -> Result<i64, StoreError>;

    // Comments

    fn insert_comment(&mut self, new: &db::NewComment)
    -> Result<db::Comment, StoreError>;

    fn comment_by_id(&mut self, id: i32)
    -> Result<Option<db::Comment>, StoreError>;

    fn delete_comment(&mut self, id: i32) -> Result<usize, StoreError>;

    fn comments_of_publication(&mut self, publication: i32)
    -> Result<Vec<CommentRow>, StoreError>;

    fn comment_count(&mut self, publication: i32) -> Result<i64, StoreError>;

    // Notifications

    fn insert_notification(&mut self, new: &db::NewNotification)
    -> Result<db::Notification, StoreError>;

    /// Mark one notification as read, scoped to its recipient. Returns the
    /// number of rows affected (zero when the row is missing or owned by
    /// someone else).
    fn set_notification_read(&mut self, id: i32, user: i32)
    -> Result<usize, StoreError>;

    fn mark_all_notifications_read(&mut self, user: i32)
    -> Result<usize, StoreError>;

    /// A page of a user's notifications, newest first, optionally filtered
    /// by read state.
    fn notifications_of_user(
        &mut self,
        user: i32,
        read: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationRow>, StoreError>;

    fn notification_count(&mut self, user: i32, read: Option<bool>)
    -> Result<i64, StoreError>;

    // Gallery images

    fn max_image_order(&mut self, publication: i32)
    -> Result<Option<i32>, StoreError>;

    fn insert_image(&mut self, new: &db::NewPublicationImage)
    -> Result<db::PublicationImage, StoreError>;

    fn images_of_publication(&mut self, publication: i32)
    -> Result<Vec<db::PublicationImage>, StoreError>;
}

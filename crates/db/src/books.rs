//! Resource store port for book posts and its in-memory adapter.

use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{Book, BookId, NewBook, UserId};

/// Listing operations return books newest first.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, new_book: NewBook) -> Result<Book, StoreError>;

    async fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError>;

    async fn find_page(&self, skip: u64, limit: u64) -> Result<Vec<Book>, StoreError>;

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Book>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &BookId) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct InMemoryBookStore {
    books: RwLock<Vec<Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first<'a>(books: impl Iterator<Item = &'a Book>) -> Vec<Book> {
        let mut sorted: Vec<Book> = books.cloned().collect();
        // v7 ids break timestamp ties in insertion order
        sorted.sort_by_key(|book| Reverse((book.created_at, book.id)));
        sorted
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn create(&self, new_book: NewBook) -> Result<Book, StoreError> {
        let now = Utc::now();
        let book = Book {
            id: BookId::generate(),
            title: new_book.title,
            caption: new_book.caption,
            image: new_book.image,
            rating: new_book.rating,
            user: new_book.user,
            created_at: now,
            updated_at: now,
        };

        self.books.write().await.push(book.clone());
        tracing::debug!(book_id = %book.id, owner = %book.user, "book persisted");
        Ok(book)
    }

    async fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().find(|book| book.id == *id).cloned())
    }

    async fn find_page(&self, skip: u64, limit: u64) -> Result<Vec<Book>, StoreError> {
        let books = self.books.read().await;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(Self::newest_first(books.iter())
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(Self::newest_first(
            books.iter().filter(|book| book.user == *owner),
        ))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.books.read().await.len() as u64)
    }

    async fn delete(&self, id: &BookId) -> Result<bool, StoreError> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|book| book.id != *id);
        Ok(books.len() != before)
    }
}

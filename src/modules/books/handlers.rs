use std::collections::HashMap;

use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use bookworm_authz::CurrentUser;
use bookworm_db::{Book, BookId, BookWithOwner, NewBook, OwnerSummary, UserId};
use bookworm_http::error::AppError;

use super::models::{BookPage, CreateBookRequest, MessageResponse, PageQuery, Paging};
use super::BooksState;
use crate::utils::present;

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required";
pub const RATING_OUT_OF_RANGE: &str = "Rating must be between 1 and 5";
pub const BOOK_NOT_FOUND: &str = "Book not found";
pub const NOT_BOOK_OWNER: &str = "You are not authorized to delete this book";
pub const MEDIA_DELETE_FAILED: &str = "Error deleting image from Cloudinary";
pub const BOOK_DELETED: &str = "Book deleted successfully";

const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;

/// POST /
pub async fn create_book(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(request) = payload?;

    let (Some(title), Some(caption), Some(image), Some(rating)) = (
        present(request.title),
        present(request.caption),
        present(request.image),
        request.rating.filter(|rating| *rating != 0),
    ) else {
        return Err(AppError::bad_request(ALL_FIELDS_REQUIRED));
    };

    let rating = u8::try_from(rating)
        .ok()
        .filter(|rating| (MIN_RATING..=MAX_RATING).contains(&i64::from(*rating)))
        .ok_or_else(|| AppError::bad_request(RATING_OUT_OF_RANGE))?;

    let image = state
        .media
        .upload(&image)
        .await
        .context("failed to upload book image")?;

    let book = state
        .books
        .create(NewBook {
            title,
            caption,
            image,
            rating,
            user: user.id,
        })
        .await
        .context("failed to save book")?;

    tracing::info!(module = "books", book_id = %book.id, owner = %book.user, "book created");

    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /?page=&limit=
pub async fn list_books(
    State(state): State<BooksState>,
    CurrentUser(_): CurrentUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<BookPage>, AppError> {
    let Query(query) = query?;
    let paging = Paging::from(query);

    let books = state
        .books
        .find_page(paging.skip(), paging.limit)
        .await
        .context("failed to list books")?;
    let total_books = state.books.count().await.context("failed to count books")?;

    let mut owners: HashMap<UserId, Option<OwnerSummary>> = HashMap::new();
    let mut populated: Vec<BookWithOwner> = Vec::with_capacity(books.len());
    for book in books {
        let owner = match owners.get(&book.user) {
            Some(owner) => owner.clone(),
            None => {
                let owner = state
                    .users
                    .find_public_by_id(&book.user)
                    .await
                    .context("failed to load book owner")?
                    .as_ref()
                    .map(OwnerSummary::from);
                owners.insert(book.user, owner.clone());
                owner
            }
        };
        populated.push(book.with_owner(owner));
    }

    Ok(Json(BookPage {
        books: populated,
        current_page: paging.page,
        total_books,
        total_pages: paging.total_pages(total_books),
    }))
}

/// GET /user
pub async fn list_my_books(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = state
        .books
        .find_by_owner(&user.id)
        .await
        .context("failed to list user books")?;

    Ok(Json(books))
}

/// DELETE /{id}
pub async fn delete_book(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    // Ids that cannot name a book are simply not found.
    let Some(id) = path
        .ok()
        .and_then(|Path(raw)| raw.parse::<BookId>().ok())
    else {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    };

    let book = state
        .books
        .find_by_id(&id)
        .await
        .context("failed to load book")?
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))?;

    if book.user != user.id {
        tracing::warn!(module = "books", book_id = %id, caller = %user.id, "delete refused for non-owner");
        return Err(AppError::forbidden(NOT_BOOK_OWNER));
    }

    // Media first; a failed cleanup leaves the record in place.
    if state.media.hosts(&book.image) {
        state
            .media
            .delete(&book.image)
            .await
            .map_err(|err| AppError::internal(MEDIA_DELETE_FAILED, err))?;
    }

    let removed = state
        .books
        .delete(&id)
        .await
        .context("failed to delete book")?;
    if !removed {
        return Err(AppError::not_found(BOOK_NOT_FOUND));
    }

    tracing::info!(module = "books", book_id = %id, "book deleted");

    Ok(Json(MessageResponse {
        message: BOOK_DELETED.to_string(),
    }))
}

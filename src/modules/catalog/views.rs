//! View-model shapes handed to the renderer.
//!
//! Derived fields (URLs, display names, lifespans, formatted dates) are
//! computed here on every read and never stored.

use chrono::NaiveDate;
use serde::Serialize;

use locallib_db::{Record, RecordId};

use super::models::{
    Author, Book, BookInstance, BookListing, BookStatus, BookSummary, BookTitle, Genre, Url,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorView {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub url: String,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub name: String,
    pub lifespan: String,
    pub lifespan_formatted: String,
    pub date_of_birth_formatted: String,
    pub date_of_death_formatted: String,
}

impl From<&Record<Author>> for AuthorView {
    fn from(record: &Record<Author>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            first_name: record.first_name.clone(),
            family_name: record.family_name.clone(),
            date_of_birth: record.date_of_birth,
            date_of_death: record.date_of_death,
            name: record.name(),
            lifespan: record.lifespan(),
            lifespan_formatted: record.lifespan_formatted(),
            date_of_birth_formatted: record.date_of_birth_formatted(),
            date_of_death_formatted: record.date_of_death_formatted(),
        }
    }
}

/// A genre, optionally marked as selected on a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreView {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub url: String,
    pub name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub checked: bool,
}

impl From<&Record<Genre>> for GenreView {
    fn from(record: &Record<Genre>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            name: record.name.clone(),
            checked: false,
        }
    }
}

/// Minimal reference to a book: identity, link and title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookLink {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub url: String,
    pub title: String,
}

impl From<&Record<BookTitle>> for BookLink {
    fn from(record: &Record<BookTitle>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            title: record.title.clone(),
        }
    }
}

impl From<&Record<Book>> for BookLink {
    fn from(record: &Record<Book>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            title: record.title.clone(),
        }
    }
}

/// Book list entry with its author populated when the reference resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookListView {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub url: String,
    pub title: String,
    pub author: Option<AuthorView>,
}

impl BookListView {
    pub fn new(record: &Record<BookListing>, author: Option<AuthorView>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            title: record.title.clone(),
            author,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummaryView {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub url: String,
    pub title: String,
    pub summary: String,
}

impl From<&Record<BookSummary>> for BookSummaryView {
    fn from(record: &Record<BookSummary>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            title: record.title.clone(),
            summary: record.summary.clone(),
        }
    }
}

/// A book with its author and genres populated. Dangling references are
/// tolerated: a missing author is `None`, missing genres are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookView {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<AuthorView>,
    pub genre: Vec<GenreView>,
}

impl BookView {
    pub fn new(record: &Record<Book>, author: Option<AuthorView>, genre: Vec<GenreView>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            title: record.title.clone(),
            summary: record.summary.clone(),
            isbn: record.isbn.clone(),
            author,
            genre,
        }
    }

    pub fn link(&self) -> BookLink {
        BookLink {
            id: self.id,
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceView {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub url: String,
    pub imprint: String,
    pub status: BookStatus,
    pub due_back: Option<NaiveDate>,
    pub due_back_formatted: String,
    /// The copied book, when the reference resolves
    pub book: Option<BookLink>,
}

impl BookInstanceView {
    pub fn new(record: &Record<BookInstance>, book: Option<BookLink>) -> Self {
        Self {
            id: record.id,
            url: record.url(),
            imprint: record.imprint.clone(),
            status: record.status,
            due_back: record.due_back,
            due_back_formatted: record.due_back_formatted(),
            book,
        }
    }
}

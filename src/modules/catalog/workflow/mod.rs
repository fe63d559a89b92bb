//! Request-independent catalog workflows.
//!
//! Every operation returns an [`Outcome`] (render a named view or redirect)
//! or a [`CatalogError`]. Validation failures and blocked deletes are not
//! errors; they re-render the relevant view.

mod author;
mod book;
mod book_instance;
mod genre;
mod index;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use locallib_db::{parse_id, Collection, DbError, Filter, RecordId, SharedStore, ID_FIELD};

use super::models::{Author, Book, BookInstance, Genre};
use super::views::{AuthorView, BookView, GenreView};

/// Failures that escape a workflow.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("persistence failure: {0}")]
    Persistence(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// A named view with its model.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: &'static str,
    pub model: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render(View),
    Redirect(String),
}

impl Outcome {
    pub fn render(name: &'static str, model: Value) -> Self {
        Outcome::Render(View { name, model })
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Outcome::Redirect(location.into())
    }
}

/// Workflows over the catalog collections.
#[derive(Clone)]
pub struct Catalog {
    store: SharedStore,
}

impl Catalog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub(crate) fn books(&self) -> Collection<Book> {
        Collection::new(self.store.clone())
    }

    pub(crate) fn authors(&self) -> Collection<Author> {
        Collection::new(self.store.clone())
    }

    pub(crate) fn genres(&self) -> Collection<Genre> {
        Collection::new(self.store.clone())
    }

    pub(crate) fn instances(&self) -> Collection<BookInstance> {
        Collection::new(self.store.clone())
    }

    /// Book with author and genres populated, or `None` when not stored.
    async fn book_view(&self, id: RecordId) -> Result<Option<BookView>> {
        let Some(book) = self.books().find_by_id(id).await? else {
            return Ok(None);
        };

        let (authors, genres) = (self.authors(), self.genres());
        let selected = by_ids(book.genre.iter().copied());
        let (author, genre) =
            futures::try_join!(authors.find_by_id(book.author), genres.find(&selected))?;

        let mut genre: HashMap<RecordId, GenreView> = genre
            .iter()
            .map(|record| (record.id, GenreView::from(record)))
            .collect();
        let genre = book.genre.iter().filter_map(|id| genre.remove(id)).collect();

        Ok(Some(BookView::new(
            &book,
            author.as_ref().map(AuthorView::from),
            genre,
        )))
    }

    /// Authors referenced by `ids`, keyed by identity. Dangling ids are absent.
    async fn authors_by_id(
        &self,
        ids: impl IntoIterator<Item = RecordId>,
    ) -> Result<HashMap<RecordId, AuthorView>> {
        let found = self.authors().find(&by_ids(ids)).await?;
        Ok(found
            .iter()
            .map(|record| (record.id, AuthorView::from(record)))
            .collect())
    }

    /// Every author, sorted by family name.
    async fn author_options(&self) -> Result<Vec<AuthorView>> {
        let mut authors = self.authors().find(&Filter::all()).await?;
        authors.sort_by(|a, b| a.family_name.cmp(&b.family_name));
        Ok(authors.iter().map(AuthorView::from).collect())
    }

    /// Every genre, sorted by name.
    async fn genre_options(&self) -> Result<Vec<GenreView>> {
        let mut genres = self.genres().find(&Filter::all()).await?;
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres.iter().map(GenreView::from).collect())
    }
}

/// Membership filter on document identity.
fn by_ids(ids: impl IntoIterator<Item = RecordId>) -> Filter {
    Filter::is_in(ID_FIELD, ids.into_iter().map(|id| id.to_string()))
}

/// Equality filter on a reference field.
fn referencing(field: &str, id: RecordId) -> Filter {
    Filter::eq(field, id.to_string())
}

/// Identity taken from a path segment; anything malformed cannot exist.
fn target(raw: &str, missing: &'static str) -> Result<RecordId> {
    parse_id(raw).ok_or(CatalogError::NotFound(missing))
}

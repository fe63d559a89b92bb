use serde_json::json;

use locallib_db::{parse_id, Filter, RecordId};

use super::{referencing, target, Catalog, CatalogError, Outcome, Result};
use crate::modules::catalog::drafts::{self, BookDraft, Rejected};
use crate::modules::catalog::forms::RawForm;
use crate::modules::catalog::models::{list_url, url_for, Book, BookListing};
use crate::modules::catalog::validation::FieldError;
use crate::modules::catalog::views::{BookInstanceView, BookListView, BookView, GenreView};

const NOT_FOUND: &str = "Book not found";

impl Catalog {
    pub async fn book_list(&self) -> Result<Outcome> {
        let mut books = self
            .books()
            .find_projected::<BookListing>(&Filter::all())
            .await?;
        books.sort_by(|a, b| a.title.cmp(&b.title));

        let authors = self
            .authors_by_id(books.iter().map(|book| book.author))
            .await?;
        let book_list: Vec<_> = books
            .iter()
            .map(|book| BookListView::new(book, authors.get(&book.author).cloned()))
            .collect();

        Ok(Outcome::render(
            "book_list",
            json!({ "title": "Book List", "book_list": book_list }),
        ))
    }

    pub async fn book_detail(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let (book, book_instances) = self
            .book_with_copies(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        Ok(Outcome::render(
            "book_detail",
            json!({ "title": book.title, "book": book, "book_instances": book_instances }),
        ))
    }

    pub async fn book_create_form(&self) -> Result<Outcome> {
        self.book_form("Create Book", &BookDraft::default(), Vec::new())
            .await
    }

    pub async fn book_create(&self, form: &RawForm) -> Result<Outcome> {
        match drafts::book(form).validated() {
            Ok(book) => {
                let id = self.books().insert(&book).await?;
                tracing::info!(book_id = %id, title = %book.title, "book created");
                Ok(Outcome::redirect(url_for::<Book>(id)))
            }
            Err(Rejected { draft, errors }) => self.book_form("Create Book", &draft, errors).await,
        }
    }

    pub async fn book_update_form(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let book = self
            .books()
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        self.book_form("Update Book", &BookDraft::from_record(&book), Vec::new())
            .await
    }

    /// Full replace keeping the existing identity.
    pub async fn book_update(&self, id: &str, form: &RawForm) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        match drafts::book(form).validated() {
            Ok(book) => {
                self.books()
                    .replace(id, &book)
                    .await?
                    .ok_or(CatalogError::NotFound(NOT_FOUND))?;
                tracing::info!(book_id = %id, "book updated");
                Ok(Outcome::redirect(url_for::<Book>(id)))
            }
            Err(Rejected { draft, errors }) => self.book_form("Update Book", &draft, errors).await,
        }
    }

    pub async fn book_delete_form(&self, id: &str) -> Result<Outcome> {
        let found = match parse_id(id) {
            Some(id) => self.book_with_copies(id).await?,
            None => None,
        };
        match found {
            Some((book, book_instances)) => Ok(book_delete_view(book, book_instances)),
            None => Ok(Outcome::redirect(list_url::<Book>())),
        }
    }

    /// Removes the book named by `bookid` unless copies of it remain.
    pub async fn book_delete(&self, form: &RawForm) -> Result<Outcome> {
        let found = match form.scalar("bookid").and_then(parse_id) {
            Some(id) => self.book_with_copies(id).await?,
            None => None,
        };
        let Some((book, book_instances)) = found else {
            return Ok(Outcome::redirect(list_url::<Book>()));
        };

        if !book_instances.is_empty() {
            tracing::info!(
                book_id = %book.id,
                copies = book_instances.len(),
                "book delete blocked by copies"
            );
            return Ok(book_delete_view(book, book_instances));
        }

        self.books().remove(book.id).await?;
        tracing::info!(book_id = %book.id, "book deleted");
        Ok(Outcome::redirect(list_url::<Book>()))
    }

    /// Populated book and its copies, loaded together.
    async fn book_with_copies(
        &self,
        id: RecordId,
    ) -> Result<Option<(BookView, Vec<BookInstanceView>)>> {
        let instances = self.instances();
        let (book, copies) = futures::try_join!(self.book_view(id), async {
            instances
                .find(&referencing("book", id))
                .await
                .map_err(CatalogError::from)
        })?;

        Ok(book.map(|book| {
            let link = book.link();
            let copies = copies
                .iter()
                .map(|copy| BookInstanceView::new(copy, Some(link.clone())))
                .collect();
            (book, copies)
        }))
    }

    /// Book form with author and genre choices; the draft's genres are checked.
    async fn book_form(
        &self,
        title: &str,
        draft: &BookDraft,
        errors: Vec<FieldError>,
    ) -> Result<Outcome> {
        let (authors, genres) = futures::try_join!(self.author_options(), self.genre_options())?;
        let genres: Vec<GenreView> = genres
            .into_iter()
            .map(|genre| GenreView {
                checked: draft.selects_genre(genre.id),
                ..genre
            })
            .collect();

        Ok(Outcome::render(
            "book_form",
            json!({
                "title": title,
                "authors": authors,
                "genres": genres,
                "book": draft,
                "errors": errors,
            }),
        ))
    }
}

fn book_delete_view(book: BookView, book_instances: Vec<BookInstanceView>) -> Outcome {
    Outcome::render(
        "book_delete",
        json!({ "title": "Delete Book", "book": book, "book_instances": book_instances }),
    )
}

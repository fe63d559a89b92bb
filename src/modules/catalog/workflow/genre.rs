use serde_json::json;

use locallib_db::{parse_id, Filter, RecordId};

use super::{referencing, target, Catalog, CatalogError, Outcome, Result};
use crate::modules::catalog::drafts::{self, GenreDraft, Rejected};
use crate::modules::catalog::forms::RawForm;
use crate::modules::catalog::models::{list_url, url_for, BookSummary, Genre};
use crate::modules::catalog::validation::FieldError;
use crate::modules::catalog::views::{BookSummaryView, GenreView};

const NOT_FOUND: &str = "Genre not found";

impl Catalog {
    pub async fn genre_list(&self) -> Result<Outcome> {
        let genre_list = self.genre_options().await?;
        Ok(Outcome::render(
            "genre_list",
            json!({ "title": "Genre List", "genre_list": genre_list }),
        ))
    }

    pub async fn genre_detail(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let (genre, genre_books) = self
            .genre_with_books(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        Ok(Outcome::render(
            "genre_detail",
            json!({ "title": "Genre Detail", "genre": genre, "genre_books": genre_books }),
        ))
    }

    pub async fn genre_create_form(&self) -> Result<Outcome> {
        Ok(genre_form("Create Genre", &GenreDraft::default(), Vec::new()))
    }

    /// Creates the genre, or redirects to an existing genre with the same name.
    pub async fn genre_create(&self, form: &RawForm) -> Result<Outcome> {
        let genre = match drafts::genre(form).validated() {
            Ok(genre) => genre,
            Err(Rejected { draft, errors }) => {
                return Ok(genre_form("Create Genre", &draft, errors));
            }
        };

        let same_name = Filter::eq("name", genre.name.as_str());
        if let Some(existing) = self.genres().find(&same_name).await?.first() {
            tracing::info!(genre_id = %existing.id, name = %genre.name, "genre already exists");
            return Ok(Outcome::redirect(url_for::<Genre>(existing.id)));
        }

        let id = self.genres().insert(&genre).await?;
        tracing::info!(genre_id = %id, name = %genre.name, "genre created");
        Ok(Outcome::redirect(url_for::<Genre>(id)))
    }

    pub async fn genre_update_form(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let genre = self
            .genres()
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        Ok(genre_form(
            "Update Genre",
            &GenreDraft::from_record(&genre),
            Vec::new(),
        ))
    }

    pub async fn genre_update(&self, id: &str, form: &RawForm) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        match drafts::genre(form).validated() {
            Ok(genre) => {
                self.genres()
                    .replace(id, &genre)
                    .await?
                    .ok_or(CatalogError::NotFound(NOT_FOUND))?;
                tracing::info!(genre_id = %id, "genre updated");
                Ok(Outcome::redirect(url_for::<Genre>(id)))
            }
            Err(Rejected { draft, errors }) => Ok(genre_form("Update Genre", &draft, errors)),
        }
    }

    pub async fn genre_delete_form(&self, id: &str) -> Result<Outcome> {
        let found = match parse_id(id) {
            Some(id) => self.genre_with_books(id).await?,
            None => None,
        };
        match found {
            Some((genre, genre_books)) => Ok(genre_delete_view(genre, genre_books)),
            None => Ok(Outcome::redirect(list_url::<Genre>())),
        }
    }

    /// Removes the genre named by `genreid` unless books are filed under it.
    pub async fn genre_delete(&self, form: &RawForm) -> Result<Outcome> {
        let found = match form.scalar("genreid").and_then(parse_id) {
            Some(id) => self.genre_with_books(id).await?,
            None => None,
        };
        let Some((genre, genre_books)) = found else {
            return Ok(Outcome::redirect(list_url::<Genre>()));
        };

        if !genre_books.is_empty() {
            tracing::info!(
                genre_id = %genre.id,
                books = genre_books.len(),
                "genre delete blocked by books"
            );
            return Ok(genre_delete_view(genre, genre_books));
        }

        self.genres().remove(genre.id).await?;
        tracing::info!(genre_id = %genre.id, "genre deleted");
        Ok(Outcome::redirect(list_url::<Genre>()))
    }

    async fn genre_with_books(
        &self,
        id: RecordId,
    ) -> Result<Option<(GenreView, Vec<BookSummaryView>)>> {
        let (genres, books) = (self.genres(), self.books());
        let filed = referencing("genre", id);
        let (genre, genre_books) = futures::try_join!(
            genres.find_by_id(id),
            books.find_projected::<BookSummary>(&filed),
        )?;

        Ok(genre.map(|genre| {
            (
                GenreView::from(&genre),
                genre_books.iter().map(BookSummaryView::from).collect(),
            )
        }))
    }
}

fn genre_form(title: &str, draft: &GenreDraft, errors: Vec<FieldError>) -> Outcome {
    Outcome::render(
        "genre_form",
        json!({ "title": title, "genre": draft, "errors": errors }),
    )
}

fn genre_delete_view(genre: GenreView, genre_books: Vec<BookSummaryView>) -> Outcome {
    Outcome::render(
        "genre_delete",
        json!({ "title": "Delete Genre", "genre": genre, "genre_books": genre_books }),
    )
}

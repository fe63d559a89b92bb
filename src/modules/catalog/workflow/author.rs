use serde_json::json;

use locallib_db::{parse_id, RecordId};

use super::{referencing, target, Catalog, CatalogError, Outcome, Result};
use crate::modules::catalog::drafts::{self, AuthorDraft, Rejected};
use crate::modules::catalog::forms::RawForm;
use crate::modules::catalog::models::{list_url, url_for, Author, BookSummary};
use crate::modules::catalog::validation::FieldError;
use crate::modules::catalog::views::{AuthorView, BookSummaryView};

const NOT_FOUND: &str = "Author not found";

impl Catalog {
    pub async fn author_list(&self) -> Result<Outcome> {
        let author_list = self.author_options().await?;
        Ok(Outcome::render(
            "author_list",
            json!({ "title": "Author List", "author_list": author_list }),
        ))
    }

    pub async fn author_detail(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let (author, author_books) = self
            .author_with_books(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        Ok(Outcome::render(
            "author_detail",
            json!({ "title": "Author Detail", "author": author, "author_books": author_books }),
        ))
    }

    pub async fn author_create_form(&self) -> Result<Outcome> {
        Ok(author_form("Create Author", &AuthorDraft::default(), Vec::new()))
    }

    pub async fn author_create(&self, form: &RawForm) -> Result<Outcome> {
        match drafts::author(form).validated() {
            Ok(author) => {
                let id = self.authors().insert(&author).await?;
                tracing::info!(author_id = %id, name = %author.name(), "author created");
                Ok(Outcome::redirect(url_for::<Author>(id)))
            }
            Err(Rejected { draft, errors }) => Ok(author_form("Create Author", &draft, errors)),
        }
    }

    pub async fn author_update_form(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let author = self
            .authors()
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        Ok(author_form(
            "Update Author",
            &AuthorDraft::from_record(&author),
            Vec::new(),
        ))
    }

    pub async fn author_update(&self, id: &str, form: &RawForm) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        match drafts::author(form).validated() {
            Ok(author) => {
                self.authors()
                    .replace(id, &author)
                    .await?
                    .ok_or(CatalogError::NotFound(NOT_FOUND))?;
                tracing::info!(author_id = %id, "author updated");
                Ok(Outcome::redirect(url_for::<Author>(id)))
            }
            Err(Rejected { draft, errors }) => Ok(author_form("Update Author", &draft, errors)),
        }
    }

    pub async fn author_delete_form(&self, id: &str) -> Result<Outcome> {
        let found = match parse_id(id) {
            Some(id) => self.author_with_books(id).await?,
            None => None,
        };
        match found {
            Some((author, author_books)) => Ok(author_delete_view(author, author_books)),
            None => Ok(Outcome::redirect(list_url::<Author>())),
        }
    }

    /// Removes the author named by `authorid` unless books still reference them.
    pub async fn author_delete(&self, form: &RawForm) -> Result<Outcome> {
        let found = match form.scalar("authorid").and_then(parse_id) {
            Some(id) => self.author_with_books(id).await?,
            None => None,
        };
        let Some((author, author_books)) = found else {
            return Ok(Outcome::redirect(list_url::<Author>()));
        };

        if !author_books.is_empty() {
            tracing::info!(
                author_id = %author.id,
                books = author_books.len(),
                "author delete blocked by books"
            );
            return Ok(author_delete_view(author, author_books));
        }

        self.authors().remove(author.id).await?;
        tracing::info!(author_id = %author.id, "author deleted");
        Ok(Outcome::redirect(list_url::<Author>()))
    }

    async fn author_with_books(
        &self,
        id: RecordId,
    ) -> Result<Option<(AuthorView, Vec<BookSummaryView>)>> {
        let (authors, books) = (self.authors(), self.books());
        let written = referencing("author", id);
        let (author, author_books) = futures::try_join!(
            authors.find_by_id(id),
            books.find_projected::<BookSummary>(&written),
        )?;

        Ok(author.map(|author| {
            (
                AuthorView::from(&author),
                author_books.iter().map(BookSummaryView::from).collect(),
            )
        }))
    }
}

fn author_form(title: &str, draft: &AuthorDraft, errors: Vec<FieldError>) -> Outcome {
    Outcome::render(
        "author_form",
        json!({ "title": title, "author": draft, "errors": errors }),
    )
}

fn author_delete_view(author: AuthorView, author_books: Vec<BookSummaryView>) -> Outcome {
    Outcome::render(
        "author_delete",
        json!({ "title": "Delete Author", "author": author, "author_books": author_books }),
    )
}

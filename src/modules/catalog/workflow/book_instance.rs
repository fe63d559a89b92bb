use std::collections::HashMap;

use serde_json::json;

use locallib_db::{parse_id, Filter, Record, RecordId};

use super::{by_ids, target, Catalog, CatalogError, Outcome, Result};
use crate::modules::catalog::drafts::{self, BookInstanceDraft, Rejected};
use crate::modules::catalog::forms::RawForm;
use crate::modules::catalog::models::{list_url, url_for, BookInstance, BookStatus, BookTitle};
use crate::modules::catalog::validation::FieldError;
use crate::modules::catalog::views::{BookInstanceView, BookLink};

const NOT_FOUND: &str = "Book copy not found";

impl Catalog {
    pub async fn bookinstance_list(&self) -> Result<Outcome> {
        let copies = self.instances().find(&Filter::all()).await?;
        let bookinstance_list = self.instance_views(&copies).await?;

        Ok(Outcome::render(
            "bookinstance_list",
            json!({ "title": "Book Instance List", "bookinstance_list": bookinstance_list }),
        ))
    }

    pub async fn bookinstance_detail(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let copy = self
            .instance_view(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        let title = match &copy.book {
            Some(book) => format!("Copy: {}", book.title),
            None => "Copy".to_string(),
        };
        Ok(Outcome::render(
            "bookinstance_detail",
            json!({ "title": title, "bookinstance": copy }),
        ))
    }

    pub async fn bookinstance_create_form(&self) -> Result<Outcome> {
        self.bookinstance_form("Create BookInstance", &BookInstanceDraft::default(), Vec::new())
            .await
    }

    pub async fn bookinstance_create(&self, form: &RawForm) -> Result<Outcome> {
        match drafts::book_instance(form).validated() {
            Ok(copy) => {
                let id = self.instances().insert(&copy).await?;
                tracing::info!(bookinstance_id = %id, book_id = %copy.book, "book copy created");
                Ok(Outcome::redirect(url_for::<BookInstance>(id)))
            }
            Err(Rejected { draft, errors }) => {
                self.bookinstance_form("Create BookInstance", &draft, errors)
                    .await
            }
        }
    }

    pub async fn bookinstance_update_form(&self, id: &str) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        let copy = self
            .instances()
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(NOT_FOUND))?;

        self.bookinstance_form(
            "Update BookInstance",
            &BookInstanceDraft::from_record(&copy),
            Vec::new(),
        )
        .await
    }

    pub async fn bookinstance_update(&self, id: &str, form: &RawForm) -> Result<Outcome> {
        let id = target(id, NOT_FOUND)?;
        match drafts::book_instance(form).validated() {
            Ok(copy) => {
                self.instances()
                    .replace(id, &copy)
                    .await?
                    .ok_or(CatalogError::NotFound(NOT_FOUND))?;
                tracing::info!(bookinstance_id = %id, status = %copy.status, "book copy updated");
                Ok(Outcome::redirect(url_for::<BookInstance>(id)))
            }
            Err(Rejected { draft, errors }) => {
                self.bookinstance_form("Update BookInstance", &draft, errors)
                    .await
            }
        }
    }

    pub async fn bookinstance_delete_form(&self, id: &str) -> Result<Outcome> {
        let found = match parse_id(id) {
            Some(id) => self.instance_view(id).await?,
            None => None,
        };
        match found {
            Some(copy) => Ok(Outcome::render(
                "bookinstance_delete",
                json!({ "title": "Delete BookInstance", "bookinstance": copy }),
            )),
            None => Ok(Outcome::redirect(list_url::<BookInstance>())),
        }
    }

    /// Copies have no dependents; the one named by `bookinstanceid` is removed
    /// when it exists.
    pub async fn bookinstance_delete(&self, form: &RawForm) -> Result<Outcome> {
        let found = match form.scalar("bookinstanceid").and_then(parse_id) {
            Some(id) => self.instances().find_by_id(id).await?,
            None => None,
        };
        if let Some(copy) = found {
            self.instances().remove(copy.id).await?;
            tracing::info!(bookinstance_id = %copy.id, "book copy deleted");
        }
        Ok(Outcome::redirect(list_url::<BookInstance>()))
    }

    async fn instance_view(&self, id: RecordId) -> Result<Option<BookInstanceView>> {
        let Some(copy) = self.instances().find_by_id(id).await? else {
            return Ok(None);
        };
        let mut views = self.instance_views(std::slice::from_ref(&copy)).await?;
        Ok(views.pop())
    }

    /// Copies with their book populated; a dangling book reference is `None`.
    async fn instance_views(&self, copies: &[Record<BookInstance>]) -> Result<Vec<BookInstanceView>> {
        let titles = self
            .books()
            .find_projected::<BookTitle>(&by_ids(copies.iter().map(|copy| copy.book)))
            .await?;
        let books: HashMap<RecordId, BookLink> = titles
            .iter()
            .map(|record| (record.id, BookLink::from(record)))
            .collect();

        Ok(copies
            .iter()
            .map(|copy| BookInstanceView::new(copy, books.get(&copy.book).cloned()))
            .collect())
    }

    /// Every book as a selectable link, sorted by title.
    async fn book_options(&self) -> Result<Vec<BookLink>> {
        let mut titles = self
            .books()
            .find_projected::<BookTitle>(&Filter::all())
            .await?;
        titles.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(titles.iter().map(BookLink::from).collect())
    }

    async fn bookinstance_form(
        &self,
        title: &str,
        draft: &BookInstanceDraft,
        errors: Vec<FieldError>,
    ) -> Result<Outcome> {
        let book_list = self.book_options().await?;
        Ok(Outcome::render(
            "bookinstance_form",
            json!({
                "title": title,
                "book_list": book_list,
                "selected_book": draft.book,
                "statuses": BookStatus::NAMES,
                "bookinstance": draft,
                "errors": errors,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::Value;

    use super::super::testing::{catalog, form, location, view};
    use super::*;
    use crate::modules::catalog::models::Book;

    async fn book(catalog: &Catalog, title: &str) -> RecordId {
        catalog
            .books()
            .insert(&Book {
                title: title.to_string(),
                author: RecordId::now_v7(),
                summary: "s".to_string(),
                isbn: "i".to_string(),
                genre: Vec::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_defaults_status_and_redirects_to_copy() {
        let (catalog, _) = catalog();
        let book = book(&catalog, "Death Wave").await;

        let to = location(
            catalog
                .bookinstance_create(&form(&[
                    ("book", &book.to_string()),
                    ("imprint", " New York Tom Doherty Associates, 2016. "),
                    ("due_back", "2020-01-05"),
                ]))
                .await
                .unwrap(),
        );

        let copies = catalog.instances().find(&Filter::all()).await.unwrap();
        assert_eq!(copies.len(), 1);
        assert_eq!(to, format!("/catalog/bookinstance/{}", copies[0].id));
        assert_eq!(copies[0].status, BookStatus::Maintenance);
        assert_eq!(copies[0].imprint, "New York Tom Doherty Associates, 2016.");
        assert_eq!(copies[0].due_back, NaiveDate::from_ymd_opt(2020, 1, 5));
    }

    #[tokio::test]
    async fn invalid_create_marks_selected_book() {
        let (catalog, _) = catalog();
        let picked = book(&catalog, "B").await;
        book(&catalog, "A").await;

        let page = view(
            catalog
                .bookinstance_create(&form(&[("book", &picked.to_string()), ("status", "Lost")]))
                .await
                .unwrap(),
        );
        assert_eq!(page.name, "bookinstance_form");
        assert_eq!(page.model["selected_book"], picked.to_string());
        assert_eq!(page.model["book_list"][0]["title"], "A");
        let messages: Vec<_> = page.model["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["msg"].clone())
            .collect();
        assert_eq!(
            messages,
            vec![Value::from("Imprint must be specified."), Value::from("Invalid status.")]
        );
        assert_eq!(catalog.instances().count(&Filter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn detail_titles_copy_after_its_book() {
        let (catalog, _) = catalog();
        let book = book(&catalog, "Apes and Angels").await;
        let copy = catalog
            .instances()
            .insert(&BookInstance {
                book,
                imprint: "Imprint".to_string(),
                status: BookStatus::Loaned,
                due_back: NaiveDate::from_ymd_opt(2021, 6, 1),
            })
            .await
            .unwrap();
        let orphan = catalog
            .instances()
            .insert(&BookInstance {
                book: RecordId::now_v7(),
                imprint: "Imprint".to_string(),
                status: BookStatus::Available,
                due_back: None,
            })
            .await
            .unwrap();

        let page = view(catalog.bookinstance_detail(&copy.to_string()).await.unwrap());
        assert_eq!(page.model["title"], "Copy: Apes and Angels");
        assert_eq!(page.model["bookinstance"]["due_back_formatted"], "Jun 1, 2021");

        let page = view(catalog.bookinstance_detail(&orphan.to_string()).await.unwrap());
        assert_eq!(page.model["title"], "Copy");
        assert_eq!(page.model["bookinstance"]["book"], Value::Null);

        let err = catalog.bookinstance_detail("nope").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound("Book copy not found")));
    }

    #[tokio::test]
    async fn update_keeps_identity() {
        let (catalog, _) = catalog();
        let book = book(&catalog, "Title").await;
        let id = catalog
            .instances()
            .insert(&BookInstance {
                book,
                imprint: "Old".to_string(),
                status: BookStatus::Maintenance,
                due_back: None,
            })
            .await
            .unwrap();

        let page = view(catalog.bookinstance_update_form(&id.to_string()).await.unwrap());
        assert_eq!(page.model["title"], "Update BookInstance");
        assert_eq!(page.model["bookinstance"]["status"], "Maintenance");

        let to = location(
            catalog
                .bookinstance_update(
                    &id.to_string(),
                    &form(&[
                        ("book", &book.to_string()),
                        ("imprint", "New"),
                        ("status", "Available"),
                    ]),
                )
                .await
                .unwrap(),
        );
        assert_eq!(to, format!("/catalog/bookinstance/{id}"));
        let stored = catalog.instances().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.imprint, "New");
        assert_eq!(stored.status, BookStatus::Available);
    }

    #[tokio::test]
    async fn invalid_update_persists_nothing_and_echoes_sanitized_input() {
        let (catalog, _) = catalog();
        let book = book(&catalog, "Title").await;
        let id = catalog
            .instances()
            .insert(&BookInstance {
                book,
                imprint: "Old".to_string(),
                status: BookStatus::Available,
                due_back: None,
            })
            .await
            .unwrap();
        let before = catalog.instances().find(&Filter::all()).await.unwrap();

        let page = view(
            catalog
                .bookinstance_update(
                    &id.to_string(),
                    &form(&[
                        ("book", &book.to_string()),
                        ("imprint", "  Tor & Forge  "),
                        ("status", " Lost "),
                    ]),
                )
                .await
                .unwrap(),
        );

        assert_eq!(page.name, "bookinstance_form");
        assert_eq!(page.model["title"], "Update BookInstance");
        assert_eq!(page.model["selected_book"], book.to_string());
        assert_eq!(page.model["bookinstance"]["imprint"], "Tor &amp; Forge");
        assert_eq!(page.model["bookinstance"]["status"], "Lost");
        assert_eq!(page.model["errors"][0]["msg"], "Invalid status.");

        assert_eq!(catalog.instances().find(&Filter::all()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_removes_existing_copy_only() {
        let (catalog, _) = catalog();
        let book = book(&catalog, "Title").await;
        let id = catalog
            .instances()
            .insert(&BookInstance {
                book,
                imprint: "Imprint".to_string(),
                status: BookStatus::Available,
                due_back: None,
            })
            .await
            .unwrap();

        let page = view(catalog.bookinstance_delete_form(&id.to_string()).await.unwrap());
        assert_eq!(page.name, "bookinstance_delete");

        let ghost = RecordId::now_v7().to_string();
        let to = location(
            catalog
                .bookinstance_delete(&form(&[("bookinstanceid", &ghost)]))
                .await
                .unwrap(),
        );
        assert_eq!(to, "/catalog/bookinstances");
        assert_eq!(catalog.instances().count(&Filter::all()).await.unwrap(), 1);

        catalog
            .bookinstance_delete(&form(&[("bookinstanceid", &id.to_string())]))
            .await
            .unwrap();
        assert_eq!(catalog.instances().count(&Filter::all()).await.unwrap(), 0);
    }
}

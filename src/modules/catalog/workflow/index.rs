use serde_json::{json, Value};

use locallib_db::Filter;

use super::{Catalog, Outcome, Result};
use crate::modules::catalog::assembler::Assembler;
use crate::modules::catalog::models::BookStatus;

impl Catalog {
    /// Home page with the collection counts.
    ///
    /// A failed count does not fail the page: the view is rendered with an
    /// `error` and no data.
    pub async fn index(&self) -> Result<Outcome> {
        let (books, instances, authors, genres) =
            (self.books(), self.instances(), self.authors(), self.genres());
        let all = Filter::all();
        let available = Filter::eq("status", BookStatus::Available.as_str());

        let counts = Assembler::new()
            .with("book_count", books.count(&all))
            .with("book_instance_count", instances.count(&all))
            .with("book_instance_available_count", instances.count(&available))
            .with("author_count", authors.count(&all))
            .with("genre_count", genres.count(&all))
            .run()
            .await;

        let (error, data) = match counts {
            Ok(counts) => (Value::Null, json!(counts)),
            Err(err) => {
                tracing::error!(error = %err, "failed to count catalog records");
                (json!(err.to_string()), Value::Null)
            }
        };

        Ok(Outcome::render(
            "index",
            json!({ "title": "Local Library Home", "error": error, "data": data }),
        ))
    }
}

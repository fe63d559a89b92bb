use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use locallib_db::{Entity, Projection, Record, RecordId};

/// Mount point of the catalog; every canonical URL starts here.
pub const CATALOG_ROOT: &str = "/catalog";

/// `Oct 14, 1983`
const DATE_MED: &str = "%b %-d, %Y";

/// A catalogued title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub title: String,
    /// Author reference; not guaranteed to resolve
    #[schema(value_type = String, format = Uuid)]
    pub author: RecordId,
    pub summary: String,
    pub isbn: String,
    /// Genre references, in selection order
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub genre: Vec<RecordId>,
}

impl Entity for Book {
    const COLLECTION: &'static str = "books";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Author {
    pub first_name: String,
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl Entity for Author {
    const COLLECTION: &'static str = "authors";
}

impl Author {
    /// Display name, `family, first`.
    pub fn name(&self) -> String {
        format!("{}, {}", self.family_name, self.first_name)
    }

    /// Difference of calendar years between death and birth, or `unknown`
    /// unless both dates are known.
    pub fn lifespan(&self) -> String {
        match (self.date_of_birth, self.date_of_death) {
            (Some(born), Some(died)) => (died.year() - born.year()).to_string(),
            _ => "unknown".to_string(),
        }
    }

    pub fn date_of_birth_formatted(&self) -> String {
        format_date(self.date_of_birth).unwrap_or_else(|| "unknown".to_string())
    }

    pub fn date_of_death_formatted(&self) -> String {
        format_date(self.date_of_death).unwrap_or_else(|| "present/unknown".to_string())
    }

    pub fn lifespan_formatted(&self) -> String {
        format!(
            "{} - {}",
            self.date_of_birth_formatted(),
            self.date_of_death_formatted()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Genre {
    pub name: String,
}

impl Entity for Genre {
    const COLLECTION: &'static str = "genres";
}

/// Circulation state of a physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    #[default]
    Maintenance,
    Available,
    Loaned,
    Reserved,
}

impl BookStatus {
    pub const ALL: [BookStatus; 4] = [
        BookStatus::Maintenance,
        BookStatus::Available,
        BookStatus::Loaned,
        BookStatus::Reserved,
    ];

    pub const NAMES: &'static [&'static str] = &["Maintenance", "Available", "Loaned", "Reserved"];

    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::Maintenance => "Maintenance",
            BookStatus::Available => "Available",
            BookStatus::Loaned => "Loaned",
            BookStatus::Reserved => "Reserved",
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, ()> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or(())
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical copy of a [`Book`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookInstance {
    #[schema(value_type = String, format = Uuid)]
    pub book: RecordId,
    pub imprint: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub due_back: Option<NaiveDate>,
}

impl Entity for BookInstance {
    const COLLECTION: &'static str = "bookinstances";
}

impl BookInstance {
    pub fn due_back_formatted(&self) -> String {
        format_date(self.due_back).unwrap_or_default()
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_MED).to_string())
}

/// `title author` projection used by the book list.
#[derive(Debug, Clone, Deserialize)]
pub struct BookListing {
    pub title: String,
    pub author: RecordId,
}

impl Projection for BookListing {
    type Of = Book;
    const FIELDS: &'static [&'static str] = &["title", "author"];
}

/// `title` projection used to populate book selectors.
#[derive(Debug, Clone, Deserialize)]
pub struct BookTitle {
    pub title: String,
}

impl Projection for BookTitle {
    type Of = Book;
    const FIELDS: &'static [&'static str] = &["title"];
}

/// `title summary` projection used on author and genre pages.
#[derive(Debug, Clone, Deserialize)]
pub struct BookSummary {
    pub title: String,
    pub summary: String,
}

impl Projection for BookSummary {
    type Of = Book;
    const FIELDS: &'static [&'static str] = &["title", "summary"];
}

/// Path segment a resource's canonical URL is built from.
pub trait Linked {
    const SEGMENT: &'static str;
}

impl Linked for Book {
    const SEGMENT: &'static str = "book";
}

impl Linked for Author {
    const SEGMENT: &'static str = "author";
}

impl Linked for Genre {
    const SEGMENT: &'static str = "genre";
}

impl Linked for BookInstance {
    const SEGMENT: &'static str = "bookinstance";
}

impl Linked for BookListing {
    const SEGMENT: &'static str = "book";
}

impl Linked for BookTitle {
    const SEGMENT: &'static str = "book";
}

impl Linked for BookSummary {
    const SEGMENT: &'static str = "book";
}

/// Canonical URL of the resource `T` stored under `id`.
pub fn url_for<T: Linked>(id: RecordId) -> String {
    format!("{}/{}/{}", CATALOG_ROOT, T::SEGMENT, id)
}

/// List view of the resource `T`.
pub fn list_url<T: Linked>() -> String {
    format!("{}/{}s", CATALOG_ROOT, T::SEGMENT)
}

/// Derived URL accessor for stored records.
pub trait Url {
    fn url(&self) -> String;
}

impl<T: Linked> Url for Record<T> {
    fn url(&self) -> String {
        url_for::<T>(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn asimov() -> Author {
        Author {
            first_name: "Isaac".to_string(),
            family_name: "Asimov".to_string(),
            date_of_birth: date(1920, 1, 2),
            date_of_death: date(1992, 4, 6),
        }
    }

    #[test]
    fn display_name_is_family_then_first() {
        assert_eq!(asimov().name(), "Asimov, Isaac");
    }

    #[test]
    fn lifespan_is_naive_year_difference() {
        let mut author = asimov();
        assert_eq!(author.lifespan(), "72");

        author.date_of_birth = date(1920, 12, 31);
        author.date_of_death = date(1921, 1, 1);
        assert_eq!(author.lifespan(), "1");
    }

    #[test]
    fn lifespan_is_unknown_without_both_dates() {
        let mut author = asimov();
        author.date_of_death = None;
        assert_eq!(author.lifespan(), "unknown");

        author.date_of_birth = None;
        author.date_of_death = date(1992, 4, 6);
        assert_eq!(author.lifespan(), "unknown");
    }

    #[test]
    fn lifespan_formatted_falls_back_per_side() {
        assert_eq!(asimov().lifespan_formatted(), "Jan 2, 1920 - Apr 6, 1992");

        let living = Author {
            date_of_death: None,
            ..asimov()
        };
        assert_eq!(living.lifespan_formatted(), "Jan 2, 1920 - present/unknown");

        let undated = Author {
            date_of_birth: None,
            date_of_death: None,
            ..asimov()
        };
        assert_eq!(undated.lifespan_formatted(), "unknown - present/unknown");
    }

    #[test]
    fn urls_are_derived_from_identity() {
        let id = RecordId::now_v7();
        let genre = Record {
            id,
            data: Genre {
                name: "Fantasy".to_string(),
            },
        };
        assert_eq!(genre.url(), format!("/catalog/genre/{id}"));
        assert_eq!(url_for::<BookInstance>(id), format!("/catalog/bookinstance/{id}"));
        assert_eq!(list_url::<Book>(), "/catalog/books");
    }

    #[test]
    fn status_names_round_trip() {
        for status in BookStatus::ALL {
            assert_eq!(status.as_str().parse::<BookStatus>(), Ok(status));
        }
        assert!("Lost".parse::<BookStatus>().is_err());
        assert_eq!(BookStatus::default(), BookStatus::Maintenance);
    }

    #[test]
    fn stored_shape_uses_plain_field_names() {
        let instance = BookInstance {
            book: RecordId::nil(),
            imprint: "Gollancz, 2011.".to_string(),
            status: BookStatus::Loaned,
            due_back: date(2020, 6, 1),
        };
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["status"], "Loaned");
        assert_eq!(json["due_back"], "2020-06-01");
        assert_eq!(instance.due_back_formatted(), "Jun 1, 2020");
    }
}

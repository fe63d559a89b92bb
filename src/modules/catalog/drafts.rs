//! Sanitized candidates for each resource, built from submitted forms.
//!
//! A draft always exists, valid or not, so a rejected form can be echoed back
//! with cleaned values. Field checks are declared on the drafts and run
//! against the trimmed input; [`Submission::validated`] turns the escaped
//! draft into the typed record once every check passed and every reference
//! parsed.

use serde::Serialize;
use validator::{Validate, ValidationError};

use locallib_db::{parse_id, Record, RecordId};

use super::forms::RawForm;
use super::models::{Author, Book, BookInstance, BookStatus, Genre};
use super::validation::{field_errors, filled, iso_date, parse_iso_date, FieldError, Rule, Rules, Sanitized};

const ISO_DATE: &str = "%Y-%m-%d";

/// Conversion from a cleaned draft to the record it describes.
pub trait Draft {
    type Record;

    fn resolve(&self) -> Result<Self::Record, Vec<FieldError>>;
}

/// A draft with the failures its rules produced.
#[derive(Debug, Clone)]
pub struct Submission<D> {
    pub draft: D,
    pub errors: Vec<FieldError>,
}

/// A submission that cannot be persisted.
#[derive(Debug, Clone)]
pub struct Rejected<D> {
    pub draft: D,
    pub errors: Vec<FieldError>,
}

impl<D: Draft> Submission<D> {
    pub fn validated(self) -> Result<D::Record, Rejected<D>> {
        if !self.errors.is_empty() {
            return Err(Rejected {
                draft: self.draft,
                errors: self.errors,
            });
        }
        self.draft.resolve().map_err(|errors| Rejected {
            draft: self.draft,
            errors,
        })
    }
}

fn submit<D: Validate>(rules: &Rules, form: &RawForm, build: impl Fn(&Sanitized) -> D) -> Submission<D> {
    let cleaned = rules.clean(form);
    let errors = match build(&cleaned.checked).validate() {
        Ok(()) => Vec::new(),
        Err(failures) => field_errors(rules.fields(), &failures),
    };
    Submission {
        draft: build(&cleaned.echoed),
        errors,
    }
}

fn reference(field: &str, raw: &str, message: &str) -> Result<RecordId, FieldError> {
    parse_id(raw).ok_or_else(|| FieldError::new(field, message))
}

fn optional_date(field: &str, raw: &str, message: &str) -> Result<Option<chrono::NaiveDate>, FieldError> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_iso_date(raw)
        .map(Some)
        .ok_or_else(|| FieldError::new(field, message))
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format(ISO_DATE).to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------- book

pub fn book_rules() -> Rules {
    Rules::new(vec![
        Rule::field("title").trim().escape(),
        Rule::field("author").trim().escape(),
        Rule::field("summary").trim().escape(),
        Rule::field("isbn").trim().escape(),
        Rule::each("genre").trim().escape(),
    ])
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct BookDraft {
    #[validate(length(min = 1, message = "Title must not be empty."))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty."))]
    pub author: String,
    #[validate(length(min = 1, message = "Summary must not be empty."))]
    pub summary: String,
    #[validate(length(min = 1, message = "ISBN must not be empty."))]
    pub isbn: String,
    pub genre: Vec<String>,
}

impl BookDraft {
    pub fn from_record(record: &Record<Book>) -> Self {
        Self {
            title: record.title.clone(),
            author: record.author.to_string(),
            summary: record.summary.clone(),
            isbn: record.isbn.clone(),
            genre: record.genre.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether the genre with `id` is among the selections.
    pub fn selects_genre(&self, id: RecordId) -> bool {
        let id = id.to_string();
        self.genre.iter().any(|selected| *selected == id)
    }
}

impl Draft for BookDraft {
    type Record = Book;

    fn resolve(&self) -> Result<Book, Vec<FieldError>> {
        let mut errors = Vec::new();

        let author = reference("author", &self.author, "Author must be a valid selection.")
            .map_err(|e| errors.push(e))
            .ok();
        let genre: Vec<RecordId> = self
            .genre
            .iter()
            .filter_map(|raw| {
                reference("genre", raw, "Genre selection is invalid.")
                    .map_err(|e| errors.push(e))
                    .ok()
            })
            .collect();

        match author {
            Some(author) if errors.is_empty() => Ok(Book {
                title: self.title.clone(),
                author,
                summary: self.summary.clone(),
                isbn: self.isbn.clone(),
                genre,
            }),
            _ => Err(errors),
        }
    }
}

pub fn book(form: &RawForm) -> Submission<BookDraft> {
    submit(&book_rules(), form, |values| BookDraft {
        title: values.text("title"),
        author: values.text("author"),
        summary: values.text("summary"),
        isbn: values.text("isbn"),
        genre: values.list("genre"),
    })
}

// ---------------------------------------------------------------- book instance

pub fn book_instance_rules() -> Rules {
    Rules::new(vec![
        Rule::field("book").trim().escape(),
        Rule::field("imprint").trim().escape(),
        Rule::field("status").trim().escape(),
        Rule::field("due_back").trim().escape(),
    ])
}

/// Empty (defaults later), or one of the status names.
fn known_status(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || BookStatus::NAMES.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::new("status"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct BookInstanceDraft {
    #[validate(length(min = 1, message = "Book must be specified."))]
    pub book: String,
    #[validate(length(min = 1, message = "Imprint must be specified."))]
    pub imprint: String,
    #[validate(custom(function = "known_status", message = "Invalid status."))]
    pub status: String,
    #[validate(custom(function = "iso_date", message = "Invalid date."))]
    pub due_back: String,
}

impl BookInstanceDraft {
    pub fn from_record(record: &Record<BookInstance>) -> Self {
        Self {
            book: record.book.to_string(),
            imprint: record.imprint.clone(),
            status: record.status.to_string(),
            due_back: format_date(record.due_back),
        }
    }
}

impl Draft for BookInstanceDraft {
    type Record = BookInstance;

    fn resolve(&self) -> Result<BookInstance, Vec<FieldError>> {
        let mut errors = Vec::new();

        let book = reference("book", &self.book, "Book must be a valid selection.")
            .map_err(|e| errors.push(e))
            .ok();
        let status = if self.status.is_empty() {
            Some(BookStatus::default())
        } else {
            self.status
                .parse::<BookStatus>()
                .map_err(|_| errors.push(FieldError::new("status", "Invalid status.")))
                .ok()
        };
        let due_back = optional_date("due_back", &self.due_back, "Invalid date.")
            .map_err(|e| errors.push(e))
            .ok();

        match (book, status, due_back) {
            (Some(book), Some(status), Some(due_back)) => Ok(BookInstance {
                book,
                imprint: self.imprint.clone(),
                status,
                due_back,
            }),
            _ => Err(errors),
        }
    }
}

pub fn book_instance(form: &RawForm) -> Submission<BookInstanceDraft> {
    submit(&book_instance_rules(), form, |values| BookInstanceDraft {
        book: values.text("book"),
        imprint: values.text("imprint"),
        status: values.text("status"),
        due_back: values.text("due_back"),
    })
}

// ---------------------------------------------------------------- author

pub fn author_rules() -> Rules {
    Rules::new(vec![
        Rule::field("first_name").trim().escape(),
        Rule::field("family_name").trim().escape(),
        Rule::field("date_of_birth").trim().escape(),
        Rule::field("date_of_death").trim().escape(),
    ])
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct AuthorDraft {
    #[validate(
        custom(function = "filled", message = "First name must be specified."),
        length(max = 100, message = "First name must not exceed 100 characters.")
    )]
    pub first_name: String,
    #[validate(
        custom(function = "filled", message = "Family name must be specified."),
        length(max = 100, message = "Family name must not exceed 100 characters.")
    )]
    pub family_name: String,
    #[validate(custom(function = "iso_date", message = "Invalid date of birth."))]
    pub date_of_birth: String,
    #[validate(custom(function = "iso_date", message = "Invalid date of death."))]
    pub date_of_death: String,
}

impl AuthorDraft {
    pub fn from_record(record: &Record<Author>) -> Self {
        Self {
            first_name: record.first_name.clone(),
            family_name: record.family_name.clone(),
            date_of_birth: format_date(record.date_of_birth),
            date_of_death: format_date(record.date_of_death),
        }
    }
}

impl Draft for AuthorDraft {
    type Record = Author;

    fn resolve(&self) -> Result<Author, Vec<FieldError>> {
        let mut errors = Vec::new();

        let born = optional_date("date_of_birth", &self.date_of_birth, "Invalid date of birth.")
            .map_err(|e| errors.push(e))
            .ok();
        let died = optional_date("date_of_death", &self.date_of_death, "Invalid date of death.")
            .map_err(|e| errors.push(e))
            .ok();

        match (born, died) {
            (Some(date_of_birth), Some(date_of_death)) => Ok(Author {
                first_name: self.first_name.clone(),
                family_name: self.family_name.clone(),
                date_of_birth,
                date_of_death,
            }),
            _ => Err(errors),
        }
    }
}

pub fn author(form: &RawForm) -> Submission<AuthorDraft> {
    submit(&author_rules(), form, |values| AuthorDraft {
        first_name: values.text("first_name"),
        family_name: values.text("family_name"),
        date_of_birth: values.text("date_of_birth"),
        date_of_death: values.text("date_of_death"),
    })
}

// ---------------------------------------------------------------- genre

pub fn genre_rules() -> Rules {
    Rules::new(vec![Rule::field("name").trim().escape()])
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct GenreDraft {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Genre name must contain between 3 and 100 characters."
    ))]
    pub name: String,
}

impl GenreDraft {
    pub fn from_record(record: &Record<Genre>) -> Self {
        Self {
            name: record.name.clone(),
        }
    }
}

impl Draft for GenreDraft {
    type Record = Genre;

    fn resolve(&self) -> Result<Genre, Vec<FieldError>> {
        Ok(Genre {
            name: self.name.clone(),
        })
    }
}

pub fn genre(form: &RawForm) -> Submission<GenreDraft> {
    submit(&genre_rules(), form, |values| GenreDraft {
        name: values.text("name"),
    })
}

//! Demo catalog loaded at start when `database.seed_demo_data` is set.

use chrono::NaiveDate;

use locallib_db::{DbError, Filter, RecordId};

use super::models::{Author, Book, BookInstance, BookStatus, Genre};
use super::workflow::Catalog;

struct DemoAuthor {
    first_name: &'static str,
    family_name: &'static str,
    born: Option<(i32, u32, u32)>,
    died: Option<(i32, u32, u32)>,
}

const AUTHORS: &[DemoAuthor] = &[
    DemoAuthor { first_name: "Patrick", family_name: "Rothfuss", born: Some((1973, 6, 6)), died: None },
    DemoAuthor { first_name: "Ben", family_name: "Bova", born: Some((1932, 11, 8)), died: None },
    DemoAuthor { first_name: "Isaac", family_name: "Asimov", born: Some((1920, 1, 2)), died: Some((1992, 4, 6)) },
    DemoAuthor { first_name: "Bob", family_name: "Billings", born: None, died: None },
    DemoAuthor { first_name: "Jim", family_name: "Jones", born: Some((1971, 12, 16)), died: None },
];

const GENRES: &[&str] = &["Fantasy", "Science Fiction", "French Poetry"];

/// title, author index, isbn, genre indices
const BOOKS: &[(&str, usize, &str, &[usize])] = &[
    ("The Name of the Wind (The Kingkiller Chronicle, #1)", 0, "9781473211896", &[0]),
    ("The Wise Man's Fear (The Kingkiller Chronicle, #2)", 0, "9788401352836", &[0]),
    ("The Slow Regard of Silent Things (Kingkiller Chronicle)", 0, "9780756411336", &[0]),
    ("Apes and Angels", 1, "9780765379528", &[1]),
    ("Death Wave", 1, "9780765379504", &[1]),
    ("Test Book 1", 4, "ISBN111111", &[0, 1]),
    ("Test Book 2", 4, "ISBN222222", &[]),
];

/// book index, imprint, status, due back
const COPIES: &[(usize, &str, BookStatus, Option<(i32, u32, u32)>)] = &[
    (0, "London Gollancz, 2014.", BookStatus::Available, None),
    (1, "Gollancz, 2011.", BookStatus::Loaned, Some((2020, 6, 6))),
    (2, "Gollancz, 2015.", BookStatus::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", BookStatus::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", BookStatus::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", BookStatus::Available, None),
    (4, "New York, NY Tom Doherty Associates, LLC, 2015.", BookStatus::Available, None),
    (4, "New York, NY Tom Doherty Associates, LLC, 2015.", BookStatus::Maintenance, None),
    (4, "New York, NY Tom Doherty Associates, LLC, 2015.", BookStatus::Loaned, None),
    (0, "Imprint XXX2", BookStatus::Available, None),
    (1, "Imprint XXX3", BookStatus::Available, None),
];

fn date(parts: Option<(i32, u32, u32)>) -> Option<NaiveDate> {
    parts.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

/// Load the demo catalog into an empty store. Returns `false` and leaves the
/// store alone when any author, genre or book is already present.
pub async fn populate(catalog: &Catalog) -> Result<bool, DbError> {
    let all = Filter::all();
    let (author_repo, genre_repo, book_repo) = (catalog.authors(), catalog.genres(), catalog.books());
    let (authors, genres, books) = futures::try_join!(
        author_repo.count(&all),
        genre_repo.count(&all),
        book_repo.count(&all),
    )?;
    if authors + genres + books > 0 {
        tracing::info!(authors, genres, books, "catalog already populated; skipping demo data");
        return Ok(false);
    }

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for author in AUTHORS {
        let id = catalog
            .authors()
            .insert(&Author {
                first_name: author.first_name.to_string(),
                family_name: author.family_name.to_string(),
                date_of_birth: date(author.born),
                date_of_death: date(author.died),
            })
            .await?;
        author_ids.push(id);
    }

    let mut genre_ids = Vec::with_capacity(GENRES.len());
    for name in GENRES {
        genre_ids.push(catalog.genres().insert(&Genre { name: name.to_string() }).await?);
    }

    let mut book_ids: Vec<RecordId> = Vec::with_capacity(BOOKS.len());
    for (title, author, isbn, genres) in BOOKS {
        let id = catalog
            .books()
            .insert(&Book {
                title: title.to_string(),
                author: author_ids[*author],
                summary: format!("Summary of {title}"),
                isbn: isbn.to_string(),
                genre: genres.iter().map(|g| genre_ids[*g]).collect(),
            })
            .await?;
        book_ids.push(id);
    }

    for (book, imprint, status, due_back) in COPIES {
        catalog
            .instances()
            .insert(&BookInstance {
                book: book_ids[*book],
                imprint: imprint.to_string(),
                status: *status,
                due_back: date(*due_back),
            })
            .await?;
    }

    tracing::info!(
        authors = AUTHORS.len(),
        genres = GENRES.len(),
        books = BOOKS.len(),
        copies = COPIES.len(),
        "demo catalog loaded"
    );
    Ok(true)
}

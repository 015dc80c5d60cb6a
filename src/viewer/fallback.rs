use chrono::Utc;

use crate::schema::db::Quote;

const FALLBACK: [(i32, &str, &str, &str, i32); 5] = [
    (
        1,
        "It is our choices, Harry, that show what we truly are, far more than our abilities.",
        "J.K. Rowling",
        "Harry Potter and the Chamber of Secrets",
        12,
    ),
    (
        2,
        "Not all those who wander are lost.",
        "J.R.R. Tolkien",
        "The Lord of the Rings",
        18,
    ),
    (
        3,
        "The only limit to our realization of tomorrow is our doubts of today.",
        "Franklin D. Roosevelt",
        "Looking Forward",
        9,
    ),
    (
        4,
        "So we beat on, boats against the current, borne back ceaselessly into the past.",
        "F. Scott Fitzgerald",
        "The Great Gatsby",
        7,
    ),
    (
        5,
        "Whatever our souls are made of, his and mine are the same.",
        "Emily Brontë",
        "Wuthering Heights",
        5,
    ),
];

/// Built-in quotes shown when the quote service is unreachable or empty.
pub fn fallback_quotes() -> Vec<Quote> {
    let now = Utc::now();
    FALLBACK
        .iter()
        .map(|&(id, text, author, book, likes)| Quote {
            id,
            text: text.to_string(),
            author_name: author.to_string(),
            book_title: book.to_string(),
            likes,
            created_at: now,
        })
        .collect()
}

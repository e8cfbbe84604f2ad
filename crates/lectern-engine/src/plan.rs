//! Work planning: which books are in scope and which cells they yield.

use lectern_core::{model::Book, store::CorpusStore};

use crate::{Error, Result, cell::ChapterCell};

/// Resolve the books a run covers.
///
/// An empty `names` slice selects every active book in canonical order.
/// Naming a book that does not exist (or is inactive) is fatal.
pub async fn books_in_scope<S: CorpusStore>(store: &S, names: &[String]) -> Result<Vec<Book>> {
  if names.is_empty() {
    return store.list_books(false).await.map_err(Error::store);
  }

  let mut books = Vec::with_capacity(names.len());
  for name in names {
    let book = store
      .find_book_by_name(name)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::UnknownBook(name.clone()))?;
    if !books.iter().any(|b: &Book| b.book_id == book.book_id) {
      books.push(book);
    }
  }
  books.sort_by_key(|b| b.order);
  Ok(books)
}

/// Enumerate every active `(book, chapter)` cell in scope.
pub async fn chapter_cells<S: CorpusStore>(store: &S, names: &[String]) -> Result<Vec<ChapterCell>> {
  let mut cells = Vec::new();
  for book in books_in_scope(store, names).await? {
    let chapters = store.list_chapters(book.book_id).await.map_err(Error::store)?;
    cells.extend(chapters.into_iter().map(|chapter| ChapterCell {
      book: book.clone(),
      chapter,
    }));
  }
  Ok(cells)
}

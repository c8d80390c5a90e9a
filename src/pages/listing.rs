//! Shared list machinery for the management pages
//!
//! [`ListController`] owns the fetched rows, the text filter, pagination and
//! the per-row in-flight set used by optimistic mutations. [`ListPage`]
//! wraps it with the remote side: spawned mutation requests, their
//! reconciliation, notices and the session-expiry rule.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::hash::Hash;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::quoter::Notice;
use crate::session::{LogoutReason, Session};

/// A row that can live in a [`ListController`]
pub trait ListRow: Clone + Send + 'static {
    type Key: Clone + Eq + Hash + fmt::Debug + Send + 'static;

    fn key(&self) -> Self::Key;

    /// Text the filter box searches, matched case-insensitively
    fn search_text(&self) -> String;
}

/// Why an optimistic mutation was not started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// The row already has a mutation outstanding
    Busy,
    Missing,
}

/// The row as it was before an optimistic edit, used to undo it
#[derive(Debug, Clone)]
pub struct RowSnapshot<T: ListRow> {
    key: T::Key,
    position: usize,
    previous: T,
}

impl<T: ListRow> RowSnapshot<T> {
    pub fn key(&self) -> &T::Key {
        &self.key
    }
}

pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

pub struct ListController<T: ListRow> {
    items: Vec<T>,
    filter: String,
    predicate: Option<Predicate<T>>,
    page: usize,
    page_size: usize,
    /// Selection within the current page
    selected: usize,
    in_flight: HashSet<T::Key>,
}

impl<T: ListRow> Default for ListController<T> {
    fn default() -> Self {
        Self::new(10)
    }
}

impl<T: ListRow> ListController<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            filter: String::new(),
            predicate: None,
            page: 0,
            page_size: page_size.max(1),
            selected: 0,
            in_flight: HashSet::new(),
        }
    }

    /// Replace the rows after a fetch
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.page = 0;
        self.selected = 0;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|row| &row.key() == key)
    }

    fn position(&self, key: &T::Key) -> Option<usize> {
        self.items.iter().position(|row| &row.key() == key)
    }

    pub fn prepend(&mut self, row: T) {
        self.items.insert(0, row);
    }

    // ─── Filtering ──────────────────────────────────────────────────────────

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page = 0;
        self.selected = 0;
    }

    /// Extra condition on top of the text filter (status selectors)
    pub fn set_predicate(&mut self, predicate: Option<Predicate<T>>) {
        self.predicate = predicate;
        self.page = 0;
        self.selected = 0;
    }

    fn is_visible(&self, row: &T, needle: &str) -> bool {
        if let Some(predicate) = &self.predicate {
            if !predicate(row) {
                return false;
            }
        }
        needle.is_empty() || row.search_text().to_lowercase().contains(needle)
    }

    /// Rows passing the filters, in list order
    pub fn visible(&self) -> Vec<&T> {
        let needle = self.filter.trim().to_lowercase();
        self.items
            .iter()
            .filter(|row| self.is_visible(row, &needle))
            .collect()
    }

    // ─── Pagination ─────────────────────────────────────────────────────────

    pub fn total_pages(&self) -> usize {
        let count = self.visible().len();
        if count == 0 {
            1
        } else {
            count.div_ceil(self.page_size)
        }
    }

    /// 1-indexed for display
    pub fn current_page(&self) -> usize {
        self.page + 1
    }

    pub fn page_rows(&self) -> Vec<&T> {
        self.visible()
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn selected_in_page(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&T> {
        self.page_rows().get(self.selected).copied()
    }

    pub fn selected_key(&self) -> Option<T::Key> {
        self.selected_row().map(ListRow::key)
    }

    pub fn select_next(&mut self) {
        let rows = self.page_rows().len();
        if rows == 0 {
            return;
        }
        if self.selected + 1 < rows {
            self.selected += 1;
        } else if self.page + 1 < self.total_pages() {
            self.page += 1;
            self.selected = 0;
        } else {
            self.page = 0;
            self.selected = 0;
        }
    }

    pub fn select_prev(&mut self) {
        if self.page_rows().is_empty() {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.page = if self.page > 0 {
                self.page - 1
            } else {
                self.total_pages() - 1
            };
            self.selected = self.page_rows().len().saturating_sub(1);
        }
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.total_pages() {
            self.page += 1;
            self.selected = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.selected = 0;
        }
    }

    /// Keep page and selection inside the visible rows after they shrink
    fn clamp(&mut self) {
        let pages = self.total_pages();
        if self.page >= pages {
            self.page = pages - 1;
        }
        let rows = self.page_rows().len();
        if self.selected >= rows {
            self.selected = rows.saturating_sub(1);
        }
    }

    // ─── Optimistic mutations ───────────────────────────────────────────────

    pub fn is_busy(&self, key: &T::Key) -> bool {
        self.in_flight.contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn reserve(&mut self, key: &T::Key) -> Result<usize, Refusal> {
        if self.is_busy(key) {
            return Err(Refusal::Busy);
        }
        let position = self.position(key).ok_or(Refusal::Missing)?;
        self.in_flight.insert(key.clone());
        Ok(position)
    }

    /// Apply `edit` to the row now and mark it in flight
    pub fn begin_edit(
        &mut self,
        key: &T::Key,
        edit: impl FnOnce(&mut T),
    ) -> Result<RowSnapshot<T>, Refusal> {
        let position = self.reserve(key)?;
        let previous = self.items[position].clone();
        edit(&mut self.items[position]);
        Ok(RowSnapshot {
            key: key.clone(),
            position,
            previous,
        })
    }

    /// Take the row out of the list now and mark it in flight
    pub fn begin_removal(&mut self, key: &T::Key) -> Result<RowSnapshot<T>, Refusal> {
        let position = self.reserve(key)?;
        let previous = self.items.remove(position);
        self.clamp();
        Ok(RowSnapshot {
            key: key.clone(),
            position,
            previous,
        })
    }

    /// The server accepted the mutation
    pub fn commit(&mut self, snapshot: &RowSnapshot<T>) {
        self.in_flight.remove(&snapshot.key);
    }

    /// The server refused the mutation: put the row back as it was
    pub fn rollback(&mut self, snapshot: RowSnapshot<T>) {
        self.in_flight.remove(&snapshot.key);
        match self.position(&snapshot.key) {
            Some(position) => self.items[position] = snapshot.previous,
            None => {
                let position = snapshot.position.min(self.items.len());
                self.items.insert(position, snapshot.previous);
            }
        }
        self.clamp();
    }
}

/// A state-changing action waiting for the operator's explicit go-ahead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation<A> {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    action: A,
}

impl<A> Confirmation<A> {
    pub fn new(title: impl Into<String>, message: impl Into<String>, action: A) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Confirmar".to_string(),
            action,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn confirm(self) -> A {
        self.action
    }
}

/// Result of a spawned mutation request
struct Outcome<T: ListRow> {
    snapshot: RowSnapshot<T>,
    failure_title: &'static str,
    result: Result<(), ApiError>,
}

/// List state plus the remote plumbing every management page shares
pub struct ListPage<T: ListRow> {
    list: ListController<T>,
    session: Session,
    cancel: CancellationToken,
    notice: Option<Notice>,
    tx: mpsc::UnboundedSender<Outcome<T>>,
    rx: mpsc::UnboundedReceiver<Outcome<T>>,
    outstanding: usize,
    loaded: bool,
}

impl<T: ListRow> ListPage<T> {
    pub fn new(session: Session, page_size: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            list: ListController::new(page_size),
            session,
            cancel: CancellationToken::new(),
            notice: None,
            tx,
            rx,
            outstanding: 0,
            loaded: false,
        }
    }

    pub fn list(&self) -> &ListController<T> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListController<T> {
        &mut self.list
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Dismiss the current notice. Returns true when it was the
    /// session-expired notice and the caller must leave for the login screen.
    pub fn acknowledge_notice(&mut self) -> bool {
        self.notice
            .take()
            .is_some_and(|notice| notice.is_session_expired())
    }

    /// Apply a fetch result to the list
    pub fn accept_load(&mut self, failure_title: &str, result: Result<Vec<T>, ApiError>) {
        match result {
            Ok(rows) => {
                debug!(count = rows.len(), "list loaded");
                self.list.set_items(rows);
                self.loaded = true;
            }
            Err(err) => self.fail(failure_title, &err),
        }
    }

    /// Route a remote failure. Auth failures end the session.
    pub fn fail(&mut self, title: &str, err: &ApiError) {
        if err.is_cancelled() {
            return;
        }
        if err.is_auth_error() {
            warn!("session rejected by backend");
            self.session.logout(LogoutReason::Expired);
            self.notice = Some(Notice::session_expired());
            return;
        }
        warn!("{}: {}", title, err);
        self.notice = Some(Notice::from_api_error(title, err));
    }

    fn refuse(&mut self, refusal: Refusal) {
        self.notice = Some(match refusal {
            Refusal::Busy => Notice::warning(
                "Operación en Curso",
                "Espere a que termine la operación pendiente sobre este registro.",
            ),
            Refusal::Missing => {
                Notice::warning("Registro no Encontrado", "El registro ya no está en la lista.")
            }
        });
    }

    /// Edit the row optimistically and send `request` in the background.
    /// Returns false when the row is busy or gone.
    pub fn mutate<F>(
        &mut self,
        key: &T::Key,
        failure_title: &'static str,
        edit: impl FnOnce(&mut T),
        request: F,
    ) -> bool
    where
        F: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        match self.list.begin_edit(key, edit) {
            Ok(snapshot) => {
                self.spawn(snapshot, failure_title, request);
                true
            }
            Err(refusal) => {
                self.refuse(refusal);
                false
            }
        }
    }

    /// Remove the row optimistically and send `request` in the background
    pub fn remove<F>(&mut self, key: &T::Key, failure_title: &'static str, request: F) -> bool
    where
        F: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        match self.list.begin_removal(key) {
            Ok(snapshot) => {
                self.spawn(snapshot, failure_title, request);
                true
            }
            Err(refusal) => {
                self.refuse(refusal);
                false
            }
        }
    }

    fn spawn<F>(&mut self, snapshot: RowSnapshot<T>, failure_title: &'static str, request: F)
    where
        F: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        debug!(key = ?snapshot.key, "mutation sent");
        let tx = self.tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let result = request.await;
            let _ = tx.send(Outcome {
                snapshot,
                failure_title,
                result,
            });
        });
    }

    fn reconcile(&mut self, outcome: Outcome<T>) {
        self.outstanding = self.outstanding.saturating_sub(1);
        match outcome.result {
            Ok(()) => self.list.commit(&outcome.snapshot),
            Err(err) => {
                debug!(key = ?outcome.snapshot.key, "mutation rolled back");
                self.list.rollback(outcome.snapshot);
                self.fail(outcome.failure_title, &err);
            }
        }
    }

    /// Reconcile every mutation that has finished, without waiting
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.reconcile(outcome);
        }
    }

    /// Wait until every outstanding mutation has been reconciled
    pub async fn settle(&mut self) {
        while self.outstanding > 0 {
            match self.rx.recv().await {
                Some(outcome) => self.reconcile(outcome),
                None => break,
            }
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

impl<T: ListRow> Drop for ListPage<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signed_in_session;
    use crate::types::Role;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
    }

    impl ListRow for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }

        fn search_text(&self) -> String {
            format!("{} {}", self.id, self.name)
        }
    }

    fn rows(n: u32) -> Vec<Row> {
        (1..=n).map(|id| Row { id, name: "fila" }).collect()
    }

    // ─── Pagination ─────────────────────────────────────────────────────────

    #[test]
    fn test_empty_list_has_one_page() {
        let list: ListController<Row> = ListController::new(5);
        assert_eq!(list.total_pages(), 1);
        assert!(list.selected_row().is_none());
    }

    #[test]
    fn test_pages_follow_page_size() {
        let mut list = ListController::new(3);
        list.set_items(rows(7));

        assert_eq!(list.total_pages(), 3);
        assert_eq!(list.page_rows().len(), 3);
        list.next_page();
        list.next_page();
        assert_eq!(list.current_page(), 3);
        assert_eq!(list.page_rows()[0].id, 7);
        list.next_page();
        assert_eq!(list.current_page(), 3);
    }

    #[test]
    fn test_selection_crosses_pages_and_wraps() {
        let mut list = ListController::new(2);
        list.set_items(rows(3));

        list.select_next();
        list.select_next();
        assert_eq!(list.selected_key(), Some(3));
        list.select_next();
        assert_eq!(list.selected_key(), Some(1));
        list.select_prev();
        assert_eq!(list.selected_key(), Some(3));
    }

    #[test]
    fn test_filter_is_case_insensitive_and_resets_page() {
        let mut list = ListController::new(2);
        list.set_items(vec![
            Row { id: 1, name: "Pérez" },
            Row { id: 2, name: "Gómez" },
            Row { id: 3, name: "PEREYRA" },
        ]);
        list.next_page();

        list.set_filter("pere");
        assert_eq!(list.current_page(), 1);
        let ids: Vec<u32> = list.visible().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3]);

        list.set_filter("");
        list.set_predicate(Some(Box::new(|r: &Row| r.id != 2)));
        assert_eq!(list.visible().len(), 2);
    }

    // ─── Optimistic mutations ───────────────────────────────────────────────

    #[test]
    fn test_busy_row_refuses_second_mutation() {
        let mut list = ListController::new(5);
        list.set_items(rows(2));

        let snapshot = list.begin_edit(&1, |r| r.name = "editado").unwrap();
        assert!(list.is_busy(&1));
        assert_eq!(
            list.begin_edit(&1, |r| r.name = "otra").unwrap_err(),
            Refusal::Busy
        );
        assert!(list.begin_edit(&2, |_| {}).is_ok());

        list.commit(&snapshot);
        assert!(!list.is_busy(&1));
        assert_eq!(list.get(&1).unwrap().name, "editado");
    }

    #[test]
    fn test_rollback_restores_edit_and_removal() {
        let mut list = ListController::new(5);
        list.set_items(rows(3));

        let edit = list.begin_edit(&2, |r| r.name = "editado").unwrap();
        list.rollback(edit);
        assert_eq!(list.get(&2).unwrap().name, "fila");

        let removal = list.begin_removal(&2).unwrap();
        assert!(list.get(&2).is_none());
        list.rollback(removal);
        let ids: Vec<u32> = list.items().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(list.in_flight_count(), 0);
    }

    #[test]
    fn test_missing_row_is_refused() {
        let mut list: ListController<Row> = ListController::new(5);
        assert_eq!(list.begin_removal(&9).unwrap_err(), Refusal::Missing);
    }

    #[test]
    fn test_confirmation_hands_back_action() {
        let confirmation = Confirmation::new("Eliminar", "¿Seguro?", 42u32).with_label("Eliminar");
        assert_eq!(confirmation.confirm_label, "Eliminar");
        assert_eq!(*confirmation.action(), 42);
        assert_eq!(confirmation.confirm(), 42);
    }

    #[tokio::test]
    async fn test_failed_request_rolls_back_with_notice() {
        let mut page = ListPage::new(signed_in_session(Role::Administrator), 5);
        page.accept_load("Error de Carga", Ok(rows(2)));

        assert!(page.mutate(&1, "Error al Guardar", |r| r.name = "nuevo", async {
            Err(ApiError::business(500, "Falla"))
        }));
        assert_eq!(page.list().get(&1).unwrap().name, "nuevo");

        page.settle().await;

        assert_eq!(page.list().get(&1).unwrap().name, "fila");
        assert_eq!(page.notice().unwrap().title, "Error al Guardar");
        assert!(!page.acknowledge_notice());
    }

    #[tokio::test]
    async fn test_auth_failure_expires_session() {
        let session = signed_in_session(Role::Administrator);
        let mut page = ListPage::new(session.clone(), 5);
        page.accept_load("Error de Carga", Ok(rows(1)));

        page.remove(&1, "Error al Eliminar", async { Err(ApiError::unauthorized(None)) });
        page.settle().await;

        assert!(!session.is_authenticated());
        assert_eq!(page.list().items().len(), 1);
        assert!(page.acknowledge_notice());
    }
}

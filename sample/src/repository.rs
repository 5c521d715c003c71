//! Typed CRUD stores.

use crate::error::{Result, SampleError};
use crate::model::{Identified, MyEntity, Record};
use crate::persistence::SessionProvider;
use fibre_bridge::{BoxError, Dependencies, Dependency, Injectable};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Create, read and delete operations over one record type.
pub trait CrudStore<R: Record>: Send + Sync {
  /// Inserts the record, assigning an id, or replaces the stored record with
  /// the same id.
  fn save(&self, record: Identified<R>) -> Result<Identified<R>>;

  fn find_by_id(&self, id: i64) -> Option<Identified<R>>;

  /// Every record, ordered by id.
  fn find_all(&self) -> Vec<Identified<R>>;

  fn delete(&self, id: i64) -> Result<()>;

  fn count(&self) -> usize;
}

/// A `CrudStore` kept in memory, with ids drawn from a session sequence.
pub struct InMemoryCrudStore<R> {
  session: Arc<SessionProvider>,
  sequence: String,
  rows: RwLock<BTreeMap<i64, R>>,
}

impl<R: Record> InMemoryCrudStore<R> {
  pub fn new(session: Arc<SessionProvider>, sequence: impl Into<String>) -> Self {
    Self {
      session,
      sequence: sequence.into(),
      rows: RwLock::new(BTreeMap::new()),
    }
  }

  /// Saves `record` after `check` accepted it against the stored rows.
  ///
  /// The write lock is held from the check to the insert, so no other save
  /// can slip in between.
  pub fn save_checked<F>(&self, record: Identified<R>, check: F) -> Result<Identified<R>>
  where
    F: FnOnce(&Identified<R>, &BTreeMap<i64, R>) -> Result<()>,
  {
    record.validate()?;
    let mut rows = self.rows.write();
    check(&record, &rows)?;

    let id = match record.id() {
      Some(id) => id,
      None => self.session.next_id(&self.sequence),
    };
    let record = record.into_record();
    rows.insert(id, record.clone());
    debug!(sequence = %self.sequence, id, "saved record");
    Ok(Identified::with_id(id, record))
  }
}

impl<R: Record> CrudStore<R> for InMemoryCrudStore<R> {
  fn save(&self, record: Identified<R>) -> Result<Identified<R>> {
    self.save_checked(record, |_, _| Ok(()))
  }

  fn find_by_id(&self, id: i64) -> Option<Identified<R>> {
    self
      .rows
      .read()
      .get(&id)
      .map(|record| Identified::with_id(id, record.clone()))
  }

  fn find_all(&self) -> Vec<Identified<R>> {
    self
      .rows
      .read()
      .iter()
      .map(|(&id, record)| Identified::with_id(id, record.clone()))
      .collect()
  }

  fn delete(&self, id: i64) -> Result<()> {
    self
      .rows
      .write()
      .remove(&id)
      .map(|_| ())
      .ok_or(SampleError::NotFound(id))
  }

  fn count(&self) -> usize {
    self.rows.read().len()
  }
}

/// Store of `MyEntity` records. Emails are unique.
pub struct MyEntityRepository {
  store: InMemoryCrudStore<MyEntity>,
}

impl MyEntityRepository {
  pub fn new(session: Arc<SessionProvider>) -> Self {
    Self {
      store: InMemoryCrudStore::new(session, "my_entity_seq"),
    }
  }

  pub fn find_by_email(&self, email: &str) -> Option<Identified<MyEntity>> {
    self
      .store
      .find_all()
      .into_iter()
      .find(|entity| entity.email() == email)
  }
}

impl CrudStore<MyEntity> for MyEntityRepository {
  fn save(&self, entity: Identified<MyEntity>) -> Result<Identified<MyEntity>> {
    self.store.save_checked(entity, |entity, rows| {
      let taken = rows
        .iter()
        .any(|(&id, stored)| stored.email() == entity.email() && Some(id) != entity.id());
      if taken {
        return Err(SampleError::DuplicateEmail(entity.email().to_string()));
      }
      Ok(())
    })
  }

  fn find_by_id(&self, id: i64) -> Option<Identified<MyEntity>> {
    self.store.find_by_id(id)
  }

  fn find_all(&self) -> Vec<Identified<MyEntity>> {
    self.store.find_all()
  }

  fn delete(&self, id: i64) -> Result<()> {
    self.store.delete(id)
  }

  fn count(&self) -> usize {
    self.store.count()
  }
}

impl Injectable for MyEntityRepository {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<SessionProvider>()]
  }

  fn construct(deps: &Dependencies<'_>) -> std::result::Result<Self, BoxError> {
    Ok(Self::new(deps.get::<SessionProvider>()?))
  }
}

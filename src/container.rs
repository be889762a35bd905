//! Type-keyed dependency container.
//!
//! Values are stored once per type behind an `Arc` and handed out as shared
//! clones. Types that know how to build themselves from other registered
//! values implement [`Inject`] and are constructed on first use by
//! [`Container::make`], then cached like any other entry.
//!
//! ```rust
//! use std::sync::Arc;
//! use mono::{Container, Error, Inject};
//!
//! struct Db { url: String }
//! struct Repo { db: Arc<Db> }
//!
//! impl Inject for Repo {
//!     fn inject(c: &Container) -> Result<Self, Error> {
//!         Ok(Repo { db: c.get::<Db>()? })
//!     }
//! }
//!
//! let c = Container::new();
//! c.insert(Db { url: "sqlite::memory:".into() });
//! let repo = c.make::<Repo>().unwrap();
//! assert_eq!(repo.db.url, "sqlite::memory:");
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Error;

type Entry = Arc<dyn Any + Send + Sync>;

/// Shared, thread-safe registry of application services.
#[derive(Default)]
pub struct Container {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

/// Constructs a value from the container's other entries.
pub trait Inject: Sized + Send + Sync + 'static {
    fn inject(container: &Container) -> Result<Self, Error>;
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value`, replacing any earlier instance of the same type.
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
        self.insert_arc(Arc::new(value));
    }

    pub fn insert_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        self.entries.write().insert(TypeId::of::<T>(), value);
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    /// Returns the registered instance of `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        self.try_get::<T>().ok_or(Error::NotRegistered(type_name::<T>()))
    }

    pub fn try_get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let entry = self.entries.read().get(&TypeId::of::<T>()).cloned()?;
        entry.downcast::<T>().ok()
    }

    /// Returns the registered `T`, building and caching it through
    /// [`Inject`] when absent.
    ///
    /// The lock is not held while `inject` runs, so constructors may resolve
    /// their own dependencies. If two callers race, the first insert wins and
    /// both receive that instance.
    pub fn make<T: Inject>(&self) -> Result<Arc<T>, Error> {
        if let Some(existing) = self.try_get::<T>() {
            return Ok(existing);
        }

        let built: Entry = Arc::new(T::inject(self)?);
        let entry = Arc::clone(
            self.entries.write().entry(TypeId::of::<T>()).or_insert(built),
        );
        entry.downcast::<T>().map_err(|_| Error::NotRegistered(type_name::<T>()))
    }
}

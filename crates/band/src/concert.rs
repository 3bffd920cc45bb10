//! A concert shared by every thread, and one roadie per thread.

use blackcat_core::prelude::*;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The one concert of the evening.
#[derive(Debug)]
pub struct Concert {
    venue: &'static str,
    sold: AtomicU32,
}

impl Concert {
    /// Creates a concert with no tickets sold.
    pub fn new(venue: &'static str) -> Self {
        Self {
            venue,
            sold: AtomicU32::new(0),
        }
    }

    /// Returns the venue.
    pub fn venue(&self) -> &str {
        self.venue
    }

    /// Sells one ticket and returns the number sold so far.
    pub fn sell(&self) -> u32 {
        self.sold.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the number of tickets sold.
    pub fn sold(&self) -> u32 {
        self.sold.load(Ordering::SeqCst)
    }
}

/// Per-thread helper working the shared concert.
#[derive(Default)]
pub struct Roadie {
    concert: Option<Arc<Concert>>,
}

impl Roadie {
    /// Returns the concert this roadie works.
    pub fn concert(&self) -> Option<&Arc<Concert>> {
        self.concert.as_ref()
    }
}

/// Registers the singleton [`Concert`] and the thread-scoped [`Roadie`].
pub struct ConcertModule {
    venue: &'static str,
}

impl ConcertModule {
    /// Creates a module for a concert at `venue`.
    pub fn new(venue: &'static str) -> Self {
        Self { venue }
    }
}

impl Module for ConcertModule {
    fn register(&self, injector: &Injector) -> Result<(), InjectError> {
        let venue = self.venue;
        injector
            .register(Component::new(move || Concert::new(venue)).singleton())?
            .register(
                Component::new(Roadie::default)
                    .thread_scoped()
                    .inject::<Concert, _>("concert", |roadie, concert| {
                        roadie.concert = Some(concert);
                    }),
            )?;
        Ok(())
    }
}

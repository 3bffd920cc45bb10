//! Example band graph wired with blackcat.
//!
//! Guitars, basses and bands are plain structs. Modules describe how to
//! build them and which instruments each band expects.
//!
//! # Component Graph
//!
//! ```text
//! Jazzband  ──▶ Guitar["Stratocaster"], Guitar["LesPaul"] ──┐
//! Bluesband ──▶ Guitar, dyn Instrument["LesPaul"]          ├──▶ Body
//! Metalband ══▶ Guitar["FlyingV"] (singleton, twice)       │
//! Band      ──▶ Bass ─────────────────────────────────────┘
//! ```
//!
//! `Guitar["FlyingV"]` is a singleton: both of the metal band's guitar
//! slots receive the same instance.

mod concert;

pub use concert::{Concert, ConcertModule, Roadie};

use blackcat_core::prelude::*;
use std::sync::Arc;

/// Anything a band member can play.
pub trait Instrument: Send + Sync {
    /// Model name.
    fn model(&self) -> &str;
}

/// Wooden body shared by guitars and basses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    /// Tonewood.
    pub wood: &'static str,
}

impl Default for Body {
    fn default() -> Self {
        Self { wood: "alder" }
    }
}

/// A guitar with an injected body.
#[derive(Debug, Default)]
pub struct Guitar {
    model: String,
    body: Option<Arc<Body>>,
    initialized: bool,
}

impl Guitar {
    /// Creates an unassembled guitar.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Returns the injected body.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_deref()
    }

    /// Returns `true` once the post-construction hook has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Instrument for Guitar {
    fn model(&self) -> &str {
        &self.model
    }
}

/// A bass with an injected body.
#[derive(Debug, Default)]
pub struct Bass {
    body: Option<Arc<Body>>,
}

impl Bass {
    /// Returns the injected body.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_deref()
    }
}

impl Instrument for Bass {
    fn model(&self) -> &str {
        "Precision"
    }
}

/// A rhythm section: just a bass.
#[derive(Default)]
pub struct Band {
    /// The bass player's instrument.
    pub bass: Option<Arc<Bass>>,
}

/// Two named guitars.
#[derive(Default)]
pub struct Jazzband {
    /// `Guitar["Stratocaster"]`.
    pub rhythm_guitar: Option<Arc<Guitar>>,
    /// `Guitar["LesPaul"]`.
    pub lead_guitar: Option<Arc<Guitar>>,
}

/// An unnamed rhythm guitar and a named lead.
#[derive(Default)]
pub struct Bluesband {
    /// The unnamed `Guitar`.
    pub rhythm_guitar: Option<Arc<Guitar>>,
    /// Any instrument registered as `"LesPaul"`.
    pub lead_guitar: Option<Arc<dyn Instrument>>,
}

/// Two slots filled by the same singleton guitar.
#[derive(Default)]
pub struct Metalband {
    /// `Guitar["FlyingV"]`.
    pub rhythm_guitar: Option<Arc<Guitar>>,
    /// `Guitar["FlyingV"]`, again.
    pub lead_guitar: Option<Arc<Guitar>>,
}

/// Builds the registration for a guitar of the given model.
pub fn guitar(model: &'static str) -> Component<Guitar> {
    Component::new(move || Guitar::new(model))
        .inject::<Body, _>("body", |guitar, body| guitar.body = Some(body))
        .post_construct(|guitar| guitar.initialized = true)
        .provides::<dyn Instrument, _>(|guitar| guitar as Arc<dyn Instrument>)
}

// ─────────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────────

/// Bodies, basses and guitars.
pub struct InstrumentModule;

impl Module for InstrumentModule {
    fn register(&self, injector: &Injector) -> Result<(), InjectError> {
        injector
            .register(Component::new(Body::default))?
            .register(
                Component::new(Bass::default)
                    .inject::<Body, _>("body", |bass, body| bass.body = Some(body))
                    .provides::<dyn Instrument, _>(|bass| bass as Arc<dyn Instrument>),
            )?
            .register(guitar("Telecaster"))?
            .register(guitar("LesPaul").named("LesPaul"))?
            .register(guitar("Stratocaster").named("Stratocaster"))?
            .register(guitar("FlyingV").named("FlyingV").singleton())?;
        Ok(())
    }
}

/// The bands playing tonight.
pub struct BandModule;

impl Module for BandModule {
    fn register(&self, injector: &Injector) -> Result<(), InjectError> {
        injector
            .register(
                Component::new(Band::default)
                    .inject::<Bass, _>("bass", |band, bass| band.bass = Some(bass)),
            )?
            .register(
                Component::new(Jazzband::default)
                    .inject_named::<Guitar, _>("rhythm_guitar", "Stratocaster", |band, guitar| {
                        band.rhythm_guitar = Some(guitar);
                    })
                    .inject_named::<Guitar, _>("lead_guitar", "LesPaul", |band, guitar| {
                        band.lead_guitar = Some(guitar);
                    }),
            )?
            .register(
                Component::new(Bluesband::default)
                    .inject::<Guitar, _>("rhythm_guitar", |band, guitar| {
                        band.rhythm_guitar = Some(guitar);
                    })
                    .inject_named::<dyn Instrument, _>("lead_guitar", "LesPaul", |band, guitar| {
                        band.lead_guitar = Some(guitar);
                    }),
            )?
            .register(
                Component::new(Metalband::default)
                    .inject_named::<Guitar, _>("rhythm_guitar", "FlyingV", |band, guitar| {
                        band.rhythm_guitar = Some(guitar);
                    })
                    .inject_named::<Guitar, _>("lead_guitar", "FlyingV", |band, guitar| {
                        band.lead_guitar = Some(guitar);
                    }),
            )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injector() -> Injector {
        let injector = Injector::new();
        injector.install((InstrumentModule, BandModule)).unwrap();
        injector
    }

    #[test]
    fn graph_is_valid() {
        assert!(injector().validate().is_ok());
    }

    #[test]
    fn band_bass_has_body() {
        let band = injector().resolve::<Band>().unwrap();
        let bass = band.bass.as_ref().unwrap();
        assert_eq!(bass.body(), Some(&Body::default()));
    }

    #[test]
    fn jazzband_gets_named_guitars() {
        let band = injector().resolve::<Jazzband>().unwrap();
        let rhythm = band.rhythm_guitar.as_ref().unwrap();
        let lead = band.lead_guitar.as_ref().unwrap();
        assert_eq!(rhythm.model(), "Stratocaster");
        assert_eq!(lead.model(), "LesPaul");
        assert!(rhythm.is_initialized() && lead.is_initialized());
    }

    #[test]
    fn bluesband_mixes_unnamed_and_named() {
        let band = injector().resolve::<Bluesband>().unwrap();
        assert_eq!(band.rhythm_guitar.as_ref().unwrap().model(), "Telecaster");
        assert_eq!(band.lead_guitar.as_ref().unwrap().model(), "LesPaul");
    }

    #[test]
    fn metalband_shares_one_guitar() {
        let injector = injector();
        let first = injector.resolve::<Metalband>().unwrap();
        let second = injector.resolve::<Metalband>().unwrap();

        let rhythm = first.rhythm_guitar.as_ref().unwrap();
        assert!(Arc::ptr_eq(rhythm, first.lead_guitar.as_ref().unwrap()));
        assert!(Arc::ptr_eq(rhythm, second.rhythm_guitar.as_ref().unwrap()));
    }

    #[test]
    fn unnamed_instrument_is_ambiguous() {
        // Bass and the unnamed Telecaster both provide `dyn Instrument`.
        let err = injector().resolve::<dyn Instrument>().err().unwrap();
        assert!(matches!(err, InjectError::AmbiguousComponent { .. }));
    }
}

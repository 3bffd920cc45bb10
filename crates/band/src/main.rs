//! Band demo CLI.
//!
//! Wires the band graph, validates it, resolves every band and lets a few
//! threads sell tickets for the shared concert.
//!
//! # Usage
//!
//! ```bash
//! band [filter]
//! ```
//!
//! # Example
//!
//! ```bash
//! band "info,blackcat_core=debug"
//! ```

use band::{
    Band, BandModule, Bluesband, Concert, ConcertModule, Instrument, InstrumentModule, Jazzband,
    Metalband, Roadie,
};
use blackcat_core::prelude::*;
use blackcat_tracing::{TracingFormat, TracingModule};
use std::process::ExitCode;
use std::sync::Arc;

const ROADIES: usize = 4;

fn main() -> ExitCode {
    let filter = std::env::args().nth(1).unwrap_or_else(|| "info".to_owned());

    let injector = Arc::new(Injector::new().with_debug(true));
    let installed = injector.install((
        TracingModule::new()
            .with_format(TracingFormat::Compact)
            .with_env_filter(filter),
        InstrumentModule,
        BandModule,
        ConcertModule::new("Fillmore"),
    ));
    if let Err(e) = installed {
        tracing::error!(error = %e, "registration failed");
        return ExitCode::FAILURE;
    }

    if let Err(errors) = injector.validate() {
        for e in &errors {
            tracing::error!(error = %e, "invalid component graph");
        }
        return ExitCode::FAILURE;
    }

    match play(&injector) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "resolution failed");
            ExitCode::FAILURE
        }
    }
}

fn play(injector: &Arc<Injector>) -> Result<(), InjectError> {
    let band = injector.resolve::<Band>()?;
    let wood = band.bass.as_ref().and_then(|bass| bass.body()).map(|body| body.wood);
    tracing::info!(?wood, "band ready");

    let jazz = injector.resolve::<Jazzband>()?;
    tracing::info!(
        rhythm = jazz.rhythm_guitar.as_ref().map(|g| g.model()),
        lead = jazz.lead_guitar.as_ref().map(|g| g.model()),
        "jazzband ready"
    );

    let blues = injector.resolve::<Bluesband>()?;
    tracing::info!(
        rhythm = blues.rhythm_guitar.as_ref().map(|g| g.model()),
        lead = blues.lead_guitar.as_ref().map(|g| g.model()),
        "bluesband ready"
    );

    let metal = injector.resolve::<Metalband>()?;
    let shared = match (&metal.rhythm_guitar, &metal.lead_guitar) {
        (Some(rhythm), Some(lead)) => Arc::ptr_eq(rhythm, lead),
        _ => false,
    };
    tracing::info!(shared, "metalband ready");

    let handles: Vec<_> = (0..ROADIES)
        .map(|_| {
            let injector = Arc::clone(injector);
            std::thread::spawn(move || -> Result<u32, InjectError> {
                let roadie = injector.resolve::<Roadie>()?;
                Ok(roadie.concert().map_or(0, |concert| concert.sell()))
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok(result) => {
                let sold = result?;
                tracing::info!(sold, "ticket sold");
            }
            Err(_) => tracing::error!("roadie thread panicked"),
        }
    }

    let concert = injector.resolve::<Concert>()?;
    tracing::info!(venue = concert.venue(), sold = concert.sold(), "doors open");
    Ok(())
}

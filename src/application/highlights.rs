// Highlights assembly - detected rows plus raw fields and fitted velocities
use crate::application::event_detector::{EventDetector, VelocityPoint};
use crate::domain::error::AnalysisResult;
use crate::domain::event::{Event, EventKind, Highlights};

/// Builds the highlights of one flight in canonical event order.
///
/// Events that were not found are left out. A degenerate velocity fit also counts as not
/// found; every other error is returned to the caller.
pub fn assemble_highlights(detector: &EventDetector<'_>) -> AnalysisResult<Highlights> {
    let store = detector.store();
    let mut highlights = Highlights::new();

    for kind in EventKind::CANONICAL_ORDER {
        let event = match kind {
            EventKind::Launch => plain(detector.launch()),
            EventKind::ThrustMax => plain(detector.thrust_max()),
            EventKind::SecondStageIgnition => plain(detector.second_stage_ignition()),
            EventKind::ThrustEnd => plain(detector.thrust_end()),
            EventKind::MaxVelocity => {
                fitted(kind, detector.max_velocity())?.map(|p| (p.row, Some(p.velocity)))
            }
            EventKind::Apogee => plain(detector.apogee()),
            EventKind::Deploy => plain(detector.deploy()),
            EventKind::Land => match detector.land() {
                Some(row) => Some((
                    row,
                    fitted(kind, detector.land_velocity())?.map(|p| p.velocity),
                )),
                None => None,
            },
        };

        let Some((row, velocity)) = event else {
            tracing::debug!("{} not found", kind);
            continue;
        };

        let mut event = Event::new(kind, store.sample(row)?);
        if let Some(velocity) = velocity {
            event = event.with_velocity(velocity);
        }
        highlights.insert(event);
    }

    Ok(highlights)
}

fn plain(row: Option<usize>) -> Option<(usize, Option<f64>)> {
    row.map(|r| (r, None))
}

/// Maps a degenerate fit to "not found" and keeps other errors.
fn fitted(
    kind: EventKind,
    result: AnalysisResult<Option<VelocityPoint>>,
) -> AnalysisResult<Option<VelocityPoint>> {
    match result {
        Err(e) if e.is_degenerate_fit() => {
            tracing::warn!("{} velocity unavailable: {}", kind, e);
            Ok(None)
        }
        other => other,
    }
}

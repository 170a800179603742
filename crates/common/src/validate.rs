//! Trip validation and gap filling

use tracing::debug;

use crate::catalog::RouteCatalog;
use crate::random::Randomizer;
use crate::types::{ResolvedTrip, TripRequest, ValidatedRequest};
use crate::{Error, Result};
use rand::RngCore;

/// Check the supplied fields of a request against the catalog.
///
/// Rules are applied in order and the first one that fires wins:
/// unknown origin, then a different destination the origin does not serve,
/// then identical cities. Unset fields are left for [`resolve`].
pub fn validate(catalog: &RouteCatalog, request: &TripRequest) -> Result<ValidatedRequest> {
    if let Some(origin) = &request.origin {
        if !catalog.is_valid_origin(origin) {
            return Err(Error::InvalidOrigin(origin.clone()));
        }
    }

    if let (Some(origin), Some(destination)) = (&request.origin, &request.destination) {
        // An origin never serves itself, so a repeated city is reported as
        // such once the origin alone has been accepted.
        let destinations = catalog.valid_destinations(origin)?;
        if origin != destination && !destinations.contains(destination) {
            return Err(Error::InvalidDestination {
                origin: origin.clone(),
                destination: destination.clone(),
            });
        }
        if origin == destination {
            return Err(Error::SameCity(origin.clone()));
        }
    }

    Ok(ValidatedRequest {
        origin: request.origin.clone(),
        destination: request.destination.clone(),
        flight_index: request.flight_index,
    })
}

/// Fill unset cities from the randomizer and re-check the final pair.
pub fn resolve<R: RngCore>(
    catalog: &RouteCatalog,
    request: ValidatedRequest,
    random: &mut Randomizer<R>,
) -> Result<ResolvedTrip> {
    let origin = match (request.origin, &request.destination) {
        (Some(origin), _) => origin,
        (None, Some(destination)) => {
            let serving = catalog.origins_serving(destination);
            if serving.is_empty() {
                return Err(Error::InvalidDestination {
                    origin: "<any>".to_string(),
                    destination: destination.clone(),
                });
            }
            (*random.pick(&serving)?).clone()
        }
        (None, None) => random.pick(catalog.origins())?.clone(),
    };

    let destination = match request.destination {
        Some(destination) => destination,
        None => random.pick(catalog.valid_destinations(&origin)?)?.clone(),
    };

    let trip = check_resolved(catalog, origin, destination)?;
    debug!("Resolved trip {}", trip);
    Ok(trip)
}

/// Final invariant check on a resolved pair
pub fn check_resolved(catalog: &RouteCatalog, origin: String, destination: String) -> Result<ResolvedTrip> {
    if origin == destination {
        return Err(Error::SameCity(origin));
    }
    if !catalog.valid_destinations(&origin)?.contains(&destination) {
        return Err(Error::InvalidDestination { origin, destination });
    }
    Ok(ResolvedTrip { origin, destination })
}

/// Pick the 1-based flight to book out of `total` listed rows.
///
/// A requested index must lie in `1..=total`; without one the flight is drawn
/// uniformly from the whole listing.
pub fn select_flight<R: RngCore>(
    requested: Option<usize>,
    total: usize,
    random: &mut Randomizer<R>,
) -> Result<usize> {
    if total == 0 {
        return Err(Error::NoFlightsAvailable);
    }
    match requested {
        Some(index) if (1..=total).contains(&index) => Ok(index),
        Some(index) => Err(Error::InvalidFlightIndex { index, total }),
        None => Ok(random.pick_index(total)? + 1),
    }
}

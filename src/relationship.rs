// Boat <-> Load relationship management.
//
// The link is bidirectional but lives in two independently stored documents,
// and the store gives single-document atomicity only. Every operation here
// writes the Boat first and the Load second: if the second write fails the
// Boat side is the authoritative record of the relationship and the Load is
// left pointing nowhere, which a later unlink or delete repairs. The
// inconsistency window is accepted and documented, not hidden.
//
// There is also no isolation between concurrent calls: two `link` calls
// racing on the same load can both pass the carrier check, last write wins.
// Fixing that needs optimistic concurrency tokens or real transactions;
// neither is provided by the backing store.
use crate::datastore::{Datastore, DatastoreError, Key, Kind};
use crate::models::{Boat, Load, ModelError};

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("The specified boat and load does not exist")]
    MissingBoth,
    #[error("The specified boat does not exist")]
    MissingBoat,
    #[error("The specified load does not exist")]
    MissingLoad,
    #[error("The specified load has already been assigned to this boat.")]
    AlreadyOnThisBoat,
    #[error("The specified load has already been assigned to another boat.")]
    AlreadyOnAnotherBoat,
    #[error("The specified load is not on this boat.")]
    NotOnThisBoat,
    #[error("You do not own this boat.")]
    NotOwner,
    #[error(transparent)]
    Store(#[from] DatastoreError),
    #[error(transparent)]
    BadDocument(#[from] ModelError),
}

/// Per-load outcome of a best-effort cascade.
#[derive(Debug, Default)]
pub struct CascadeReport {
    pub cleared: usize,
    pub failures: Vec<(Key, String)>,
}

async fn fetch_pair(
    store: &dyn Datastore,
    boat_key: Key,
    load_key: Key,
) -> Result<(Boat, Load), LinkError> {
    let boat = store.get(&boat_key).await?;
    let load = store.get(&load_key).await?;

    match (boat, load) {
        (None, None) => Err(LinkError::MissingBoth),
        (None, Some(_)) => Err(LinkError::MissingBoat),
        (Some(_), None) => Err(LinkError::MissingLoad),
        (Some(b), Some(l)) => Ok((Boat::from_entity(&b)?, Load::from_entity(&l)?)),
    }
}

/// Assigns `load_key` to `boat_key` on behalf of `requester`.
pub async fn link(
    store: &dyn Datastore,
    boat_key: Key,
    load_key: Key,
    requester: &str,
) -> Result<(), LinkError> {
    let (mut boat, mut load) = fetch_pair(store, boat_key, load_key).await?;

    if let Some(carrier) = load.carrier {
        return Err(if carrier.same_entity(&boat_key) {
            LinkError::AlreadyOnThisBoat
        } else {
            LinkError::AlreadyOnAnotherBoat
        });
    }
    if boat.owner != requester {
        return Err(LinkError::NotOwner);
    }

    // Boat first, then Load; not atomic across the two documents.
    boat.loads.push(load_key);
    store.update(&boat_key, boat.to_doc()).await?;

    load.carrier = Some(boat_key);
    store.update(&load_key, load.to_doc()).await?;

    Ok(())
}

/// Removes `load_key` from `boat_key` on behalf of `requester`. The load
/// must currently be on that exact boat, compared by key identity.
pub async fn unlink(
    store: &dyn Datastore,
    boat_key: Key,
    load_key: Key,
    requester: &str,
) -> Result<(), LinkError> {
    let (mut boat, mut load) = fetch_pair(store, boat_key, load_key).await?;

    match load.carrier {
        Some(carrier) if carrier.same_entity(&boat_key) => {}
        _ => return Err(LinkError::NotOnThisBoat),
    }
    if boat.owner != requester {
        return Err(LinkError::NotOwner);
    }

    boat.loads.retain(|k| !k.same_entity(&load_key));
    store.update(&boat_key, boat.to_doc()).await?;

    load.carrier = None;
    store.update(&load_key, load.to_doc()).await?;

    Ok(())
}

/// Clears the carrier on every load the boat references, used when the boat
/// is deleted. Each per-load update is independent; one failure does not
/// stop the others, and every failure ends up in the report.
pub async fn cascade_unlink_all(store: &dyn Datastore, boat: &Boat) -> CascadeReport {
    let mut report = CascadeReport::default();

    for load_key in &boat.loads {
        match clear_carrier(store, load_key).await {
            Ok(()) => report.cleared += 1,
            Err(e) => {
                tracing::error!(load_id = load_key.id, error = %e, "cascade unlink failed");
                report.failures.push((*load_key, e.to_string()));
            }
        }
    }

    report
}

async fn clear_carrier(store: &dyn Datastore, load_key: &Key) -> Result<(), LinkError> {
    let Some(entity) = store.get(load_key).await? else {
        // Already gone; nothing left to repair.
        return Ok(());
    };
    let mut load = Load::from_entity(&entity)?;
    load.carrier = None;
    store.update(load_key, load.to_doc()).await?;
    Ok(())
}

/// Removes a load from its carrier's `loads` sequence, used when the load
/// itself is deleted. A dangling or absent carrier is treated as already
/// detached.
pub async fn detach_from_carrier(store: &dyn Datastore, load: &Load) -> Result<(), LinkError> {
    let Some(carrier_key) = load.carrier else {
        return Ok(());
    };
    let Some(entity) = store.get(&carrier_key).await? else {
        return Ok(());
    };
    let Some(load_key) = load.key else {
        return Ok(());
    };

    let mut boat = Boat::from_entity(&entity)?;
    boat.loads.retain(|k| !k.same_entity(&load_key));
    store.update(&carrier_key, boat.to_doc()).await?;
    Ok(())
}

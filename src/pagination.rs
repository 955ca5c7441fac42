// Page-number pagination over the document store.
//
// "Has next page" is decided by a second lookahead query for the following
// window, not by the store's own continuation metadata: the backend we wrap
// always reports more-results-after-limit even on the last page (see
// https://github.com/googleapis/google-cloud-datastore/issues/130). The
// lookahead doubles query cost but gives a correct answer.
use crate::datastore::{Datastore, DatastoreError, Entity, Query};

/// One result window plus whether a following non-empty window exists.
#[derive(Debug)]
pub struct Page {
    pub entities: Vec<Entity>,
    pub has_next: bool,
}

/// Clamps an optional 1-based page-number parameter. Absent or unparseable
/// input means page 1.
pub fn page_number(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.parse::<u32>().ok()).filter(|p| *p >= 1).unwrap_or(1)
}

/// Runs `base` bounded to the given window. `page` is 1-based; the offset is
/// `page_size * (page - 1)`. Page 0 clamps to the first window.
pub async fn paginate(
    store: &dyn Datastore,
    base: &Query,
    page: u32,
    page_size: usize,
) -> Result<Page, DatastoreError> {
    let offset = page_size * (page as usize).saturating_sub(1);

    let window = base.clone().offset(offset).limit(page_size);
    let entities = store.run_query(&window).await?;

    let lookahead = base.clone().offset(offset + page_size).limit(page_size);
    let has_next = !store.run_query(&lookahead).await?.is_empty();

    Ok(Page { entities, has_next })
}

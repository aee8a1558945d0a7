use std::sync::Arc;

use ahash::AHashMap;

use crate::error::Result;
use crate::params::SelectParam;
use crate::worker::Worker;

use super::builder::build_elem;
use super::collect::collect_caps;
use super::elem::SelectElem;

/// Cache of selection results, keyed by the packed parameter word.
///
/// A one-entry MRU hint sits above the map for the send fast path. The
/// hint is dropped before any map mutation and repopulated only from a
/// completed lookup, so a fast-path hit always refers to an element the
/// map currently owns.
///
/// Not safe against concurrent writers; callers that share a `ProtoSelect`
/// across threads wrap it in their own lock and treat `lookup_slow` (and
/// the hint it maintains) as a write.
#[derive(Default)]
pub struct ProtoSelect {
    elems: AHashMap<u64, Arc<SelectElem>>,
    cache: Option<(u64, Arc<SelectElem>)>,
}

impl ProtoSelect {
    pub fn new() -> Self {
        Self::default()
    }

    /// MRU-only lookup for the send fast path.
    #[inline]
    pub fn lookup_fast(&self, param: &SelectParam) -> Option<Arc<SelectElem>> {
        match &self.cache {
            Some((key, elem)) if *key == param.key() => Some(Arc::clone(elem)),
            _ => None,
        }
    }

    /// Full lookup: return the cached element for `param` or run capability
    /// collection and threshold construction to create one. On failure
    /// nothing is installed and the MRU hint stays empty.
    pub fn lookup_slow(
        &mut self,
        worker: &Worker,
        ep_cfg_index: usize,
        rkey_cfg_index: usize,
        param: &SelectParam,
    ) -> Result<Arc<SelectElem>> {
        let key = param.key();
        if let Some(elem) = self.elems.get(&key) {
            let elem = Arc::clone(elem);
            self.cache = Some((key, Arc::clone(&elem)));
            return Ok(elem);
        }

        // The insert below may rehash; the hint must not outlive that.
        self.cache = None;

        let init = collect_caps(worker, ep_cfg_index, rkey_cfg_index, *param)?;
        let elem = Arc::new(build_elem(init, *param)?);
        self.elems.insert(key, Arc::clone(&elem));
        self.cache = Some((key, Arc::clone(&elem)));
        Ok(elem)
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Cached elements in unspecified order.
    pub fn elems(&self) -> impl Iterator<Item = &Arc<SelectElem>> {
        self.elems.values()
    }
}

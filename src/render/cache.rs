use crate::foundation::error::{VgirError, VgirResult};
use crate::render::tree::NodeUid;
use smallvec::SmallVec;

pub const DEFAULT_UNUSED_CYCLE_THRESHOLD: u32 = 8;

/// Picture cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheOpts {
    /// Consecutive unused passes after which an entry is evicted.
    pub unused_cycle_threshold: u32,
}

impl Default for CacheOpts {
    fn default() -> Self {
        Self {
            unused_cycle_threshold: DEFAULT_UNUSED_CYCLE_THRESHOLD,
        }
    }
}

impl CacheOpts {
    pub fn validate(&self) -> VgirResult<()> {
        if self.unused_cycle_threshold == 0 {
            return Err(VgirError::argument(
                "cache unused_cycle_threshold must be >= 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Painter as seen by a cache lookup: its identity and whether it must be repainted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMember {
    pub uid: NodeUid,
    pub dirty: bool,
}

/// One rasterized run of consecutive painters.
#[derive(Debug, Clone)]
pub struct ComplexPicture<P> {
    picture: P,
    painters: SmallVec<[NodeUid; 4]>,
    unused_cycles: u32,
    used_this_frame: bool,
}

impl<P> ComplexPicture<P> {
    pub fn picture(&self) -> &P {
        &self.picture
    }

    /// Contributing painter identities in paint order.
    pub fn painters(&self) -> &[NodeUid] {
        &self.painters
    }

    pub fn unused_cycles(&self) -> u32 {
        self.unused_cycles
    }

    pub fn used_this_frame(&self) -> bool {
        self.used_this_frame
    }

    fn matches(&self, run: &[RunMember]) -> bool {
        self.painters.len() == run.len()
            && self
                .painters
                .iter()
                .zip(run)
                .all(|(uid, m)| *uid == m.uid && !m.dirty)
    }

    fn same_sequence(&self, run: &[RunMember]) -> bool {
        self.painters.len() == run.len()
            && self.painters.iter().zip(run).all(|(uid, m)| *uid == m.uid)
    }

    fn mark_used(&mut self) {
        self.unused_cycles = 0;
        self.used_this_frame = true;
    }
}

/// Cross-frame cache of [`ComplexPicture`]s.
///
/// Owned by whoever drives successive linearization passes. Entries are looked up by exact
/// painter sequence and aged by [`LinearizationContext::checkpoint`].
#[derive(Debug)]
pub struct LinearizationContext<P> {
    entries: Vec<ComplexPicture<P>>,
    opts: CacheOpts,
    stats: CacheStats,
}

impl<P> Default for LinearizationContext<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            opts: CacheOpts::default(),
            stats: CacheStats::default(),
        }
    }
}

impl<P: Clone> LinearizationContext<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opts(opts: CacheOpts) -> VgirResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            ..Self::default()
        })
    }

    pub fn opts(&self) -> CacheOpts {
        self.opts
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ComplexPicture<P>> {
        self.entries.iter()
    }

    /// Returns the cached picture for `run` and marks it used this frame.
    ///
    /// A run with any dirty painter never hits.
    pub fn find(&mut self, run: &[RunMember]) -> Option<P> {
        match self.entries.iter_mut().find(|e| e.matches(run)) {
            Some(entry) => {
                entry.mark_used();
                self.stats.hits += 1;
                Some(entry.picture.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Stores a freshly rasterized picture for `run`.
    ///
    /// An entry with the same painter sequence is replaced. The new entry counts as used in the
    /// current frame.
    pub fn insert(&mut self, picture: P, run: &[RunMember]) {
        let entry = ComplexPicture {
            picture,
            painters: run.iter().map(|m| m.uid).collect(),
            unused_cycles: 0,
            used_this_frame: true,
        };
        match self.entries.iter_mut().find(|e| e.same_sequence(run)) {
            Some(stale) => {
                tracing::debug!(painters = run.len(), "replacing stale complex picture");
                *stale = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Ages every entry by one pass and evicts the expired ones.
    ///
    /// Entries not used since the previous checkpoint gain one unused cycle. Entries reaching
    /// the threshold are dropped. Returns the number of evicted entries.
    pub fn checkpoint(&mut self) -> usize {
        let threshold = self.opts.unused_cycle_threshold;
        let before = self.entries.len();
        self.entries.retain_mut(|e| {
            if !e.used_this_frame {
                e.unused_cycles += 1;
            }
            e.used_this_frame = false;
            e.unused_cycles < threshold
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.entries.len(), "evicted complex pictures");
        }
        self.stats.evictions += evicted as u64;
        evicted
    }

    /// Drops every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cache.rs"]
mod tests;

//! Redeclaration chains across module files.
//!
//! A chain can start in one module and continue in any module loaded after
//! it, so neither end of it is known while a single record is read. A
//! loaded redeclaration points at the first declaration of its chain until
//! its real predecessor is loaded; the reader queues that predecessor here
//! instead of loading it inside the current record, so a long chain costs
//! a loop, not a recursion. Once the outermost load finishes,
//! [`RedeclarationChainResolver::finish`] picks the latest declaration of
//! every touched chain and hands shared state (class definition data,
//! template state) to the declarations that were loaded without it.
//!
//! "Latest" is decided by [`recency_key`]: a declaration created in the
//! current translation beats any loaded one, and among loaded ones the
//! greater global ID wins, which is load order first and declaration order
//! within a module second.

use cx_ir::decl::{DeclData, RedeclLink};
use cx_ir::{AstContext, DeclId, Redeclarable};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{Result, SerializationError};

/// Order of declarations within a chain, greatest is most recent.
pub fn recency_key(ctx: &AstContext, decl: DeclId) -> u64 {
    match ctx.decl(decl).origin {
        Some(global) => u64::from(global.raw()),
        None => (1u64 << 32) + u64::from(decl.raw()),
    }
}

/// Shared chain state a loaded declaration still has to pick up from the
/// rest of its chain.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ForwardRef {
    /// A class declaration that may lack the definition data of its class.
    DefinitionData(DeclId),
    /// A template declaration that may lack the chain's shared state.
    TemplateCommon(DeclId),
}

/// A redeclaration linked to its chain's first declaration while its real
/// predecessor waits to be loaded.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PendingPrevious {
    pub decl: DeclId,
    pub first: DeclId,
    /// Global ID of the predecessor.
    pub prev: u32,
}

#[derive(Debug, Default)]
pub struct RedeclarationChainResolver {
    /// First declaration and the global ID of a redeclaration still to
    /// load.
    pending: Vec<(DeclId, u32)>,
    pending_previous: Vec<PendingPrevious>,
    candidates: FxHashMap<DeclId, SmallVec<[DeclId; 2]>>,
    forward_refs: Vec<ForwardRef>,
}

impl RedeclarationChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a loaded redeclaration `decl` to its predecessor `prev` in
    /// the chain starting at `first`.
    pub fn link_previous(
        &mut self,
        ctx: &mut AstContext,
        decl: DeclId,
        first: DeclId,
        prev: DeclId,
    ) -> Result<()> {
        check_same_class(ctx, decl, first)?;
        check_same_class(ctx, decl, prev)?;
        ctx.decl_mut(decl).redecl = Some(Redeclarable {
            first,
            link: RedeclLink::Previous(prev),
        });
        self.note_candidate(first, decl);
        Ok(())
    }

    /// Link `decl` to `first` for now and queue its predecessor, known
    /// only by global ID, for loading after the current record.
    pub fn defer_previous(
        &mut self,
        ctx: &mut AstContext,
        decl: DeclId,
        first: DeclId,
        prev: u32,
    ) -> Result<()> {
        self.link_previous(ctx, decl, first, first)?;
        self.pending_previous.push(PendingPrevious { decl, first, prev });
        Ok(())
    }

    /// Predecessors queued since the last call.
    pub fn take_pending_previous(&mut self) -> Vec<PendingPrevious> {
        std::mem::take(&mut self.pending_previous)
    }

    /// Queue a later redeclaration of `first`, known only by its global
    /// ID, for loading.
    pub fn queue_latest(&mut self, first: DeclId, global: u32) {
        self.pending.push((first, global));
    }

    pub fn queue_forward(&mut self, r: ForwardRef) {
        self.forward_refs.push(r);
    }

    /// Redeclarations queued since the last call.
    pub fn take_pending(&mut self) -> Vec<(DeclId, u32)> {
        std::mem::take(&mut self.pending)
    }

    pub fn note_candidate(&mut self, first: DeclId, candidate: DeclId) {
        let list = self.candidates.entry(first).or_default();
        if !list.contains(&candidate) {
            list.push(candidate);
        }
    }

    /// Whether redeclarations or predecessors still wait to be loaded.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.pending_previous.is_empty()
    }

    /// Whether any chain or forward reference still waits for `finish`.
    pub fn is_idle(&self) -> bool {
        !self.has_pending() && self.candidates.is_empty() && self.forward_refs.is_empty()
    }

    /// Drop everything queued. Used when a load fails partway.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.pending_previous.clear();
        self.candidates.clear();
        self.forward_refs.clear();
    }

    /// Settle the latest declaration of every touched chain, then resolve
    /// forward references. Queued loads must have been drained.
    pub fn finish(&mut self, ctx: &mut AstContext) -> Result<()> {
        debug_assert!(!self.has_pending(), "finish with redeclarations still to load");
        let mut candidates: Vec<_> = std::mem::take(&mut self.candidates).into_iter().collect();
        candidates.sort_by_key(|(first, _)| *first);
        for (first, list) in candidates {
            let current = match ctx.decl(first).redecl {
                Some(Redeclarable {
                    first: f,
                    link: RedeclLink::Latest(latest),
                }) if f == first => latest,
                _ => {
                    return Err(SerializationError::malformed(format!(
                        "declaration {} is referenced as the first of a chain but is not",
                        first.raw()
                    )))
                }
            };
            linearize(ctx, first, list.into_iter().chain(std::iter::once(current)))?;
        }

        for r in std::mem::take(&mut self.forward_refs) {
            match r {
                ForwardRef::DefinitionData(record) => {
                    let found = ctx.redecls(record).find_map(|d| match &ctx.decl(d).data {
                        DeclData::Record(r) => r.definition,
                        _ => None,
                    });
                    if let Some(data) = found {
                        ctx.set_definition_data(record, data);
                    }
                }
                ForwardRef::TemplateCommon(template) => {
                    let has_common = ctx
                        .redecls(template)
                        .any(|d| ctx.decl(d).data.template().is_some_and(|t| t.common.is_some()));
                    if has_common {
                        ctx.get_or_create_template_common(template);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Rebuild the chain of `first` from every declaration reachable through
/// `heads`, ordered by [`recency_key`]. Two modules that each redeclared
/// the same entity leave two branches; the rebuilt chain threads both.
fn linearize(
    ctx: &mut AstContext,
    first: DeclId,
    heads: impl Iterator<Item = DeclId>,
) -> Result<()> {
    let mut members: Vec<DeclId> = Vec::new();
    let mut seen = FxHashSet::default();
    for head in heads {
        let mut d = head;
        while d != first && seen.insert(d) {
            members.push(d);
            d = match ctx.decl(d).redecl {
                Some(Redeclarable {
                    first: f,
                    link: RedeclLink::Previous(prev),
                }) if f == first => prev,
                _ => {
                    return Err(SerializationError::malformed(format!(
                        "declaration {} does not lead back to the first declaration {}",
                        d.raw(),
                        first.raw()
                    )))
                }
            };
        }
    }
    members.sort_by_key(|&d| recency_key(ctx, d));

    let mut prev = first;
    for &d in &members {
        let link = RedeclLink::Previous(prev);
        let decl = ctx.decl_mut(d);
        if decl.redecl.map(|r| r.link) != Some(link) {
            tracing::debug!(decl = d.raw(), prev = prev.raw(), "relinked redeclaration");
            decl.redecl = Some(Redeclarable { first, link });
        }
        prev = d;
    }
    if ctx.most_recent_decl(first) != prev {
        tracing::debug!(first = first.raw(), latest = prev.raw(), "chain latest updated");
        ctx.set_latest_decl(first, prev);
    }
    Ok(())
}

fn check_same_class(ctx: &AstContext, decl: DeclId, other: DeclId) -> Result<()> {
    let class = ctx.decl(decl).class();
    let other_class = ctx.decl(other).class();
    if other_class == class {
        Ok(())
    } else {
        Err(SerializationError::malformed(format!("{class} redeclares a {other_class}")))
    }
}

use crate::error::PlanError;
use crate::id::ContextId;
use crate::sequence::SequenceModel;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A structural operation on a project's sequence.
#[derive(Debug, Clone)]
pub enum Operation {
    Create,
    Delete { target: ContextId, reorder: bool },
    Move { target: ContextId, to: u32 },
    Reorder,
}

// ---------------------------------------------------------------------------
// RenumberPlan
// ---------------------------------------------------------------------------

/// Ephemeral result of plan computation: which contexts change ID, which
/// one is removed, which one is created. Lives only for one transaction.
#[derive(Debug, Clone, Default)]
pub struct RenumberPlan {
    /// Non-identity `old → new` pairs, ordered by old sequence number.
    pub remap: Vec<(ContextId, ContextId)>,
    pub removed: Option<ContextId>,
    pub created: Option<ContextId>,
}

impl RenumberPlan {
    pub fn is_noop(&self) -> bool {
        self.remap.is_empty() && self.removed.is_none() && self.created.is_none()
    }

    pub fn new_id(&self, old: &ContextId) -> Option<&ContextId> {
        self.remap
            .iter()
            .find(|(o, _)| o == old)
            .map(|(_, n)| n)
    }
}

// ---------------------------------------------------------------------------
// Plan computation (pure, no I/O)
// ---------------------------------------------------------------------------

/// Compute the minimal remap for `op` against the loaded sequence. The
/// returned plan has already passed invariant validation.
pub fn compute(model: &SequenceModel, op: &Operation) -> std::result::Result<RenumberPlan, PlanError> {
    let plan = match op {
        Operation::Create => RenumberPlan {
            created: Some(
                ContextId::new(&model.prefix, model.next_sequence())
                    .map_err(|e| PlanError::InvalidRemap(e.to_string()))?,
            ),
            ..Default::default()
        },
        Operation::Delete { target, reorder } => compute_delete(model, target, *reorder)?,
        Operation::Move { target, to } => compute_move(model, target, *to)?,
        Operation::Reorder => compute_reorder(model),
    };
    validate(model, &plan)?;
    Ok(plan)
}

fn require_target<'a>(
    model: &'a SequenceModel,
    target: &ContextId,
) -> std::result::Result<&'a crate::sequence::SequenceEntry, PlanError> {
    model
        .entry(target)
        .ok_or_else(|| PlanError::UnknownTarget(target.to_string()))
}

fn compute_delete(
    model: &SequenceModel,
    target: &ContextId,
    reorder: bool,
) -> std::result::Result<RenumberPlan, PlanError> {
    let entry = require_target(model, target)?;
    let cut = entry.seq();

    let mut remap = Vec::new();
    if reorder {
        for e in &model.entries {
            if e.seq() > cut {
                remap.push((e.id.clone(), e.id.with_seq(e.seq() - 1)));
            }
        }
    }
    Ok(RenumberPlan {
        remap,
        removed: Some(target.clone()),
        created: None,
    })
}

fn compute_move(
    model: &SequenceModel,
    target: &ContextId,
    to: u32,
) -> std::result::Result<RenumberPlan, PlanError> {
    require_target(model, target)?;
    if to == 0 || to as usize > model.len() {
        return Err(PlanError::PositionOutOfRange {
            to,
            len: model.len(),
        });
    }

    let from = model.position(target).expect("target checked above");
    if from == to {
        return Ok(RenumberPlan::default());
    }

    // Work on the rank window between the old and new position. The window
    // keeps the sequence numbers it already owned; they are reassigned to
    // the window's new order, so gaps outside the window are untouched.
    let lo = from.min(to) as usize - 1;
    let hi = from.max(to) as usize - 1;
    let window = &model.entries[lo..=hi];

    let seqs: Vec<u32> = window.iter().map(|e| e.seq()).collect();
    let mut order: Vec<&ContextId> = window.iter().map(|e| &e.id).collect();
    let target_idx = (from as usize - 1) - lo;
    let moved = order.remove(target_idx);
    order.insert(to as usize - 1 - lo, moved);

    let mut remap = Vec::new();
    for (id, &seq) in order.iter().zip(seqs.iter()) {
        if id.seq() != seq {
            remap.push(((*id).clone(), id.with_seq(seq)));
        }
    }
    remap.sort_by_key(|(old, _)| old.seq());
    Ok(RenumberPlan {
        remap,
        ..Default::default()
    })
}

fn compute_reorder(model: &SequenceModel) -> RenumberPlan {
    let mut remap = Vec::new();
    for (i, e) in model.entries.iter().enumerate() {
        let dense = i as u32 + 1;
        if e.seq() != dense {
            remap.push((e.id.clone(), e.id.with_seq(dense)));
        }
    }
    RenumberPlan {
        remap,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Plan validation
// ---------------------------------------------------------------------------

/// Check the two plan invariants: every remap key names a loaded context,
/// and the resulting sequence set has no duplicates.
pub fn validate(model: &SequenceModel, plan: &RenumberPlan) -> std::result::Result<(), PlanError> {
    for (old, _) in &plan.remap {
        if model.entry(old).is_none() {
            return Err(PlanError::InvalidRemap(format!(
                "remap source {old} does not exist"
            )));
        }
    }

    let mut result: BTreeSet<u32> = BTreeSet::new();
    for e in &model.entries {
        if plan.removed.as_ref() == Some(&e.id) {
            continue;
        }
        let seq = plan.new_id(&e.id).map(|n| n.seq()).unwrap_or(e.seq());
        if !result.insert(seq) {
            return Err(PlanError::InvalidRemap(format!(
                "resulting sequence has duplicate number {seq}"
            )));
        }
    }
    if let Some(created) = &plan.created {
        if !result.insert(created.seq()) {
            return Err(PlanError::InvalidRemap(format!(
                "created id {created} collides with an existing context"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

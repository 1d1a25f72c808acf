use crate::canvas::BreakpointCallback;
use crate::foundation::core::Size;
use crate::foundation::error::{VgirError, VgirResult};
use crate::heap::binder::HeapObjectBinder;
use crate::ir::opcode::Opcode;
use crate::ir::operand::{MemOp, OperandValue};
use crate::ir::reader::{DecodedInstruction, decode_program};
use std::collections::{BTreeMap, BTreeSet};

/// Everything a rasterizer receives for one finished canvas.
pub struct Submission<'a> {
    pub buffers: Vec<&'a [u8]>,
    pub binder: &'a HeapObjectBinder,
    pub heap_profiling: bool,
    pub(crate) breakpoints: &'a mut BTreeMap<u32, BreakpointCallback>,
}

impl Submission<'_> {
    /// Runs the callback registered for `id`. Returns `false` for unknown ids.
    pub fn trigger_breakpoint(&mut self, id: u32) -> bool {
        match self.breakpoints.get_mut(&id) {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }

    pub fn breakpoint_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.breakpoints.keys().copied()
    }
}

/// Rasterizer entry point. Turns a submitted program into an artifact.
pub trait IrCompiler {
    type Artifact;

    fn compile(&mut self, submission: Submission<'_>) -> VgirResult<Self::Artifact>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapProfile {
    pub allocations: u64,
    pub frees: u64,
    /// Highest number of simultaneously live handles.
    pub peak_live: usize,
    /// Handles still live at `CommandPoolEnd`, ascending.
    pub leaked: Vec<MemOp>,
}

/// Validated program, ready for replay.
#[derive(Clone, Debug)]
pub struct CompiledPicture {
    pub bounds: Size,
    pub instructions: Vec<DecodedInstruction>,
    pub breakpoints_hit: Vec<u32>,
    pub profile: Option<HeapProfile>,
}

impl CompiledPicture {
    /// Instructions excluding the leading `DrawBounds` and the trailing `CommandPoolEnd`.
    pub fn body(&self) -> &[DecodedInstruction] {
        let n = self.instructions.len();
        if n < 2 { &[] } else { &self.instructions[1..n - 1] }
    }

    pub fn count(&self, opcode: Opcode) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.opcode == opcode)
            .count()
    }
}

/// Reference compiler: decodes the stream and checks handle discipline.
///
/// Every handle operand must be defined and not yet freed when used. A handle is defined by
/// the `key` operand of its creation instruction or by a binder entry, and `HeapFree` ends it.
#[derive(Debug, Default)]
pub struct DecodingCompiler {
    compiled: u64,
}

impl DecodingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Programs compiled successfully so far.
    pub fn compiled(&self) -> u64 {
        self.compiled
    }
}

struct HeapTracker {
    live: BTreeSet<MemOp>,
    profile: HeapProfile,
}

impl HeapTracker {
    fn define(&mut self, op: MemOp, inst: &DecodedInstruction) -> VgirResult<()> {
        if op.is_null() || !self.live.insert(op) {
            return Err(VgirError::decode(format!(
                "{} at buffer {} offset {} defines handle {op} which is null or already live",
                inst.opcode.name(),
                inst.buffer,
                inst.offset
            )));
        }
        self.profile.allocations += 1;
        self.profile.peak_live = self.profile.peak_live.max(self.live.len());
        Ok(())
    }

    fn use_handle(&self, op: MemOp, inst: &DecodedInstruction) -> VgirResult<()> {
        if op.is_null() || self.live.contains(&op) {
            return Ok(());
        }
        Err(VgirError::decode(format!(
            "{} at buffer {} offset {} uses undefined handle {op}",
            inst.opcode.name(),
            inst.buffer,
            inst.offset
        )))
    }

    fn free(&mut self, op: MemOp, inst: &DecodedInstruction) -> VgirResult<()> {
        if !self.live.remove(&op) {
            return Err(VgirError::decode(format!(
                "HeapFree at buffer {} offset {} frees handle {op} which is not live",
                inst.buffer, inst.offset
            )));
        }
        self.profile.frees += 1;
        Ok(())
    }
}

impl IrCompiler for DecodingCompiler {
    type Artifact = CompiledPicture;

    #[tracing::instrument(level = "debug", skip_all)]
    fn compile(&mut self, mut submission: Submission<'_>) -> VgirResult<CompiledPicture> {
        let instructions = decode_program(&submission.buffers)?;

        let bounds = match instructions.first() {
            Some(first) if first.opcode == Opcode::DrawBounds => {
                let w = first.operand("width").and_then(OperandValue::as_f32);
                let h = first.operand("height").and_then(OperandValue::as_f32);
                match (w, h) {
                    (Some(w), Some(h)) => Size::new(f64::from(w), f64::from(h)),
                    _ => return Err(VgirError::decode("malformed DrawBounds")),
                }
            }
            _ => return Err(VgirError::decode("program does not start with DrawBounds")),
        };

        let mut heap = HeapTracker {
            live: submission.binder.iter().map(|(op, _)| op).collect(),
            profile: HeapProfile::default(),
        };
        let mut breakpoints_hit = Vec::new();

        for inst in &instructions {
            match inst.opcode {
                Opcode::HeapFree => {
                    if let Some(op) = inst.operand("key").and_then(OperandValue::as_mem_op) {
                        heap.free(op, inst)?;
                    }
                }
                Opcode::DebugBreakpoint => {
                    let id = inst
                        .operand("id")
                        .and_then(OperandValue::as_u32)
                        .ok_or_else(|| VgirError::decode("malformed DebugBreakpoint"))?;
                    if !submission.trigger_breakpoint(id) {
                        return Err(VgirError::decode(format!(
                            "breakpoint {id} has no registered callback"
                        )));
                    }
                    breakpoints_hit.push(id);
                }
                _ => {
                    for (spec, value) in inst.opcode.operands().iter().zip(inst.operands.iter()) {
                        let Some(op) = value.as_mem_op() else {
                            continue;
                        };
                        if spec.name == "key" {
                            heap.define(op, inst)?;
                        } else {
                            heap.use_handle(op, inst)?;
                        }
                    }
                }
            }
        }

        heap.profile.leaked = heap.live.into_iter().collect();
        let profile = submission.heap_profiling.then_some(heap.profile);
        if let Some(p) = &profile {
            tracing::debug!(
                allocations = p.allocations,
                frees = p.frees,
                peak_live = p.peak_live,
                leaked = p.leaked.len(),
                "heap profile"
            );
        }
        self.compiled += 1;
        Ok(CompiledPicture {
            bounds,
            instructions,
            breakpoints_hit,
            profile,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/compiler.rs"]
mod tests;

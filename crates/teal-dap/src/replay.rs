//! Step-by-step replay of a simulated execution trace.
//!
//! A replay is positioned *before* an opcode: the stack and scratch space reflect
//! every opcode already executed in the current segment. Each segment is one
//! program run and starts from an empty stack and scratch space.

use std::collections::BTreeMap;

use crate::protocol::{AvmValue, ExecTrace, OpcodeTrace, SimulateResponse};

/// One program run within a simulated transaction group.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub steps: Vec<OpcodeTrace>,
}

/// Flattens every program trace of `response`, inner transactions depth first.
pub fn segments(response: &SimulateResponse) -> Vec<Segment> {
    let mut out = Vec::new();

    for (g, group) in response.txn_groups.iter().enumerate() {
        for (t, result) in group.txn_results.iter().enumerate() {
            if let Some(trace) = &result.exec_trace {
                flatten(trace, &format!("group {} txn {}", g, t), &mut out);
            }
        }
    }

    out
}

fn flatten(trace: &ExecTrace, label: &str, out: &mut Vec<Segment>) {
    let programs = [
        ("logic sig", &trace.logic_sig_trace),
        ("approval", &trace.approval_program_trace),
        ("clear state", &trace.clear_state_program_trace),
    ];

    for (kind, steps) in programs {
        if !steps.is_empty() {
            out.push(Segment {
                label: format!("{} {}", label, kind),
                steps: steps.clone(),
            });
        }
    }

    for (i, inner) in trace.inner_trace.iter().enumerate() {
        flatten(inner, &format!("{} inner {}", label, i), out);
    }
}

#[derive(Debug, Default)]
pub struct Replay {
    segments: Vec<Segment>,
    segment: usize,
    step: usize,
    stack: Vec<AvmValue>,
    scratch: BTreeMap<u64, AvmValue>,
}

impl Replay {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments: segments.into_iter().filter(|s| !s.steps.is_empty()).collect(),
            ..Default::default()
        }
    }

    pub fn from_response(response: &SimulateResponse) -> Self {
        Self::new(segments(response))
    }

    fn current(&self) -> Option<&OpcodeTrace> {
        self.segments.get(self.segment)?.steps.get(self.step)
    }

    pub fn pc(&self) -> Option<u64> {
        self.current().map(|op| op.pc)
    }

    pub fn segment_label(&self) -> Option<&str> {
        self.segments.get(self.segment).map(|s| s.label.as_str())
    }

    pub fn is_finished(&self) -> bool {
        self.current().is_none()
    }

    pub fn stack(&self) -> &[AvmValue] {
        &self.stack
    }

    pub fn scratch(&self) -> &BTreeMap<u64, AvmValue> {
        &self.scratch
    }

    /// Executes the current opcode. Returns `false` once the trace is exhausted.
    pub fn step(&mut self) -> bool {
        let Some(op) = self
            .segments
            .get(self.segment)
            .and_then(|s| s.steps.get(self.step))
        else {
            return false;
        };

        let popped = usize::try_from(op.stack_pop_count).unwrap_or(usize::MAX);
        self.stack.truncate(self.stack.len().saturating_sub(popped));
        self.stack.extend(op.stack_additions.iter().cloned());
        for change in &op.scratch_changes {
            self.scratch.insert(change.slot, change.new_value.clone());
        }

        self.step += 1;
        let exhausted = self
            .segments
            .get(self.segment)
            .is_none_or(|s| self.step >= s.steps.len());
        if exhausted {
            self.enter(self.segment + 1);
        }

        !self.is_finished()
    }

    /// Skips the rest of the current program run.
    pub fn step_out(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }

        self.enter(self.segment + 1);
        !self.is_finished()
    }

    /// Steps until `is_breakpoint` holds for the current pc. Returns `false` if
    /// the trace ran out first.
    pub fn resume(&mut self, is_breakpoint: impl Fn(u64) -> bool) -> bool {
        while self.step() {
            if self.pc().is_some_and(&is_breakpoint) {
                return true;
            }
        }
        false
    }

    fn enter(&mut self, segment: usize) {
        self.segment = segment;
        self.step = 0;
        self.stack.clear();
        self.scratch.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ScratchChange, TxnGroupResult, TxnResult};

    fn op(pc: u64, pop: u64, push: Vec<AvmValue>) -> OpcodeTrace {
        OpcodeTrace {
            pc,
            stack_pop_count: pop,
            stack_additions: push,
            scratch_changes: Vec::new(),
        }
    }

    fn program() -> Vec<OpcodeTrace> {
        vec![
            op(1, 0, vec![AvmValue::uint(1)]),
            op(3, 0, vec![AvmValue::uint(2)]),
            op(5, 2, vec![AvmValue::uint(3)]),
            OpcodeTrace {
                scratch_changes: vec![ScratchChange {
                    slot: 0,
                    new_value: AvmValue::uint(3),
                }],
                ..op(6, 1, Vec::new())
            },
            op(8, 0, Vec::new()),
        ]
    }

    fn replay() -> Replay {
        Replay::new(vec![
            Segment {
                label: "first".to_string(),
                steps: program(),
            },
            Segment {
                label: "empty".to_string(),
                steps: Vec::new(),
            },
            Segment {
                label: "second".to_string(),
                steps: vec![op(1, 0, vec![AvmValue::bytes(b"hi")])],
            },
        ])
    }

    #[test]
    fn test_segments_flatten_inner_traces_depth_first() {
        let trace = ExecTrace {
            logic_sig_trace: vec![op(1, 0, Vec::new())],
            approval_program_trace: vec![op(1, 0, Vec::new())],
            inner_trace: vec![ExecTrace {
                approval_program_trace: vec![op(1, 0, Vec::new())],
                ..Default::default()
            }],
            ..Default::default()
        };
        let response = SimulateResponse {
            txn_groups: vec![TxnGroupResult {
                txn_results: vec![
                    TxnResult { exec_trace: Some(trace) },
                    TxnResult { exec_trace: None },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };

        let labels = segments(&response)
            .into_iter()
            .map(|s| s.label)
            .collect::<Vec<_>>();

        assert_eq!(
            labels,
            vec![
                "group 0 txn 0 logic sig",
                "group 0 txn 0 approval",
                "group 0 txn 0 inner 0 approval",
            ]
        );
    }

    #[test]
    fn test_step_reconstructs_stack_and_scratch() {
        let mut replay = replay();
        assert_eq!(replay.pc(), Some(1));
        assert!(replay.stack().is_empty());

        replay.step();
        replay.step();
        assert_eq!(replay.stack(), &[AvmValue::uint(1), AvmValue::uint(2)]);

        replay.step();
        assert_eq!(replay.stack(), &[AvmValue::uint(3)]);

        replay.step();
        assert_eq!(replay.pc(), Some(8));
        assert!(replay.stack().is_empty());
        assert_eq!(replay.scratch().get(&0), Some(&AvmValue::uint(3)));
    }

    #[test]
    fn test_step_enters_next_non_empty_segment_with_fresh_state() {
        let mut replay = replay();
        for _ in 0..5 {
            assert!(replay.step());
        }

        assert_eq!(replay.segment_label(), Some("second"));
        assert_eq!(replay.pc(), Some(1));
        assert!(replay.stack().is_empty());
        assert!(replay.scratch().is_empty());

        assert!(!replay.step());
        assert!(replay.is_finished());
        assert!(!replay.step());
    }

    #[test]
    fn test_step_out_skips_rest_of_segment() {
        let mut replay = replay();
        replay.step();

        assert!(replay.step_out());
        assert_eq!(replay.segment_label(), Some("second"));
        assert!(!replay.step_out());
        assert!(replay.is_finished());
    }

    #[test]
    fn test_resume_stops_at_breakpoint_then_finishes() {
        let mut replay = replay();

        assert!(replay.resume(|pc| pc == 5));
        assert_eq!(replay.pc(), Some(5));
        assert_eq!(replay.stack().len(), 2);

        // pc 1 of the second segment is also a breakpoint candidate
        assert!(replay.resume(|pc| pc == 1));
        assert_eq!(replay.segment_label(), Some("second"));

        assert!(!replay.resume(|pc| pc == 5));
        assert!(replay.is_finished());
    }

    #[test]
    fn test_empty_replay_is_finished() {
        let replay = Replay::from_response(&SimulateResponse::default());
        assert!(replay.is_finished());
        assert_eq!(replay.pc(), None);
    }
}

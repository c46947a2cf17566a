//! Shared worklist
//!
//! Lock-free FIFO of pending nodes with per-node membership flags: a node sits in the
//! queue at most once. Workers drain it in batches; the flag is cleared when
//! processing of a node starts, so updates that arrive mid-processing
//! re-schedule it.

use super::flow_node::{FlowNode, FlowRef};
use crossbeam::queue::SegQueue;

#[derive(Debug, Default)]
pub struct Worklist {
    queue: SegQueue<FlowRef>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `node`; false if it is already pending
    pub fn push(&self, r: FlowRef, node: &FlowNode) -> bool {
        if !node.try_enqueue() {
            return false;
        }
        self.queue.push(r);
        true
    }

    /// Take up to `max` pending nodes
    pub fn drain_batch(&self, max: usize) -> Vec<FlowRef> {
        let mut batch = Vec::with_capacity(max.min(self.queue.len()));
        while batch.len() < max {
            match self.queue.pop() {
                Some(r) => batch.push(r),
                None => break,
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::type_flow::domain::FlowKind;

    #[test]
    fn test_node_is_queued_once() {
        let worklist = Worklist::new();
        let node = FlowNode::clone_node(FlowKind::Local, None, Vec::new());
        assert!(worklist.push(FlowRef::new(0, 0), &node));
        assert!(!worklist.push(FlowRef::new(0, 0), &node));
        assert_eq!(worklist.len(), 1);

        let batch = worklist.drain_batch(10);
        assert_eq!(batch, vec![FlowRef::new(0, 0)]);
        node.dequeue();
        assert!(worklist.push(FlowRef::new(0, 0), &node));
        assert_eq!(worklist.len(), 1);
    }

    #[test]
    fn test_drain_respects_batch_size_and_order() {
        let worklist = Worklist::new();
        let nodes: Vec<_> = (0..5)
            .map(|_| FlowNode::clone_node(FlowKind::Local, None, Vec::new()))
            .collect();
        for (i, n) in nodes.iter().enumerate() {
            worklist.push(FlowRef::new(0, i as u32), n);
        }
        let first = worklist.drain_batch(3);
        assert_eq!(first.iter().map(|r| r.node).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(worklist.drain_batch(3).len(), 2);
        assert!(worklist.is_empty());
    }

    #[test]
    fn test_concurrent_pushes_are_all_drained() {
        let worklist = Worklist::new();
        let nodes: Vec<_> = (0..64)
            .map(|_| FlowNode::clone_node(FlowKind::Local, None, Vec::new()))
            .collect();
        std::thread::scope(|s| {
            for chunk in nodes.chunks(16).enumerate() {
                let worklist = &worklist;
                s.spawn(move || {
                    let (c, chunk) = chunk;
                    for (i, node) in chunk.iter().enumerate() {
                        worklist.push(FlowRef::new(0, (c * 16 + i) as u32), node);
                        worklist.push(FlowRef::new(0, (c * 16 + i) as u32), node);
                    }
                });
            }
        });
        assert_eq!(worklist.len(), 64);
        let mut drained: Vec<_> = worklist.drain_batch(100).into_iter().map(|r| r.node).collect();
        drained.sort_unstable();
        assert_eq!(drained, (0..64).collect::<Vec<u32>>());
    }
}

//! And-inverter graph used to hand networks to the optimizer and get them back.
//!
//! Node 0 is the constant, nodes `1..=num_inputs` are the primary inputs and
//! every later node is a two-input AND gate whose fanins point to earlier
//! nodes, so node order is always a topological order.

use std::collections::HashMap;

use crate::signal::Signal;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AigNode {
    Const,
    Input(usize),
    And(Signal, Signal),
}

#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<AigNode>,
    num_inputs: usize,
    outputs: Vec<Signal>,
    strash: HashMap<(Signal, Signal), usize>,
}

impl Aig {
    pub fn new(num_inputs: usize) -> Self {
        let mut nodes = Vec::with_capacity(num_inputs + 1);
        nodes.push(AigNode::Const);
        nodes.extend((0..num_inputs).map(AigNode::Input));
        Self {
            nodes,
            num_inputs,
            outputs: Vec::new(),
            strash: HashMap::new(),
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn num_ands(&self) -> usize {
        self.nodes.len() - self.num_inputs - 1
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> AigNode {
        self.nodes[index]
    }

    pub fn input(&self, i: usize) -> Signal {
        assert!(i < self.num_inputs, "Input {} out of range", i);
        Signal::from_node(i + 1)
    }

    pub fn outputs(&self) -> &[Signal] {
        &self.outputs
    }

    pub fn add_output(&mut self, s: Signal) {
        self.outputs.push(s);
    }

    /// Fanins of an AND node.
    pub fn fanins(&self, index: usize) -> Option<(Signal, Signal)> {
        match self.nodes[index] {
            AigNode::And(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Appends an AND node without any simplification or sharing.
    pub fn add_and(&mut self, a: Signal, b: Signal) -> Signal {
        assert!(a.node() < self.nodes.len() && b.node() < self.nodes.len(), "Dangling fanin");
        self.nodes.push(AigNode::And(a, b));
        Signal::from_node(self.nodes.len() - 1)
    }

    /// Structurally hashed AND with constant propagation.
    pub fn and(&mut self, a: Signal, b: Signal) -> Signal {
        if a == Signal::zero() || b == Signal::zero() || a == !b {
            return Signal::zero();
        }
        if a == Signal::one() || a == b {
            return b;
        }
        if b == Signal::one() {
            return a;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&node) = self.strash.get(&key) {
            return Signal::from_node(node);
        }
        let s = self.add_and(key.0, key.1);
        self.strash.insert(key, s.node());
        s
    }

    pub fn or(&mut self, a: Signal, b: Signal) -> Signal {
        !self.and(!a, !b)
    }

    pub fn xor(&mut self, a: Signal, b: Signal) -> Signal {
        let x = self.and(a, !b);
        let y = self.and(!a, b);
        self.or(x, y)
    }

    /// `s ? t : e`
    pub fn mux(&mut self, s: Signal, t: Signal, e: Signal) -> Signal {
        let x = self.and(s, t);
        let y = self.and(!s, e);
        self.or(x, y)
    }

    /// Values of all nodes under the given input assignment.
    pub fn simulate(&self, inputs: &[bool]) -> Vec<bool> {
        assert_eq!(inputs.len(), self.num_inputs, "Wrong number of input values");
        let mut values = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let v = match *node {
                AigNode::Const => false,
                AigNode::Input(i) => inputs[i],
                AigNode::And(a, b) => {
                    (values[a.node()] ^ a.is_negated()) && (values[b.node()] ^ b.is_negated())
                }
            };
            values.push(v);
        }
        values
    }

    /// Output values under the given input assignment.
    pub fn evaluate(&self, inputs: &[bool]) -> Vec<bool> {
        let values = self.simulate(inputs);
        self.outputs.iter().map(|s| values[s.node()] ^ s.is_negated()).collect()
    }

    /// Copy without AND nodes unreachable from the outputs. Inputs are always kept.
    pub fn cleanup(&self) -> Aig {
        let mut used = vec![false; self.nodes.len()];
        for s in &self.outputs {
            used[s.node()] = true;
        }
        for i in (self.num_inputs + 1..self.nodes.len()).rev() {
            if let (true, AigNode::And(a, b)) = (used[i], self.nodes[i]) {
                used[a.node()] = true;
                used[b.node()] = true;
            }
        }

        let mut result = Aig::new(self.num_inputs);
        let mut map: Vec<Signal> = (0..=self.num_inputs).map(Signal::from_node).collect();
        map.resize(self.nodes.len(), Signal::zero());
        for i in self.num_inputs + 1..self.nodes.len() {
            if let (true, AigNode::And(a, b)) = (used[i], self.nodes[i]) {
                let a = map[a.node()].not_cond(a.is_negated());
                let b = map[b.node()].not_cond(b.is_negated());
                map[i] = result.and(a, b);
            }
        }
        for s in &self.outputs {
            result.add_output(map[s.node()].not_cond(s.is_negated()));
        }
        result
    }

    /// Number of AND levels on the longest input-to-output path.
    pub fn depth(&self) -> usize {
        let mut levels = vec![0usize; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let AigNode::And(a, b) = *node {
                levels[i] = levels[a.node()].max(levels[b.node()]) + 1;
            }
        }
        self.outputs.iter().map(|s| levels[s.node()]).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strash() {
        let mut aig = Aig::new(2);
        let (a, b) = (aig.input(0), aig.input(1));
        let x = aig.and(a, b);
        let y = aig.and(b, a);
        assert_eq!(x, y);
        assert_eq!(aig.num_ands(), 1);
        assert_eq!(aig.and(a, !a), Signal::zero());
        assert_eq!(aig.and(a, Signal::one()), a);
        assert_eq!(aig.and(a, a), a);
    }

    #[test]
    fn test_evaluate() {
        let mut aig = Aig::new(3);
        let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
        let x = aig.xor(a, b);
        let m = aig.mux(c, x, !a);
        aig.add_output(x);
        aig.add_output(m);
        for bits in 0..8 {
            let v: Vec<bool> = (0..3).map(|i| bits >> i & 1 != 0).collect();
            let out = aig.evaluate(&v);
            assert_eq!(out[0], v[0] ^ v[1]);
            assert_eq!(out[1], if v[2] { v[0] ^ v[1] } else { !v[0] });
        }
    }

    #[test]
    fn test_cleanup_drops_dangling() {
        let mut aig = Aig::new(3);
        let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
        let x = aig.and(a, b);
        let _unused = aig.and(b, c);
        let y = aig.or(x, c);
        aig.add_output(!y);
        let clean = aig.cleanup();
        assert_eq!(clean.num_ands(), 2);
        assert_eq!(clean.num_inputs(), 3);
        for bits in 0..8 {
            let v: Vec<bool> = (0..3).map(|i| bits >> i & 1 != 0).collect();
            assert_eq!(clean.evaluate(&v), aig.evaluate(&v));
        }
        assert_eq!(clean.depth(), 2);
    }
}

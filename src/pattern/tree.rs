use super::{HaploPattern, PatternId};
use crate::genotype::Allele;
use crate::utils::Result;
use itertools::Either;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Rooted at each start locus, keyed start to end.
    Forward,
    /// Rooted at each end locus, keyed end to start.
    Backward,
}

#[derive(Debug, Clone, Default)]
pub struct PatternNode {
    children: BTreeMap<Allele, PatternNode>,
    pattern: Option<PatternId>,
}

impl PatternNode {
    pub fn pattern(&self) -> Option<PatternId> {
        self.pattern
    }

    pub fn child(&self, allele: Allele) -> Option<&PatternNode> {
        self.children.get(&allele)
    }

    pub fn children(&self) -> impl Iterator<Item = (Allele, &PatternNode)> {
        self.children.iter().map(|(allele, node)| (*allele, node))
    }

    pub fn size(&self) -> usize {
        self.children.len()
    }
}

/// Trie over pattern contents, one root per locus.
#[derive(Debug, Clone)]
pub struct PatternTree {
    orientation: Orientation,
    roots: Vec<PatternNode>,
}

impl PatternTree {
    pub fn new(orientation: Orientation, genotype_len: usize) -> Self {
        PatternTree {
            orientation,
            roots: vec![PatternNode::default(); genotype_len + 1],
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn root(&self, locus: usize) -> &PatternNode {
        &self.roots[locus]
    }

    /// Inserts a pattern; returns false when an identical pattern is already present.
    pub fn add_pattern(&mut self, pattern: &HaploPattern) -> Result<bool> {
        let genotype_len = self.roots.len() - 1;
        if pattern.is_empty() || pattern.end() > genotype_len {
            return Err(format!(
                "Pattern {} [{}, {}) does not fit loci [0, {})",
                pattern.id,
                pattern.start,
                pattern.end(),
                genotype_len
            ));
        }
        let (mut node, path) = match self.orientation {
            Orientation::Forward => (
                &mut self.roots[pattern.start],
                Either::Left(pattern.alleles.iter()),
            ),
            Orientation::Backward => (
                &mut self.roots[pattern.end()],
                Either::Right(pattern.alleles.iter().rev()),
            ),
        };
        for allele in path {
            node = node.children.entry(*allele).or_default();
        }
        match node.pattern {
            Some(existing) => {
                log::warn!(
                    "Pattern {} duplicates pattern {} ({} at locus {}), keeping the first",
                    pattern.id,
                    existing,
                    pattern.alleles,
                    pattern.start
                );
                Ok(false)
            }
            None => {
                node.pattern = Some(pattern.id);
                Ok(true)
            }
        }
    }

    /// Deepest pattern ending at `end` whose content equals `seq` and that
    /// starts no earlier than `min_start`. `seq[k]` is the allele at locus
    /// `seq_start + k`. Only meaningful for backward trees.
    pub fn find_longest_match(
        &self,
        end: usize,
        seq: &[Allele],
        seq_start: usize,
        min_start: usize,
    ) -> Option<PatternId> {
        debug_assert_eq!(self.orientation, Orientation::Backward);
        if end >= self.roots.len() || end > seq_start + seq.len() {
            return None;
        }
        let lower = seq_start.max(min_start);
        let mut node = &self.roots[end];
        let mut best = None;
        let mut locus = end;
        while locus > lower {
            locus -= 1;
            let allele = seq[locus - seq_start];
            if allele.is_missing() {
                break;
            }
            match node.child(allele) {
                Some(child) => {
                    node = child;
                    if node.pattern.is_some() {
                        best = node.pattern;
                    }
                }
                None => break,
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::AlleleSequence;

    fn library() -> Vec<HaploPattern> {
        [(0, "A"), (0, "a"), (0, "AB"), (0, "ab"), (1, "B"), (1, "Bc"), (0, "ABc")]
            .iter()
            .enumerate()
            .map(|(id, (start, alleles))| {
                let mut p = HaploPattern::new(*start, alleles.parse().unwrap(), 0.5, 0.5);
                p.id = id;
                p
            })
            .collect()
    }

    fn backward_tree() -> PatternTree {
        let mut tree = PatternTree::new(Orientation::Backward, 3);
        for p in library() {
            assert!(tree.add_pattern(&p).unwrap());
        }
        tree
    }

    fn seq(s: &str) -> AlleleSequence {
        s.parse().unwrap()
    }

    #[test]
    fn longest_match_wins() {
        let tree = backward_tree();
        let h = seq("ABc");
        assert_eq!(tree.find_longest_match(1, h.as_slice(), 0, 0), Some(0));
        assert_eq!(tree.find_longest_match(2, h.as_slice(), 0, 0), Some(2));
        assert_eq!(tree.find_longest_match(3, h.as_slice(), 0, 0), Some(6));
    }

    #[test]
    fn start_bound_limits_match() {
        let tree = backward_tree();
        let h = seq("ABc");
        assert_eq!(tree.find_longest_match(3, h.as_slice(), 0, 1), Some(5));
        let suffix = seq("Bc");
        assert_eq!(tree.find_longest_match(3, suffix.as_slice(), 1, 1), Some(5));
    }

    #[test]
    fn missing_alleles_never_match() {
        let tree = backward_tree();
        let h = seq(".Bc");
        assert_eq!(tree.find_longest_match(3, h.as_slice(), 0, 0), Some(5));
        assert_eq!(tree.find_longest_match(1, h.as_slice(), 0, 0), None);
        let unknown = seq("xyz");
        assert_eq!(tree.find_longest_match(3, unknown.as_slice(), 0, 0), None);
    }

    #[test]
    fn duplicate_pattern_keeps_first() {
        let mut tree = backward_tree();
        let mut duplicate = HaploPattern::new(0, seq("AB"), 0.1, 0.1);
        duplicate.id = 99;
        assert!(!tree.add_pattern(&duplicate).unwrap());
        let h = seq("AB");
        assert_eq!(tree.find_longest_match(2, h.as_slice(), 0, 0), Some(2));
    }

    #[test]
    fn out_of_bounds_pattern_is_rejected() {
        let mut tree = PatternTree::new(Orientation::Backward, 2);
        let p = HaploPattern::new(1, seq("AB"), 0.5, 0.5);
        assert!(tree.add_pattern(&p).is_err());
        let empty = HaploPattern::new(0, AlleleSequence::default(), 0.5, 0.5);
        assert!(tree.add_pattern(&empty).is_err());
    }

    #[test]
    fn forward_tree_is_keyed_from_start() {
        let mut tree = PatternTree::new(Orientation::Forward, 3);
        for p in library() {
            tree.add_pattern(&p).unwrap();
        }
        let root = tree.root(0);
        assert_eq!(root.size(), 2);
        let a = root.child(Allele(b'A')).unwrap();
        assert_eq!(a.pattern(), Some(0));
        let ab = a.child(Allele(b'B')).unwrap();
        assert_eq!(ab.pattern(), Some(2));
        assert_eq!(ab.child(Allele(b'c')).unwrap().pattern(), Some(6));
        let symbols: Vec<Allele> = root.children().map(|(a, _)| a).collect();
        assert_eq!(symbols, vec![Allele(b'A'), Allele(b'a')]);
    }
}

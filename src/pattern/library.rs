use super::{HaploPattern, PatternId};
use crate::genotype::AlleleSequence;
use crate::utils::{open_table_reader, table_fields, Result};
use std::{
    collections::HashMap,
    io::{BufRead, Write},
    ops::{Index, IndexMut},
    path::Path,
};

/// Ordered pattern arena; a pattern's id is its position.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<HaploPattern>,
}

impl PatternLibrary {
    pub fn new(patterns: Vec<HaploPattern>) -> Self {
        let mut library = PatternLibrary { patterns };
        library.assign_ids();
        library
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HaploPattern> {
        self.patterns.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, HaploPattern> {
        self.patterns.iter_mut()
    }

    pub fn assign_ids(&mut self) {
        for (id, pattern) in self.patterns.iter_mut().enumerate() {
            pattern.id = id;
        }
    }

    /// Length of the shortest pattern starting at locus 0.
    pub fn head_len(&self) -> Option<usize> {
        self.patterns
            .iter()
            .filter(|p| p.start == 0 && !p.is_empty())
            .map(|p| p.len())
            .min()
    }

    pub fn head_ids(&self) -> Vec<PatternId> {
        match self.head_len() {
            Some(head_len) => self
                .patterns
                .iter()
                .filter(|p| p.start == 0 && p.len() == head_len)
                .map(|p| p.id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Fills transition probabilities as frequency over the frequency of the
    /// one-shorter prefix with the same start; patterns without a prefix in
    /// the library take their own frequency.
    pub fn derive_transition_probs(&mut self, only: &[PatternId]) {
        let derived: Vec<(PatternId, f64)> = {
            let prefixes: HashMap<(usize, &AlleleSequence), f64> = self
                .patterns
                .iter()
                .map(|p| ((p.start, &p.alleles), p.frequency))
                .collect();
            only.iter()
                .map(|&id| {
                    let p = &self.patterns[id];
                    if p.len() <= 1 {
                        return (id, p.frequency);
                    }
                    let prefix = AlleleSequence::new(p.alleles.as_slice()[..p.len() - 1].to_vec());
                    let transition_prob = match prefixes.get(&(p.start, &prefix)) {
                        Some(&f) if f > 0.0 => p.frequency / f,
                        Some(_) => 0.0,
                        None => p.frequency,
                    };
                    (id, transition_prob)
                })
                .collect()
        };
        for (id, transition_prob) in derived {
            self.patterns[id].transition_prob = transition_prob;
        }
    }

    /// Drops patterns below `min_freq`, keeping every head pattern.
    pub fn prune(&mut self, min_freq: f64) -> usize {
        let head_len = self.head_len();
        let before = self.patterns.len();
        self.patterns
            .retain(|p| p.frequency >= min_freq || (p.start == 0 && Some(p.len()) == head_len));
        self.assign_ids();
        before - self.patterns.len()
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut patterns = Vec::new();
        let mut underived = Vec::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            let Some(fields) = table_fields(&line) else {
                continue;
            };
            let parse_f64 = |s: &str, name: &str| {
                s.parse::<f64>()
                    .map_err(|e| format!("Invalid {} at line {}: {}", name, line_number + 1, e))
            };
            let (start, alleles, frequency, transition_prob) = match fields[..] {
                [start, alleles, frequency] => (start, alleles, frequency, None),
                [start, alleles, frequency, tp] => (start, alleles, frequency, Some(tp)),
                _ => {
                    return Err(format!(
                        "Expected fields 'start alleles frequency [transition_prob]' at line {}: {}",
                        line_number + 1,
                        line
                    ))
                }
            };
            let start = start
                .parse::<usize>()
                .map_err(|e| format!("Invalid start at line {}: {}", line_number + 1, e))?;
            let alleles: AlleleSequence = alleles
                .parse()
                .map_err(|e| format!("Invalid pattern at line {}: {}", line_number + 1, e))?;
            if alleles.is_empty() || alleles.missing_num() > 0 {
                return Err(format!(
                    "Pattern at line {} must contain only non-missing alleles",
                    line_number + 1
                ));
            }
            let frequency = parse_f64(frequency, "frequency")?;
            let transition_prob = match transition_prob {
                Some(tp) => parse_f64(tp, "transition probability")?,
                None => {
                    underived.push(patterns.len());
                    0.0
                }
            };
            patterns.push(HaploPattern::new(start, alleles, frequency, transition_prob));
        }
        let mut library = PatternLibrary::new(patterns);
        library.derive_transition_probs(&underived);
        Ok(library)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_table_reader(path)?;
        PatternLibrary::from_reader(reader).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "#start\talleles\tfrequency\ttransition_prob").map_err(|e| e.to_string())?;
        for p in &self.patterns {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                p.start, p.alleles, p.frequency, p.transition_prob
            )
            .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl Index<PatternId> for PatternLibrary {
    type Output = HaploPattern;

    fn index(&self, id: PatternId) -> &Self::Output {
        &self.patterns[id]
    }
}

impl IndexMut<PatternId> for PatternLibrary {
    fn index_mut(&mut self, id: PatternId) -> &mut Self::Output {
        &mut self.patterns[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LIBRARY: &str = "\
#start alleles frequency\n\
0 A 0.5\n\
0 a 0.5\n\
0 AB 0.25\n\
0 Ab 0.25 0.5\n\
1 B 0.6\n";

    #[test]
    fn read_library_and_derive_transitions() {
        let library = PatternLibrary::from_reader(Cursor::new(LIBRARY)).unwrap();
        assert_eq!(library.len(), 5);
        assert_eq!(library[2].id, 2);
        assert_eq!(library[0].transition_prob, 0.5);
        assert_eq!(library[2].transition_prob, 0.5);
        assert_eq!(library[3].transition_prob, 0.5);
        assert_eq!(library[4].transition_prob, 0.6);
        assert_eq!(library.head_len(), Some(1));
        assert_eq!(library.head_ids(), vec![0, 1]);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(PatternLibrary::from_reader(Cursor::new("0 A\n")).is_err());
        assert!(PatternLibrary::from_reader(Cursor::new("x A 0.5\n")).is_err());
        assert!(PatternLibrary::from_reader(Cursor::new("0 A. 0.5\n")).is_err());
        let err = PatternLibrary::from_reader(Cursor::new("0 A 0.5\n0 a nan?\n")).unwrap_err();
        assert!(err.contains("line 2"), "{}", err);
    }

    #[test]
    fn prune_keeps_heads() {
        let mut library = PatternLibrary::from_reader(Cursor::new(LIBRARY)).unwrap();
        let removed = library.prune(0.3);
        assert_eq!(removed, 2);
        assert_eq!(library.len(), 3);
        assert_eq!(library[2].alleles.to_string(), "B");
        assert_eq!(library[2].id, 2);
    }

    #[test]
    fn write_round_trip() {
        let library = PatternLibrary::from_reader(Cursor::new(LIBRARY)).unwrap();
        let mut buffer = Vec::new();
        library.write(&mut buffer).unwrap();
        let reread = PatternLibrary::from_reader(Cursor::new(buffer)).unwrap();
        assert_eq!(reread.len(), library.len());
        assert_eq!(reread[3].transition_prob, library[3].transition_prob);
    }
}

//! Gene and chromosome types shared by both search drivers.

/// Boolean door-subset selector: bit `i` opens candidate slot `i`.
pub type Gene = Vec<bool>;

/// Number of active doors in a gene.
pub fn active_doors(gene: &Gene) -> u32 {
    gene.iter().filter(|&&bit| bit).count() as u32
}

/// A candidate solution with its evaluated objective vector and the
/// bookkeeping the NSGA-II loop needs.
#[derive(Debug, Clone)]
pub struct Chromosome {
    /// Generation the chromosome was created in.
    pub generation: u32,
    pub gene: Gene,
    /// Minimized objective vector.
    pub obj: Vec<f64>,
    /// Non-domination rank, 0 = Pareto front.
    pub rank: u32,
    /// Crowding distance within the rank.
    pub crowding: f64,
}

impl Chromosome {
    pub fn new(generation: u32, gene: Gene, obj: Vec<f64>) -> Self {
        Self {
            generation,
            gene,
            obj,
            rank: 0,
            crowding: 0.0,
        }
    }

    /// Strict Pareto dominance: no worse everywhere, better somewhere.
    pub fn dominates(&self, other: &Chromosome) -> bool {
        let mut strictly_better = false;
        for (a, b) in self.obj.iter().zip(other.obj.iter()) {
            if a > b {
                return false;
            }
            if a < b {
                strictly_better = true;
            }
        }
        strictly_better
    }

    /// Crowded-comparison operator: lower rank wins, larger crowding breaks
    /// the tie.
    pub fn crowded_less(&self, other: &Chromosome) -> bool {
        self.rank < other.rank || (self.rank == other.rank && self.crowding > other.crowding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chromosome(obj: &[f64]) -> Chromosome {
        Chromosome::new(0, vec![], obj.to_vec())
    }

    #[test]
    fn counting_active_doors() {
        assert_eq!(active_doors(&vec![true, false, true, true]), 3);
        assert_eq!(active_doors(&vec![false; 5]), 0);
    }

    #[test]
    fn dominance_is_strict() {
        let a = chromosome(&[1.0, 2.0]);
        let b = chromosome(&[1.0, 3.0]);
        let c = chromosome(&[1.0, 2.0]);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        // Equal vectors dominate in neither direction.
        assert!(!a.dominates(&c));
        assert!(!c.dominates(&a));
    }

    #[test]
    fn dominance_is_a_partial_order() {
        // Incomparable pair: each is better on one objective.
        let a = chromosome(&[1.0, 5.0]);
        let b = chromosome(&[2.0, 4.0]);
        assert!(!a.dominates(&b));
        assert!(!b.dominates(&a));
        // Transitivity on a comparable chain.
        let top = chromosome(&[0.0, 0.0]);
        let mid = chromosome(&[1.0, 1.0]);
        let bottom = chromosome(&[2.0, 2.0]);
        assert!(top.dominates(&mid));
        assert!(mid.dominates(&bottom));
        assert!(top.dominates(&bottom));
    }

    #[test]
    fn crowded_comparison_prefers_rank_then_spread() {
        let mut a = chromosome(&[1.0, 1.0]);
        let mut b = chromosome(&[1.0, 1.0]);
        a.rank = 0;
        b.rank = 1;
        assert!(a.crowded_less(&b));
        b.rank = 0;
        a.crowding = 2.0;
        b.crowding = 1.0;
        assert!(a.crowded_less(&b));
        assert!(!b.crowded_less(&a));
    }
}

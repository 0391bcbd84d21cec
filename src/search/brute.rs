//! Brute-force driver: exhaustive Pareto enumeration over door subsets.

use log::info;

use crate::error::EngineError;
use crate::sim::constants::MAX_BRUTE_DOORS;

use super::factory::ChromosomeFactory;
use super::gene::{Chromosome, Gene};

/// Enumerate every door subset and return the exact Pareto front.
///
/// Refuses instances with more than [`MAX_BRUTE_DOORS`] candidate slots —
/// the search space doubles per slot. The front comes back sorted by door
/// count, then distance (the last objective).
pub fn enumerate<F: ChromosomeFactory>(factory: &F) -> Result<Vec<Chromosome>, EngineError> {
    let gene_length = factory.gene_length();
    if gene_length > MAX_BRUTE_DOORS {
        return Err(EngineError::TooLarge {
            doors: gene_length,
            max: MAX_BRUTE_DOORS,
        });
    }

    let total = 1u64 << gene_length;
    info!("brute force: evaluating {total} door subsets over {gene_length} slots");

    let genes: Vec<Gene> = (0..total).map(|mask| gene_from_mask(mask, gene_length)).collect();
    let objectives = factory.evaluate_many(&genes)?;

    let chromosomes: Vec<Chromosome> = genes
        .into_iter()
        .zip(objectives)
        .map(|(gene, obj)| Chromosome::new(0, gene, obj))
        .collect();

    let mut front: Vec<Chromosome> = chromosomes
        .iter()
        .enumerate()
        .filter(|(i, candidate)| {
            !chromosomes
                .iter()
                .enumerate()
                .any(|(j, other)| j != *i && other.dominates(candidate))
        })
        .map(|(_, candidate)| candidate.clone())
        .collect();

    front.sort_by(|a, b| {
        a.obj[0]
            .total_cmp(&b.obj[0])
            .then_with(|| {
                let last = a.obj.len() - 1;
                a.obj[last].total_cmp(&b.obj[last])
            })
            .then_with(|| a.gene.cmp(&b.gene))
    });

    info!("brute force finished: {} solutions in the Pareto front", front.len());
    Ok(front)
}

/// Gene for an enumeration index: bit `i` of the mask opens slot `i`.
fn gene_from_mask(mask: u64, gene_length: usize) -> Gene {
    (0..gene_length).map(|i| (mask >> i) & 1 == 1).collect()
}

use crate::shared::gene::GeneType;
use crate::shared::model::RecombinationModel;
use crate::shared::sampler::{
    cut_j_segments, cut_v_segments, gene_choice, realized, CutSegment, DeletionEvent,
    EventSampler, InsertionEvent, SampledCdr3,
};
use anyhow::{anyhow, Result};
use rand::Rng;

#[derive(Clone, Debug)]
pub struct Generator {
    events: EventSampler,
    v_choice: String,
    j_choice: String,
    del_v: DeletionEvent,
    del_j: DeletionEvent,
    ins_vj: InsertionEvent,

    // V/J sequences trimmed at the CDR3 region (include F/W/C residues) with
    // the maximum number of reverse palindromic insertions appended.
    seg_vs: Vec<CutSegment>,
    seg_js: Vec<CutSegment>,
}

impl Generator {
    pub fn new(model: &RecombinationModel) -> Result<Generator> {
        let params = model.params();
        let marginals = model.marginals();

        let v_choice = gene_choice(params, GeneType::V)?;
        let j_choice = gene_choice(params, GeneType::J)?;
        let del_v = DeletionEvent::find(params, GeneType::V, "Three_prime")?;
        let del_j = DeletionEvent::find(params, GeneType::J, "Five_prime")?;
        let ins_vj = InsertionEvent::find(params, marginals, "VJ_gene")?;

        let events = EventSampler::new(
            marginals,
            &[
                &v_choice,
                &j_choice,
                &del_v.nickname,
                &del_j.nickname,
                &ins_vj.nickname,
            ],
        )?;
        Ok(Generator {
            events,
            seg_vs: cut_v_segments(model, del_v.palindrome)?,
            seg_js: cut_j_segments(model, del_j.palindrome)?,
            v_choice,
            j_choice,
            del_v,
            del_j,
            ins_vj,
        })
    }

    /// Draw one recombination scenario and build its CDR3. Return `None` when
    /// the scenario is out of frame or its deletions exceed the segments.
    pub fn generate_cdr3<R: Rng>(&mut self, rng: &mut R) -> Result<Option<SampledCdr3>> {
        let realization = self.events.sample(rng)?;

        let v_index = realized(&realization, &self.v_choice)?;
        let j_index = realized(&realization, &self.j_choice)?;
        let seg_v = self
            .seg_vs
            .get(v_index)
            .ok_or_else(|| anyhow!("No V gene with index {}", v_index))?;
        let seg_j = self
            .seg_js
            .get(j_index)
            .ok_or_else(|| anyhow!("No J gene with index {}", j_index))?;

        // incomplete genes (anchor beyond the sequence) are never used
        if seg_v.seq.is_empty() || seg_j.seq.is_empty() {
            return Ok(None);
        }
        let del_v = self.del_v.removed(&realization)?;
        let del_j = self.del_j.removed(&realization)?;
        let ins_vj = self.ins_vj.length(&realization)?;
        if del_v > seg_v.seq.len() || del_j > seg_j.seq.len() {
            return Ok(None);
        }
        if (seg_v.seq.len() - del_v + seg_j.seq.len() - del_j + ins_vj) % 3 != 0 {
            return Ok(None);
        }

        let mut seq = seg_v.seq.extract_subsequence(0, seg_v.seq.len() - del_v);
        let end_v = seq.seq.last().copied().unwrap_or(b'N');
        seq.extend(&self.ins_vj.markov.generate(ins_vj, end_v, rng));
        seq.extend(&seg_j.seq.extract_subsequence(del_j, seg_j.seq.len()));

        Ok(Some(SampledCdr3 {
            nucleotide: seq,
            v_gene: seg_v.name.clone(),
            j_gene: seg_j.name.clone(),
        }))
    }
}

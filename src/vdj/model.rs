use crate::shared::gene::GeneType;
use crate::shared::model::RecombinationModel;
use crate::shared::sampler::{
    cut_j_segments, cut_v_segments, gene_choice, palindromic_d_segments, realized, CutSegment,
    DeletionEvent, EventSampler, InsertionEvent, SampledCdr3,
};
use anyhow::{anyhow, Result};
use rand::Rng;

#[derive(Clone, Debug)]
pub struct Generator {
    events: EventSampler,
    v_choice: String,
    d_choice: String,
    j_choice: String,
    del_v: DeletionEvent,
    del_d5: DeletionEvent,
    del_d3: DeletionEvent,
    del_j: DeletionEvent,
    ins_vd: InsertionEvent,
    ins_dj: InsertionEvent,

    seg_vs: Vec<CutSegment>,
    seg_ds: Vec<CutSegment>, // complete, palindromes on both sides
    seg_js: Vec<CutSegment>,
}

impl Generator {
    pub fn new(model: &RecombinationModel) -> Result<Generator> {
        let params = model.params();
        let marginals = model.marginals();

        let v_choice = gene_choice(params, GeneType::V)?;
        let d_choice = gene_choice(params, GeneType::D)?;
        let j_choice = gene_choice(params, GeneType::J)?;
        let del_v = DeletionEvent::find(params, GeneType::V, "Three_prime")?;
        let del_d5 = DeletionEvent::find(params, GeneType::D, "Five_prime")?;
        let del_d3 = DeletionEvent::find(params, GeneType::D, "Three_prime")?;
        let del_j = DeletionEvent::find(params, GeneType::J, "Five_prime")?;
        let ins_vd = InsertionEvent::find(params, marginals, "VD_gene")?;
        let ins_dj = InsertionEvent::find(params, marginals, "DJ_gene")?;

        let events = EventSampler::new(
            marginals,
            &[
                &v_choice,
                &d_choice,
                &j_choice,
                &del_v.nickname,
                &del_d5.nickname,
                &del_d3.nickname,
                &del_j.nickname,
                &ins_vd.nickname,
                &ins_dj.nickname,
            ],
        )?;
        Ok(Generator {
            events,
            seg_vs: cut_v_segments(model, del_v.palindrome)?,
            seg_ds: palindromic_d_segments(model, del_d5.palindrome, del_d3.palindrome)?,
            seg_js: cut_j_segments(model, del_j.palindrome)?,
            v_choice,
            d_choice,
            j_choice,
            del_v,
            del_d5,
            del_d3,
            del_j,
            ins_vd,
            ins_dj,
        })
    }

    /// Draw one recombination scenario and build its CDR3. Return `None` when
    /// the scenario is out of frame or its deletions exceed the segments.
    pub fn generate_cdr3<R: Rng>(&mut self, rng: &mut R) -> Result<Option<SampledCdr3>> {
        let realization = self.events.sample(rng)?;

        let v_index = realized(&realization, &self.v_choice)?;
        let d_index = realized(&realization, &self.d_choice)?;
        let j_index = realized(&realization, &self.j_choice)?;
        let seg_v = self
            .seg_vs
            .get(v_index)
            .ok_or_else(|| anyhow!("No V gene with index {}", v_index))?;
        let seg_d = self
            .seg_ds
            .get(d_index)
            .ok_or_else(|| anyhow!("No D gene with index {}", d_index))?;
        let seg_j = self
            .seg_js
            .get(j_index)
            .ok_or_else(|| anyhow!("No J gene with index {}", j_index))?;

        // incomplete genes (anchor beyond the sequence) are never used
        if seg_v.seq.is_empty() || seg_j.seq.is_empty() {
            return Ok(None);
        }
        let del_v = self.del_v.removed(&realization)?;
        let del_d5 = self.del_d5.removed(&realization)?;
        let del_d3 = self.del_d3.removed(&realization)?;
        let del_j = self.del_j.removed(&realization)?;
        let ins_vd = self.ins_vd.length(&realization)?;
        let ins_dj = self.ins_dj.length(&realization)?;

        if del_v > seg_v.seq.len() || del_j > seg_j.seq.len() || del_d5 + del_d3 > seg_d.seq.len()
        {
            return Ok(None);
        }
        let length = seg_v.seq.len() - del_v + seg_d.seq.len() - del_d5 - del_d3
            + seg_j.seq.len()
            - del_j
            + ins_vd
            + ins_dj;
        if length % 3 != 0 {
            return Ok(None);
        }

        let mut seq = seg_v.seq.extract_subsequence(0, seg_v.seq.len() - del_v);
        let end_v = seq.seq.last().copied().unwrap_or(b'N');
        let first_j = seg_j.seq.seq.get(del_j).copied().unwrap_or(b'N');

        seq.extend(&self.ins_vd.markov.generate(ins_vd, end_v, rng));
        seq.extend(&seg_d.seq.extract_subsequence(del_d5, seg_d.seq.len() - del_d3));
        // the DJ insertion is generated from the J side
        let mut ins_seq_dj = self.ins_dj.markov.generate(ins_dj, first_j, rng);
        ins_seq_dj.reverse();
        seq.extend(&ins_seq_dj);
        seq.extend(&seg_j.seq.extract_subsequence(del_j, seg_j.seq.len()));

        Ok(Some(SampledCdr3 {
            nucleotide: seq,
            v_gene: seg_v.name.clone(),
            j_gene: seg_j.name.clone(),
        }))
    }
}

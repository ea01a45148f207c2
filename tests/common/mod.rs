use itertools::Itertools;
use std::path::PathBuf;
use vdjgen::shared::anchors::AnchorTable;
use vdjgen::{GeneType, ModelSources, PipelineConfig, RecombinationModel, Topology};

// CDR3 anchor of V_SEQ (TGC) and J_SEQ (TTC)
pub const V_SEQ: &str = "ATCTACTACTACTGCTCATGCAAAAAAAAA";
pub const V_ANCHOR: usize = 18;
pub const J_SEQ: &str = "GGGGGGCAGTCTTCGGAGAAACAAAGACTTAT";
pub const J_ANCHOR: usize = 11;
pub const D_SEQS: [&str; 2] = ["GGGACAGGGGGC", "GGGACTAGCGGGAGGG"];

#[allow(dead_code)]
pub fn names(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
}

fn gene_records(names: &[String], seq: impl Fn(usize) -> String) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, n)| format!("%{};{};{}\n", n, seq(i), i))
        .collect()
}

fn number_records(values: impl Iterator<Item = i64>) -> String {
    values
        .enumerate()
        .map(|(i, v)| format!("%{};{}\n", v, i))
        .collect()
}

const DINUC_RECORDS: &str = "%A;0\n%C;1\n%G;2\n%T;3\n";

/// Parameters of a VJ model, deletions in [-2, 2] and up to 3 insertions
#[allow(dead_code)]
pub fn vj_params(v_names: &[String], j_names: &[String]) -> String {
    format!(
        "@Event_list\n\
         #GeneChoice;V_gene;Undefined_side;7;v_choice\n{}\
         #GeneChoice;J_gene;Undefined_side;6;j_choice\n{}\
         #Deletion;V_gene;Three_prime;5;v_3_del\n{}\
         #Deletion;J_gene;Five_prime;5;j_5_del\n{}\
         #Insertion;VJ_gene;Undefined_side;4;vj_ins\n{}\
         #DinucMarkov;VJ_gene;Undefined_side;3;vj_dinucl\n{}\
         @Edges\n\
         %GeneChoice_V_gene_Undefined_side_prio7_size{};GeneChoice_J_gene_Undefined_side_prio6_size{}\n\
         @ErrorRate\n\
         #SingleErrorRate\n\
         0\n",
        gene_records(v_names, |_| V_SEQ.to_string()),
        gene_records(j_names, |_| J_SEQ.to_string()),
        number_records(-2..=2),
        number_records(-2..=2),
        number_records(0..=3),
        DINUC_RECORDS,
        v_names.len(),
        j_names.len(),
    )
}

/// Parameters of a VDJ model
#[allow(dead_code)]
pub fn vdj_params(v_names: &[String], d_names: &[String], j_names: &[String]) -> String {
    format!(
        "@Event_list\n\
         #GeneChoice;V_gene;Undefined_side;7;v_choice\n{}\
         #GeneChoice;J_gene;Undefined_side;6;j_choice\n{}\
         #GeneChoice;D_gene;Undefined_side;5;d_gene\n{}\
         #Deletion;V_gene;Three_prime;5;v_3_del\n{}\
         #Deletion;D_gene;Five_prime;5;d_5_del\n{}\
         #Deletion;D_gene;Three_prime;5;d_3_del\n{}\
         #Deletion;J_gene;Five_prime;5;j_5_del\n{}\
         #Insertion;VD_genes;Undefined_side;4;vd_ins\n{}\
         #Insertion;DJ_gene;Undefined_side;2;dj_ins\n{}\
         #DinucMarkov;VD_genes;Undefined_side;3;vd_dinucl\n{}\
         #DinucMarkov;DJ_gene;Undefined_side;1;dj_dinucl\n{}",
        gene_records(v_names, |_| V_SEQ.to_string()),
        gene_records(j_names, |_| J_SEQ.to_string()),
        gene_records(d_names, |i| D_SEQS[i % D_SEQS.len()].to_string()),
        number_records(-2..=2),
        number_records(-1..=1),
        number_records(-1..=1),
        number_records(-2..=2),
        number_records(0..=3),
        number_records(0..=3),
        DINUC_RECORDS,
        DINUC_RECORDS,
    )
}

/// Marginal with the same distribution for every realization of its dependences
fn marginal(nickname: &str, dependences: &[&str], dims: &[usize], probs: &[f64]) -> String {
    assert_eq!(dims.len(), dependences.len() + 1);
    assert_eq!(*dims.last().unwrap(), probs.len());
    let values = format!("%{}\n", probs.iter().join(","));
    let mut out = format!("@{}\n$Dim[{}]\n", nickname, dims.iter().join(","));
    if dependences.is_empty() {
        out.push_str("#\n");
        out.push_str(&values);
        return out;
    }
    for combo in dims[..dims.len() - 1]
        .iter()
        .map(|&d| 0..d)
        .multi_cartesian_product()
    {
        let deps = dependences
            .iter()
            .zip(combo.iter())
            .map(|(d, i)| format!("[{},{}]", d, i))
            .join(",");
        out.push_str(&format!("#{}\n", deps));
        out.push_str(&values);
    }
    out
}

fn uniform(n: usize) -> Vec<f64> {
    vec![1. / n as f64; n]
}

const DELETIONS: [f64; 5] = [0.1, 0.2, 0.4, 0.2, 0.1];
const INSERTIONS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

#[allow(dead_code)]
pub fn vj_marginals(nv: usize, nj: usize) -> String {
    [
        marginal("v_choice", &[], &[nv], &uniform(nv)),
        marginal("j_choice", &["v_choice"], &[nv, nj], &uniform(nj)),
        marginal("v_3_del", &["v_choice"], &[nv, 5], &DELETIONS),
        marginal("j_5_del", &["j_choice"], &[nj, 5], &DELETIONS),
        marginal("vj_ins", &[], &[4], &INSERTIONS),
        marginal("vj_dinucl", &[], &[16], &uniform(16)),
    ]
    .concat()
}

#[allow(dead_code)]
pub fn vdj_marginals(nv: usize, nd: usize, nj: usize) -> String {
    [
        marginal("v_choice", &[], &[nv], &uniform(nv)),
        marginal("j_choice", &["v_choice"], &[nv, nj], &uniform(nj)),
        marginal("d_gene", &["v_choice", "j_choice"], &[nv, nj, nd], &uniform(nd)),
        marginal("v_3_del", &["v_choice"], &[nv, 5], &DELETIONS),
        marginal("d_5_del", &["d_gene"], &[nd, 3], &[0.3, 0.4, 0.3]),
        marginal("d_3_del", &["d_gene", "d_5_del"], &[nd, 3, 3], &[0.2, 0.5, 0.3]),
        marginal("j_5_del", &["j_choice"], &[nj, 5], &DELETIONS),
        marginal("vd_ins", &[], &[4], &INSERTIONS),
        marginal("dj_ins", &[], &[4], &INSERTIONS),
        marginal("vd_dinucl", &[], &[16], &uniform(16)),
        marginal("dj_dinucl", &[], &[16], &uniform(16)),
    ]
    .concat()
}

/// Anchor file content (header, then one line per gene)
#[allow(dead_code)]
pub fn anchors(names: &[String], position: usize, separator: char) -> String {
    let mut out = format!("gene{0}anchor_index{0}function\n", separator);
    for n in names {
        out.push_str(&format!("{1}{0}{2}{0}F\n", separator, n, position));
    }
    out
}

#[allow(dead_code)]
pub fn anchor_tables(v_names: &[String], j_names: &[String]) -> Vec<AnchorTable> {
    vec![
        AnchorTable::load(&anchors(v_names, V_ANCHOR, ','), GeneType::V, b',').unwrap(),
        AnchorTable::load(&anchors(j_names, J_ANCHOR, ','), GeneType::J, b',').unwrap(),
    ]
}

/// Initialized VJ model, 3 V genes (TRAV1-3) and 2 J genes (TRAJ1-2)
#[allow(dead_code)]
pub fn vj_model(with_anchors: bool) -> RecombinationModel {
    let (v, j) = (names("TRAV", 3), names("TRAJ", 2));
    let sources = ModelSources {
        parameters: vj_params(&v, &j),
        marginals: vj_marginals(v.len(), j.len()),
    };
    let anchors = with_anchors.then(|| anchor_tables(&v, &j));
    let mut model = RecombinationModel::build(Topology::VJ, &sources, anchors).unwrap();
    model.initialize().unwrap();
    model
}

/// Initialized VDJ model, 2 V (TRBV1-2), 2 D (TRBD1-2) and 2 J (TRBJ1-2)
#[allow(dead_code)]
pub fn vdj_model(with_anchors: bool) -> RecombinationModel {
    let (v, d, j) = (names("TRBV", 2), names("TRBD", 2), names("TRBJ", 2));
    let sources = ModelSources {
        parameters: vdj_params(&v, &d, &j),
        marginals: vdj_marginals(v.len(), d.len(), j.len()),
    };
    let anchors = with_anchors.then(|| anchor_tables(&v, &j));
    let mut model = RecombinationModel::build(Topology::VDJ, &sources, anchors).unwrap();
    model.initialize().unwrap();
    model
}

/// Files of the VJ model of `vj_model`, written in `dir`:
/// (parameters, marginals, V anchors, J anchors)
#[allow(dead_code)]
pub fn write_vj_files(
    dir: &std::path::Path,
    separator: char,
) -> std::io::Result<(PathBuf, PathBuf, PathBuf, PathBuf)> {
    let (v, j) = (names("TRAV", 3), names("TRAJ", 2));
    let paths = (
        dir.join("model_params.txt"),
        dir.join("model_marginals.txt"),
        dir.join("V_gene_CDR3_anchors.csv"),
        dir.join("J_gene_CDR3_anchors.csv"),
    );
    std::fs::create_dir_all(dir)?;
    std::fs::write(&paths.0, vj_params(&v, &j))?;
    std::fs::write(&paths.1, vj_marginals(v.len(), j.len()))?;
    std::fs::write(&paths.2, anchors(&v, V_ANCHOR, separator))?;
    std::fs::write(&paths.3, anchors(&j, J_ANCHOR, separator))?;
    Ok(paths)
}

/// Configuration writing everything under `root/vdjgen`
#[allow(dead_code)]
pub fn config(root: &std::path::Path) -> PipelineConfig {
    let working_dir = root.join("vdjgen");
    PipelineConfig {
        output_dir: working_dir.clone(),
        working_dir,
        threads: 1,
        seed: Some(7),
        ..PipelineConfig::default()
    }
}

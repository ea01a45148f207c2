mod common;

use anyhow::{anyhow, Result};
use std::fs;
use vdjgen::generate::pipeline::assemble_generated;
use vdjgen::shared::catalog::{ModelCatalog, CATALOG_FILE};
use vdjgen::shared::sampler::is_productive;
use vdjgen::{
    generate_cdr3, AnchorTable, Cdr3Generator, ChainType, Dna, Error, GeneType, MarginalSampler,
    ModelSources, ModelSpec, RecombinationModel, SampledCdr3, Sampler, Topology,
};

struct FixedSampler {
    result: Option<Vec<SampledCdr3>>,
}

impl Sampler for FixedSampler {
    fn sample(&mut self, _count: usize) -> anyhow::Result<Vec<SampledCdr3>> {
        self.result
            .take()
            .ok_or_else(|| anyhow!("marginals of v_choice do not sum to one"))
    }
}

fn cdr3(nt: &str, v: &str, j: &str) -> SampledCdr3 {
    SampledCdr3 {
        nucleotide: Dna::from_string(nt).unwrap(),
        v_gene: v.to_string(),
        j_gene: j.to_string(),
    }
}

#[test]
fn sample_vj_cdr3() -> Result<()> {
    let model = common::vj_model(true);
    let mut sampler = MarginalSampler::new(&model, Some(42))?;
    let sampled = sampler.sample(50)?;
    assert_eq!(sampled.len(), 50);
    let (v, j) = (common::names("TRAV", 3), common::names("TRAJ", 2));
    for s in &sampled {
        assert!(is_productive(&s.nucleotide));
        let nt = s.nucleotide.to_string();
        assert!(nt.starts_with("TGC"), "{}", nt);
        assert!(nt.ends_with("TTC"), "{}", nt);
        assert!(v.contains(&s.v_gene));
        assert!(j.contains(&s.j_gene));
    }
    Ok(())
}

#[test]
fn sample_vdj_cdr3() -> Result<()> {
    let model = common::vdj_model(true);
    let mut sampler = MarginalSampler::new(&model, Some(3))?;
    let sampled = sampler.sample(30)?;
    assert_eq!(sampled.len(), 30);
    for s in &sampled {
        assert!(is_productive(&s.nucleotide));
        assert!(s.nucleotide.translate().to_string().starts_with('C'));
        assert!(s.v_gene.starts_with("TRBV"));
        assert!(s.j_gene.starts_with("TRBJ"));
    }
    Ok(())
}

#[test]
fn same_seed_same_sequences() -> Result<()> {
    let model = common::vdj_model(true);
    let first = MarginalSampler::new(&model, Some(11))?.sample(20)?;
    let second = MarginalSampler::new(&model, Some(11))?.sample(20)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn productive_sequences() -> Result<()> {
    assert!(is_productive(&Dna::from_string("TGTGCCAGCTTC")?));
    // out of frame
    assert!(!is_productive(&Dna::from_string("TGTGCCAGCTT")?));
    // stop codon
    assert!(!is_productive(&Dna::from_string("TGTTAGTTC")?));
    // no cysteine
    assert!(!is_productive(&Dna::from_string("GCCAGCTTC")?));
    assert!(!is_productive(&Dna::from_string("")?));
    // the last residue must be a conserved J residue (F, V or W)
    assert!(is_productive(&Dna::from_string("TGTGCCAGCTGG")?));
    assert!(is_productive(&Dna::from_string("TGTGCCAGCGTC")?));
    assert!(!is_productive(&Dna::from_string("TGTGCCAGC")?));
    assert!(!is_productive(&Dna::from_string("TGTAAGAAGATA")?));
    Ok(())
}

/// VJ model (TRAV1-3, TRAJ1-2) with a custom J sequence and custom anchors
fn anchored_vj_model(j_seq: &str, v_anchors: &str, j_anchor: usize) -> Result<RecombinationModel> {
    let (v, j) = (common::names("TRAV", 3), common::names("TRAJ", 2));
    let sources = ModelSources {
        parameters: common::vj_params(&v, &j).replace(common::J_SEQ, j_seq),
        marginals: common::vj_marginals(3, 2),
    };
    let anchors = vec![
        AnchorTable::load(v_anchors, GeneType::V, b',')?,
        AnchorTable::load(&common::anchors(&j, j_anchor, ','), GeneType::J, b',')?,
    ];
    let mut model = RecombinationModel::build(Topology::VJ, &sources, Some(anchors))?;
    model.initialize()?;
    Ok(model)
}

#[test]
fn cdr3_ends_with_conserved_j_residue() -> Result<()> {
    // the J anchor (TTC) is reachable by the J 5' deletions
    let model = anchored_vj_model(
        "CTTCGGAGAAACAAAGACTTAT",
        &common::anchors(&common::names("TRAV", 3), common::V_ANCHOR, ','),
        1,
    )?;
    let sampled = MarginalSampler::new(&model, Some(5))?.sample(2000)?;
    assert_eq!(sampled.len(), 2000);
    for s in &sampled {
        let aa = s.nucleotide.translate().to_string();
        assert!(aa.ends_with(|c| matches!(c, 'F' | 'V' | 'W')), "{}", aa);
    }
    Ok(())
}

#[test]
fn incomplete_genes_are_never_sampled() -> Result<()> {
    // TRAV1 is anchored beyond the end of its sequence
    let v_anchors = format!(
        "gene,anchor_index,function\nTRAV1,100,F\nTRAV2,{0},F\nTRAV3,{0},F\n",
        common::V_ANCHOR
    );
    let model = anchored_vj_model(common::J_SEQ, &v_anchors, common::J_ANCHOR)?;
    let sampled = MarginalSampler::new(&model, Some(9))?.sample(5000)?;
    assert!(sampled.iter().all(|s| s.v_gene != "TRAV1"));
    assert!(sampled.iter().any(|s| s.v_gene == "TRAV2"));
    Ok(())
}

#[test]
fn cdr3_records() -> Result<()> {
    let model = common::vj_model(true);
    let records = Cdr3Generator::new(&model)?.generate(25, Some(1))?;
    assert_eq!(records.len(), 25);
    for (i, r) in records.iter().enumerate() {
        assert_eq!(r.sequence_index, i);
        assert_eq!(
            r.gene_names.keys().copied().collect::<Vec<_>>(),
            vec![GeneType::V, GeneType::J]
        );
        assert_eq!(r.nucleotide_sequence.len(), 3 * r.amino_acid_sequence.len());
    }
    Ok(())
}

#[test]
fn model_without_anchors() {
    let model = common::vj_model(false);
    match Cdr3Generator::new(&model) {
        Err(Error::ModelNotReady(message)) => assert!(message.contains("V and J")),
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("the model has no anchors"),
    }
}

#[test]
fn sampler_errors_are_wrapped() -> Result<()> {
    let model = common::vj_model(true);
    let generator = Cdr3Generator::new(&model)?;

    let mut failing = FixedSampler { result: None };
    match generator.generate_with(&mut failing, 2) {
        Err(Error::Generation(message)) => {
            assert!(message.contains("marginals of v_choice do not sum to one"))
        }
        other => panic!("unexpected result {:?}", other),
    }

    let mut short = FixedSampler {
        result: Some(vec![cdr3("TGTTTC", "TRAV1", "TRAJ1")]),
    };
    assert!(matches!(
        generator.generate_with(&mut short, 2),
        Err(Error::Generation(_))
    ));

    let mut fixed = FixedSampler {
        result: Some(vec![cdr3("TGTTTC", "TRAV1", "TRAJ1")]),
    };
    assert!(matches!(
        generator.generate_with(&mut fixed, 0),
        Err(Error::Generation(_))
    ));
    let records = generator.generate_with(&mut fixed, 1)?;
    assert_eq!(records[0].amino_acid_sequence, "CF");
    assert_eq!(records[0].gene_names[&GeneType::J], "TRAJ1");
    Ok(())
}

#[test]
fn catalog_resolution() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join(CATALOG_FILE),
        r#"[{"id": "test-alpha", "chain": "alpha", "species": "human",
             "filename_params": "model_params.txt",
             "filename_marginals": "model_marginals.txt",
             "filename_v_gene_cdr3_anchors": "V_gene_CDR3_anchors.csv",
             "filename_j_gene_cdr3_anchors": "J_gene_CDR3_anchors.csv"}]"#,
    )?;
    let catalog = ModelCatalog::load(dir.path())?;
    assert_eq!(catalog.records().len(), 1);
    let bundle = catalog.resolve("test-alpha")?;
    assert_eq!(bundle.chain, ChainType::Alpha);
    assert_eq!(
        bundle.marginals,
        dir.path().join("test-alpha").join("model_marginals.txt")
    );
    match catalog.resolve("human-t-gamma") {
        Err(Error::ModelFormat(message)) => assert!(message.contains("test-alpha")),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(ModelCatalog::load(&dir.path().join("missing")).is_err());
    Ok(())
}

#[test]
fn cdr3_from_custom_model() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (parameters, marginals, v_anchors, j_anchors) =
        common::write_vj_files(&dir.path().join("model"), ';')?;
    let mut config = common::config(dir.path());
    config.separator = b';';
    let spec = ModelSpec::Custom {
        chain: ChainType::Alpha,
        parameters,
        marginals,
        anchors: vec![(GeneType::V, v_anchors), (GeneType::J, j_anchors)],
    };

    let path = generate_cdr3(&spec, 10, &config)?;
    assert_eq!(path, config.output_dir.join("generated_seqs_alpha_CDR3.csv"));
    let mut reader = csv::ReaderBuilder::new().delimiter(b';').from_path(&path)?;
    assert_eq!(
        reader.headers()?.iter().collect::<Vec<_>>(),
        vec!["seq_index", "nt_sequence", "aa_sequence", "gene_choice_v", "gene_choice_j"]
    );
    assert_eq!(reader.records().count(), 10);

    // anchors are copied with the canonical separator
    let copied = fs::read_to_string(config.anchors_dir().join("V_gene_CDR3_anchors.csv"))?;
    assert!(copied.starts_with("gene,anchor_index,function"));

    let second = generate_cdr3(&spec, 10, &config)?;
    assert_eq!(second, config.output_dir.join("generated_seqs_alpha_CDR3_1.csv"));

    config.output_name = Some("my_cdr3s".to_string());
    assert_eq!(
        generate_cdr3(&spec, 1, &config)?,
        config.output_dir.join("my_cdr3s.csv")
    );
    Ok(())
}

#[test]
fn cdr3_from_installed_model() -> Result<()> {
    let dir = tempfile::tempdir()?;
    common::write_vj_files(&dir.path().join("models").join("test-alpha"), ',')?;
    fs::write(
        dir.path().join("models").join(CATALOG_FILE),
        r#"[{"id": "test-alpha", "chain": "alpha", "species": "human",
             "filename_params": "model_params.txt",
             "filename_marginals": "model_marginals.txt",
             "filename_v_gene_cdr3_anchors": "V_gene_CDR3_anchors.csv",
             "filename_j_gene_cdr3_anchors": "J_gene_CDR3_anchors.csv"}]"#,
    )?;
    let mut config = common::config(dir.path());
    config.model_dir = dir.path().join("models");

    let path = generate_cdr3(&ModelSpec::Bundle("test-alpha".to_string()), 5, &config)?;
    assert_eq!(fs::read_to_string(path)?.lines().count(), 6);
    assert!(matches!(
        generate_cdr3(&ModelSpec::Bundle("test-beta".to_string()), 5, &config),
        Err(Error::ModelFormat(_))
    ));
    assert!(matches!(
        generate_cdr3(&ModelSpec::Bundle("test-alpha".to_string()), 0, &config),
        Err(Error::Generation(_))
    ));
    Ok(())
}

#[test]
fn assemble_generated_tables() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let generated = dir.path().join("generated");
    fs::create_dir_all(&generated)?;
    fs::write(
        generated.join("generated_seqs_noerr.csv"),
        "seq_index;nt_sequence\n0;TGTGCCAGC\n1;TGA\n",
    )?;
    fs::write(
        generated.join("generated_realizations_noerr.csv"),
        "seq_index;GeneChoice_V_gene_Undefined_side_prio7_size3;GeneChoice_J_gene_Undefined_side_prio6_size2\n\
         1;(0);(1)\n\
         0;(2);(0)\n",
    )?;
    let model = common::vj_model(false);
    let records = assemble_generated(&model, &generated)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].amino_acid_sequence, "CAS");
    assert_eq!(records[0].gene_names[&GeneType::V], "TRAV3");
    assert_eq!(records[1].gene_names[&GeneType::J], "TRAJ2");

    assert!(matches!(
        assemble_generated(&model, &dir.path().join("nothing")),
        Err(Error::TableFormat(_))
    ));
    Ok(())
}

mod common;

use std::path::PathBuf;
use vdjgen::generate::{IgorCommand, IgorInterface};

#[test]
fn igor_command_line() {
    let igor = IgorInterface::new(
        "igor",
        vec![
            IgorCommand::SetWd(PathBuf::from("wd")),
            IgorCommand::Threads(4),
            IgorCommand::SetCustomModel {
                parameters: PathBuf::from("p.txt"),
                marginals: PathBuf::from("m.txt"),
            },
            IgorCommand::Generate {
                count: 10,
                noerr: true,
            },
        ],
    );
    assert_eq!(
        igor.to_string(),
        "igor -set_wd wd -threads 4 -set_custom_model p.txt m.txt -generate 10 --noerr"
    );
    assert_eq!(
        IgorCommand::Generate {
            count: 3,
            noerr: false
        }
        .args(),
        vec!["-generate", "3"]
    );
}

// Scripts standing in for the simulator are written and run from a single
// test, a concurrent fork could keep them open for writing
#[cfg(unix)]
#[test]
fn full_length_generation() -> anyhow::Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use vdjgen::{generate_full_length, ChainType, Error, ModelSpec};

    let dir = tempfile::tempdir()?;
    let (parameters, marginals, _, _) = common::write_vj_files(&dir.path().join("model"), ',')?;
    let spec = ModelSpec::Custom {
        chain: ChainType::Alpha,
        parameters,
        marginals,
        anchors: vec![],
    };
    let script = |name: &str, body: &str| -> std::io::Result<String> {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path.display().to_string())
    };
    let mut config = common::config(dir.path());

    // no simulator
    config.igor_executable = dir.path().join("no-igor").display().to_string();
    assert!(matches!(
        generate_full_length(&spec, 3, &config),
        Err(Error::SimulatorNotFound(_))
    ));
    assert!(!config.output_dir.join("generated_seqs_alpha.csv").exists());

    // failing simulator
    config.igor_executable = script("failing-igor", "echo 'Unknown option' >&2\nexit 3\n")?;
    match generate_full_length(&spec, 3, &config) {
        Err(Error::Simulator { exit_code, stderr }) => {
            assert_eq!(exit_code, Some(3));
            assert_eq!(stderr, "Unknown option");
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert!(!config.output_dir.join("generated_seqs_alpha.csv").exists());

    // -set_wd is the first option, the tables go to its generated directory
    config.igor_executable = script(
        "fake-igor",
        "mkdir -p \"$2/generated\"\n\
         printf 'seq_index;nt_sequence\\n0;TGTGCCAGC\\n1;TGA\\n2;ATGAAACCCTA\\n' > \"$2/generated/generated_seqs_noerr.csv\"\n\
         printf 'seq_index;GeneChoice_V_gene_Undefined_side_prio7_size3;GeneChoice_J_gene_Undefined_side_prio6_size2\\n0;(2);(0)\\n1;(1);(1)\\n2;(0);(1)\\n' > \"$2/generated/generated_realizations_noerr.csv\"\n\
         echo done\n",
    )?;
    let path = generate_full_length(&spec, 3, &config)?;
    assert_eq!(path, config.output_dir.join("generated_seqs_alpha.csv"));
    assert_eq!(
        fs::read_to_string(&path)?,
        "seq_index,nt_sequence,aa_sequence,gene_choice_v,gene_choice_j\n\
         0,TGTGCCAGC,CAS,TRAV3,TRAJ1\n\
         1,TGA,*,TRAV2,TRAJ2\n\
         2,ATGAAACCCTA,MKP,TRAV1,TRAJ2\n"
    );
    // the custom model files are copied to the working directory
    assert!(config.working_dir.join("model_params.txt").exists());
    assert!(config.working_dir.join("model_marginals.txt").exists());
    Ok(())
}

//! Loading a parallel treebank from disk and writing run outputs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use treealign::{extended_stem, FoldRole, FoldRun, FoldStems, Side};

use crate::errors::{TigerError, TigerResult};
use crate::paths::resolve_treebank_path;
use crate::sta::StaDocument;
use crate::tiger::TigerDocument;

/// Names of the fold listing files.
pub const TRAIN_LISTING: &str = "train_folds.txt";
pub const TEST_LISTING: &str = "test_folds.txt";

pub fn read_file(path: &Path) -> TigerResult<String> {
    fs::read_to_string(path).map_err(|e| TigerError::io(path, e))
}

pub fn write_file(path: &Path, content: &str) -> TigerResult<()> {
    fs::write(path, content).map_err(|e| TigerError::io(path, e))?;
    info!(path = %path.display(), "wrote");
    Ok(())
}

pub fn load_treebank(path: &Path) -> TigerResult<TigerDocument> {
    TigerDocument::parse(&read_file(path)?)
}

pub fn load_alignment(path: &Path) -> TigerResult<StaDocument> {
    StaDocument::parse(&read_file(path)?)
}

/// An alignment document together with both treebanks it references.
#[derive(Debug, Clone)]
pub struct ParallelCorpus {
    pub alignment_path: PathBuf,
    pub alignment: StaDocument,
    pub source_path: PathBuf,
    pub source: TigerDocument,
    pub target_path: PathBuf,
    pub target: TigerDocument,
}

impl ParallelCorpus {
    /// Load `alignment_path` and the treebanks it references.
    pub fn load(alignment_path: &Path) -> TigerResult<Self> {
        Self::load_with(alignment_path, None, None)
    }

    /// Like [`ParallelCorpus::load`], with explicit treebank paths taking
    /// precedence over the references in the alignment file.
    pub fn load_with(
        alignment_path: &Path,
        source_path: Option<&Path>,
        target_path: Option<&Path>,
    ) -> TigerResult<Self> {
        let alignment = load_alignment(alignment_path)?;
        let resolve = |side: Side, explicit: Option<&Path>| -> TigerResult<PathBuf> {
            match explicit {
                Some(path) => Ok(path.to_path_buf()),
                None => resolve_treebank_path(
                    &alignment.alignment.treebank(side).filename,
                    alignment_path,
                ),
            }
        };
        let source_path = resolve(Side::Source, source_path)?;
        let target_path = resolve(Side::Target, target_path)?;

        let source = load_treebank(&source_path)?;
        let target = load_treebank(&target_path)?;
        info!(
            source = %source_path.display(),
            target = %target_path.display(),
            alignments = alignment.alignment.pairs.len(),
            "loaded parallel treebank"
        );

        Ok(Self {
            alignment_path: alignment_path.to_path_buf(),
            alignment,
            source_path,
            source,
            target_path,
            target,
        })
    }

    /// Stems used to name fold outputs.
    pub fn stems(&self) -> FoldStems {
        FoldStems::from_paths(
            &self.source_path.to_string_lossy(),
            &self.target_path.to_string_lossy(),
            &self.alignment_path.to_string_lossy(),
        )
    }

    pub fn document(&self, side: Side) -> &TigerDocument {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Write every fold artifact (and optionally the listings) to `outdir`.
    ///
    /// Returns the written paths in write order.
    pub fn write_folds(
        &self,
        run: &FoldRun,
        outdir: &Path,
        write_listings: bool,
    ) -> TigerResult<Vec<PathBuf>> {
        fs::create_dir_all(outdir).map_err(|e| TigerError::io(outdir, e))?;
        let mut written = Vec::new();

        for artifact in &run.artifacts {
            let outputs = [
                (&artifact.names.source, self.source.render_treebank(&artifact.source)?),
                (&artifact.names.target, self.target.render_treebank(&artifact.target)?),
                (&artifact.names.alignment, self.alignment.render_alignment(&artifact.alignment)?),
            ];
            for (name, content) in outputs {
                let path = outdir.join(name);
                write_file(&path, &content)?;
                written.push(path);
            }
        }

        if write_listings {
            for (name, role) in [(TRAIN_LISTING, FoldRole::Train), (TEST_LISTING, FoldRole::Test)] {
                let path = outdir.join(name);
                write_file(&path, &run.listing(role))?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Write the current (normalized) documents as `<stem>_normalized.xml`.
    ///
    /// The alignment written points at the normalized treebank files.
    pub fn write_normalized(&self, outdir: &Path) -> TigerResult<Vec<PathBuf>> {
        fs::create_dir_all(outdir).map_err(|e| TigerError::io(outdir, e))?;
        let name = |path: &Path| format!("{}_normalized.xml", extended_stem(&path.to_string_lossy()));

        let source_name = name(&self.source_path);
        let target_name = name(&self.target_path);
        let mut alignment = self.alignment.alignment.clone();
        alignment.source.filename = source_name.clone();
        alignment.target.filename = target_name.clone();

        let outputs = [
            (source_name.clone(), self.source.render()?),
            (target_name.clone(), self.target.render()?),
            (name(&self.alignment_path), self.alignment.render_alignment(&alignment)?),
        ];
        let mut written = Vec::new();
        for (file, content) in outputs {
            let path = outdir.join(file);
            write_file(&path, &content)?;
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use treealign::{generate_folds, validate_alignment, FoldConfig, FoldInputs};

    fn treebank_xml(count: usize) -> String {
        let mut body = String::new();
        for n in 1..=count {
            body.push_str(&format!(
                r#"<s id="s{n}"><graph root="s{n}_500"><terminals><t id="s{n}_1" word="w{n}"/></terminals><nonterminals><nt id="s{n}_500" cat="S"><edge label="HD" idref="s{n}_1"/></nt></nonterminals></graph></s>"#,
                n = n
            ));
        }
        format!(r#"<corpus id="c"><head/><body>{}</body></corpus>"#, body)
    }

    fn alignment_xml(count: usize) -> String {
        let mut aligns = String::new();
        for n in 1..=count {
            aligns.push_str(&format!(
                r#"<align type="good"><node treebank_id="de" node_id="s{n}_1"/><node treebank_id="ka" node_id="s{n}_1"/></align>"#,
                n = n
            ));
        }
        format!(
            r#"<treealign><head/><treebanks><treebank id="de" filename="de.xml"/><treebank id="ka" filename="ka.xml"/></treebanks><alignments>{}</alignments></treealign>"#,
            aligns
        )
    }

    fn write_corpus(dir: &Path, count: usize) -> PathBuf {
        fs::write(dir.join("de.xml"), treebank_xml(count)).unwrap();
        fs::write(dir.join("ka.xml"), treebank_xml(count)).unwrap();
        let alignment = dir.join("ALM.xml");
        fs::write(&alignment, alignment_xml(count)).unwrap();
        alignment
    }

    #[test]
    fn test_load_resolves_treebanks_next_to_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = ParallelCorpus::load(&write_corpus(dir.path(), 3)).unwrap();

        assert_eq!(corpus.source.treebank.len(), 3);
        assert_eq!(corpus.target.treebank.len(), 3);
        assert!(corpus.source_path.ends_with("de.xml"));
        let stems = corpus.stems();
        assert_eq!(stems.source, "de");
        assert_eq!(stems.alignment, "ALM");
        assert!(validate_alignment(
            &corpus.alignment.alignment,
            &corpus.source.treebank,
            &corpus.target.treebank
        )
        .is_valid());
    }

    #[test]
    fn test_write_folds() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = ParallelCorpus::load(&write_corpus(dir.path(), 4)).unwrap();
        let stems = corpus.stems();
        let inputs = FoldInputs {
            source: &corpus.source.treebank,
            target: &corpus.target.treebank,
            alignment: &corpus.alignment.alignment,
            stems: &stems,
        };
        let config = FoldConfig {
            count: 2,
            shuffle: false,
            ..FoldConfig::default()
        };
        let run = generate_folds(inputs, &config, &mut StdRng::seed_from_u64(1)).unwrap();

        let outdir = dir.path().join("folds");
        let written = corpus.write_folds(&run, &outdir, true).unwrap();
        assert_eq!(written.len(), 2 * 2 * 3 + 2);

        let test_alignment = outdir.join("ALM.rand1.test.xml");
        let reloaded = ParallelCorpus::load(&test_alignment).unwrap();
        assert_eq!(reloaded.source_path, outdir.join("de.rand1.test.xml").canonicalize().unwrap());
        assert_eq!(
            reloaded.source.treebank.sentence_ids().collect::<Vec<_>>(),
            vec!["s1", "s2"]
        );
        assert_eq!(reloaded.alignment.alignment.pairs.len(), 2);

        let listing = fs::read_to_string(outdir.join(TEST_LISTING)).unwrap();
        assert_eq!(listing, "s1;s1 s2;s2\ns3;s3 s4;s4\n");
    }

    #[test]
    fn test_write_normalized_points_at_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = ParallelCorpus::load(&write_corpus(dir.path(), 1)).unwrap();
        let outdir = dir.path().join("out");

        let written = corpus.write_normalized(&outdir).unwrap();
        assert_eq!(
            written,
            vec![
                outdir.join("de_normalized.xml"),
                outdir.join("ka_normalized.xml"),
                outdir.join("ALM_normalized.xml"),
            ]
        );

        let reloaded = ParallelCorpus::load(&outdir.join("ALM_normalized.xml")).unwrap();
        assert_eq!(reloaded.alignment.alignment.source.filename, "de_normalized.xml");
        assert_eq!(reloaded.alignment.alignment.pairs, corpus.alignment.alignment.pairs);
    }

    #[test]
    fn test_missing_treebank() {
        let dir = tempfile::tempdir().unwrap();
        let alignment = write_corpus(dir.path(), 1);
        fs::remove_file(dir.path().join("ka.xml")).unwrap();

        match ParallelCorpus::load(&alignment) {
            Err(TigerError::TreebankNotFound { filename }) => assert_eq!(filename, "ka.xml"),
            other => panic!("expected TreebankNotFound, got {:?}", other.map(|c| c.source_path)),
        }
    }
}

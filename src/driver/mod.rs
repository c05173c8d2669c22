// src/driver/mod.rs
use anyhow::{Context, Result};
use glob::{glob, Pattern};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use crate::{
    clean::Pipeline,
    table::{read_table, write_table},
};

pub mod inspect;

pub use inspect::{inspect_all, TableSummary};

/// Which file a subfolder contributes to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// `*with-meta*.csv`, never an already-cleaned file.
    Raw,
    /// `*with-meta-clean.csv`.
    Clean,
}

impl Input {
    pub fn pattern(self) -> &'static str {
        match self {
            Input::Raw => "*with-meta*.csv",
            Input::Clean => "*with-meta-clean.csv",
        }
    }
}

/// Immediate subdirectories of `parent` (symlinks followed), sorted by name.
pub fn subfolders(parent: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(parent)
        .with_context(|| format!("listing data directory {}", parent.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", parent.display()))?;
        let path = entry.path();
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if meta.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// The first file in `dir` matching the input's pattern.
pub fn find_meta_file(dir: &Path, input: Input) -> Result<Option<PathBuf>> {
    let pattern = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), input.pattern());
    for entry in glob(&pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
        let path = entry?;
        if input == Input::Raw && is_clean_file(&path) {
            continue;
        }
        return Ok(Some(path));
    }
    Ok(None)
}

fn is_clean_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("-clean.csv"))
}

/// `foo-with-meta.csv` → `foo-with-meta-clean.csv`, same directory.
pub fn clean_output_path(raw: &Path) -> PathBuf {
    let stem = raw
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    raw.with_file_name(format!("{}-clean.csv", stem))
}

/// Outcome of a run over every subfolder.
#[derive(Debug, Default)]
pub struct RunReport {
    pub folders: usize,
    /// Files written.
    pub written: Vec<PathBuf>,
    /// Subfolders without a matching input file.
    pub skipped: Vec<PathBuf>,
    /// Input files whose processing failed, with the error chain.
    pub failed: Vec<(PathBuf, String)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run `pipeline` over one file, returning where the result was written.
#[tracing::instrument(level = "info", skip(pipeline, input), fields(path = %input.display()))]
pub fn process_file(pipeline: &Pipeline, input: &Path) -> Result<PathBuf> {
    let table = read_table(input)?;
    let out = pipeline.run(table)?;
    let dest = if pipeline.starts_from_raw() {
        clean_output_path(input)
    } else {
        input.to_path_buf()
    };
    write_table(&out, &dest)?;
    let (rows, cols) = out.shape();
    info!(dest = %dest.display(), rows, cols, "cleaned");
    Ok(dest)
}

/// Apply `pipeline` to the matching file of every subfolder of `parent`.
/// A failing file is recorded and the run moves on.
pub fn run_all(parent: &Path, pipeline: &Pipeline) -> Result<RunReport> {
    let folders = subfolders(parent)?;
    let input = if pipeline.starts_from_raw() {
        Input::Raw
    } else {
        Input::Clean
    };
    info!(
        folders = folders.len(),
        stages = ?pipeline.kinds(),
        "processing {}",
        parent.display()
    );

    let mut report = RunReport {
        folders: folders.len(),
        ..Default::default()
    };
    for dir in folders {
        let file = match find_meta_file(&dir, input)? {
            Some(f) => f,
            None => {
                warn!(dir = %dir.display(), "no {} file", input.pattern());
                report.skipped.push(dir);
                continue;
            }
        };
        match process_file(pipeline, &file) {
            Ok(dest) => report.written.push(dest),
            Err(e) => {
                error!(path = %file.display(), "failed: {:#}", e);
                report.failed.push((file, format!("{:#}", e)));
            }
        }
    }

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "run complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{MissingDatePolicy, StageKind};
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const RAW: &str = "date,position,song,artist,track_id,popularity,duration_ms,is_explicit,album_id,release_date,genres,uri\n\
                       2021-07-01,1,A,X,,70,200000,1,,,,spotify:a\n\
                       2021-07-08,2,B,Y,t2,60,190000,0,a2,2018,\"Latin, Reggaeton\",spotify:b\n";

    #[test]
    fn clean_output_path_inserts_suffix() {
        assert_eq!(
            clean_output_path(Path::new("/d/usa/usa-with-meta.csv")),
            PathBuf::from("/d/usa/usa-with-meta-clean.csv")
        );
    }

    #[test]
    fn raw_lookup_ignores_cleaned_files() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("uk-with-meta-clean.csv"), "x\n").unwrap();
        assert_eq!(find_meta_file(dir, Input::Raw).unwrap(), None);

        fs::write(dir.join("uk-with-meta.csv"), "x\n").unwrap();
        assert_eq!(
            find_meta_file(dir, Input::Raw).unwrap(),
            Some(dir.join("uk-with-meta.csv"))
        );
        assert_eq!(
            find_meta_file(dir, Input::Clean).unwrap(),
            Some(dir.join("uk-with-meta-clean.csv"))
        );
    }

    #[test]
    fn missing_parent_is_fatal() {
        let tmp = tempdir().unwrap();
        let err = run_all(&tmp.path().join("absent"), &Pipeline::full()).unwrap_err();
        assert!(format!("{:#}", err).contains("listing data directory"));
    }

    #[test]
    fn runs_every_folder_and_skips_empty_ones() {
        init_logging();
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        for country in ["japan", "spain"] {
            fs::create_dir(root.join(country)).unwrap();
            fs::write(root.join(country).join(format!("{}-with-meta.csv", country)), RAW)
                .unwrap();
        }
        fs::create_dir(root.join("world")).unwrap();
        fs::write(root.join("notes.txt"), "not a folder").unwrap();

        let report = run_all(root, &Pipeline::full()).unwrap();
        assert_eq!(report.folders, 3);
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.skipped, vec![root.join("world")]);
        assert!(report.is_success());

        let produced: Vec<_> = glob(&format!("{}/*/*-clean.csv", root.display()))
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(produced.len(), 2);

        let text = fs::read_to_string(root.join("japan/japan-with-meta-clean.csv")).unwrap();
        assert!(text.starts_with('\u{feff}'));
        assert!(!text.contains("uri"));
        assert!(text.contains(
            "2021-07-01,1,A,X,unknown_track,70,200000,1,unknown_album,2021-01-01,unknown,unknown"
        ));
        assert!(text.contains("2018-01-01,\"latin, reggaeton\",latin"));

        // raw files are left alone
        assert_eq!(
            fs::read_to_string(root.join("japan/japan-with-meta.csv")).unwrap(),
            RAW
        );
    }

    #[test]
    fn later_stages_overwrite_clean_file_in_place() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("mexico");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("mexico-with-meta.csv"), RAW).unwrap();

        let policy = MissingDatePolicy::Skip;
        let project = Pipeline::new(&[StageKind::Project], policy).unwrap();
        let rest = Pipeline::new(&[StageKind::Nulls, StageKind::Standardize], policy).unwrap();

        let first = run_all(tmp.path(), &project).unwrap();
        let clean = dir.join("mexico-with-meta-clean.csv");
        assert_eq!(first.written, vec![clean.clone()]);
        let projected = fs::read_to_string(&clean).unwrap();
        assert!(!projected.contains("main_genre"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            assert_eq!(fs::metadata(&clean).unwrap().permissions().mode() & 0o777, 0o644);
            fs::set_permissions(&clean, fs::Permissions::from_mode(0o664)).unwrap();
        }

        let second = run_all(tmp.path(), &rest).unwrap();
        assert_eq!(second.written, vec![clean.clone()]);
        let finished = fs::read_to_string(&clean).unwrap();
        assert!(finished.contains("main_genre"));
        assert!(finished.contains("unknown_track"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            assert_eq!(fs::metadata(&clean).unwrap().permissions().mode() & 0o777, 0o664);
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_country_folder_is_listed() {
        let tmp = tempdir().unwrap();
        let parent = tmp.path().join("top50");
        let target = tmp.path().join("elsewhere");
        fs::create_dir(&parent).unwrap();
        fs::create_dir(&target).unwrap();
        fs::create_dir(parent.join("france")).unwrap();
        fs::write(parent.join("notes.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&target, parent.join("usa")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), parent.join("dangling")).unwrap();
        fs::write(target.join("usa-with-meta.csv"), RAW).unwrap();

        assert_eq!(
            subfolders(&parent).unwrap(),
            vec![parent.join("france"), parent.join("usa")]
        );
        let report = run_all(&parent, &Pipeline::full()).unwrap();
        assert_eq!(report.written, vec![parent.join("usa/usa-with-meta-clean.csv")]);
        assert!(target.join("usa-with-meta-clean.csv").exists());
    }

    #[test]
    fn bad_flag_fails_one_folder_only() {
        init_logging();
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("a")).unwrap();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(
            root.join("a/a-with-meta.csv"),
            "date,track_id,is_explicit\n2020-01-01,t,maybe\n",
        )
        .unwrap();
        fs::write(root.join("b/b-with-meta.csv"), RAW).unwrap();

        let report = run_all(root, &Pipeline::full()).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].1.contains("is_explicit"));
        assert!(!root.join("a/a-with-meta-clean.csv").exists());
        assert!(root.join("b/b-with-meta-clean.csv").exists());
    }
}

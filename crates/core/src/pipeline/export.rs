use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::batch_dispatcher::BatchResult;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to export {from} to {to}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Copies each input's processed output to `directory/<name><ext>`.
///
/// `inputs` and `names` are paired in the original submission order, not the
/// order the batch finished in. The extension comes from the output file.
/// Inputs with no output in `result` are skipped. Returns the written paths.
pub fn export_outputs(
    inputs: &[PathBuf],
    result: &BatchResult,
    names: &[String],
    directory: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    if inputs.len() != names.len() {
        log::warn!(
            "Got {} names for {} inputs; extra entries are ignored",
            names.len(),
            inputs.len()
        );
    }

    fs::create_dir_all(directory).map_err(|source| ExportError::Io {
        from: PathBuf::new(),
        to: directory.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for (input, name) in inputs.iter().zip(names) {
        let Some(output) = result.output_for(input) else {
            log::warn!("No output for {}; skipping export", input.display());
            continue;
        };

        let mut file_name = name.clone();
        if let Some(ext) = output.extension().and_then(|e| e.to_str()) {
            file_name.push('.');
            file_name.push_str(ext);
        }
        let target = directory.join(file_name);

        fs::copy(output, &target).map_err(|source| ExportError::Io {
            from: output.to_path_buf(),
            to: target.clone(),
            source,
        })?;
        log::info!("Saved {} as {}", output.display(), target.display());
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::batch_config::{BatchConfig, ParallelConfig};
    use crate::pipeline::batch_dispatcher::BatchDispatcher;
    use crate::pipeline::media_processor::{BlurJob, MediaProcessor};
    use crate::pipeline::process_error::ProcessError;
    use crate::shared::media_item::MediaItem;
    use std::sync::Arc;

    /// Pretends every input is already its own output.
    struct IdentityProcessor;

    impl MediaProcessor for IdentityProcessor {
        fn process(&self, item: &MediaItem, _job: &BlurJob) -> Result<PathBuf, ProcessError> {
            if item.path.exists() {
                Ok(item.path.clone())
            } else {
                Err(ProcessError::decode(&item.path, "missing"))
            }
        }
    }

    fn batch(inputs: &[PathBuf]) -> BatchResult {
        let config = BatchConfig {
            parallel_processing: ParallelConfig { max_workers: 2 },
            ..BatchConfig::default()
        };
        BatchDispatcher::new(&config, Arc::new(IdentityProcessor))
            .run(inputs, &BlurJob::default())
            .unwrap()
    }

    #[test]
    fn test_names_follow_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.mp4");
        fs::write(&a, b"first").unwrap();
        fs::write(&b, b"second").unwrap();
        let inputs = vec![a, b];
        let result = batch(&inputs);

        let save_dir = dir.path().join("saved");
        let names = vec!["holiday".to_string(), "party".to_string()];
        let written = export_outputs(&inputs, &result, &names, &save_dir).unwrap();

        assert_eq!(
            written,
            vec![save_dir.join("holiday.png"), save_dir.join("party.mp4")]
        );
        assert_eq!(fs::read(save_dir.join("holiday.png")).unwrap(), b"first");
        assert_eq!(fs::read(save_dir.join("party.mp4")).unwrap(), b"second");
    }

    #[test]
    fn test_failed_items_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        fs::write(&a, b"ok").unwrap();
        let inputs = vec![dir.path().join("gone.jpg"), a];
        let result = batch(&inputs);

        let save_dir = dir.path().join("saved");
        let names = vec!["one".to_string(), "two".to_string()];
        let written = export_outputs(&inputs, &result, &names, &save_dir).unwrap();

        assert_eq!(written, vec![save_dir.join("two.png")]);
        assert!(!save_dir.join("one.jpg").exists());
    }

    #[test]
    fn test_unwritable_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let err = export_outputs(&[], &BatchResult::default(), &[], &blocker.join("sub"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}

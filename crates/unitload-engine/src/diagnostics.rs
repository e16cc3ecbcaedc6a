//! Chain diagnostics: per-stage logging and on-disk dumps
use std::path::{Component, Path, PathBuf};
use unitload_config::DebugOptions;
use unitload_core::{ChainObserver, StageSnapshot, UnitName};

const DUMP_DIR_NAME: &str = "unitload_dump";
const MAX_DUMP_DIR_SUFFIX: usize = 10;

/// Observer installed when debugging is enabled.
///
/// Plain mode writes the chain output as `<remapped path>`. Finer mode
/// writes `<remapped path>_000_pretransform` and one
/// `<remapped path>_NNN_<stage id>` per stage that changed the bytes.
#[derive(Debug)]
pub struct DumpObserver {
    dir: Option<PathBuf>,
    finer: bool,
    slim: bool,
}

impl DumpObserver {
    pub fn new(options: &DebugOptions) -> Self {
        let dir = if options.saves() {
            choose_dump_dir(&options.dump_dir)
        } else {
            None
        };
        if let Some(dir) = &dir {
            tracing::info!(dir = %dir.display(), "dumping transformed units");
        }

        Self {
            dir,
            finer: options.finer(),
            slim: options.slim,
        }
    }

    /// Where dumps go; `None` when saving is off or no directory was free.
    pub fn dump_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn write(&self, remapped: &UnitName, suffix: Option<String>, bytes: &[u8]) {
        let Some(dir) = &self.dir else {
            return;
        };

        let mut file_name = remapped.resource_path();
        if let Some(suffix) = suffix {
            file_name.push_str(&suffix);
        }
        if !is_plain_relative(&file_name) {
            tracing::warn!(unit = %remapped, path = %file_name, "dump path escapes dump directory, skipped");
            return;
        }
        let path = dir.join(file_name);

        let result = path
            .parent()
            .map(std::fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|()| std::fs::write(&path, bytes));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "could not write dump");
        }
    }
}

impl ChainObserver for DumpObserver {
    fn chain_started(&self, _name: &UnitName, remapped: &UnitName, input: &[u8], stage_count: usize) {
        if self.finer && !(self.slim && stage_count == 0) {
            self.write(remapped, Some("_000_pretransform".to_string()), input);
        }
    }

    fn stage_completed(&self, snapshot: &StageSnapshot<'_>) {
        if self.finer {
            tracing::trace!(
                unit = %snapshot.name,
                stage = snapshot.stage_id,
                before = snapshot.before.len(),
                after = snapshot.after.len(),
                changed = snapshot.changed(),
                latency_us = snapshot.latency_us,
                "stage completed"
            );
            if snapshot.changed() {
                let suffix = format!(
                    "_{:03}_{}",
                    snapshot.index,
                    snapshot.stage_id.replace(['/', '\\'], "_")
                );
                self.write(snapshot.remapped, Some(suffix), snapshot.after);
            }
        }
    }

    fn chain_finished(&self, _name: &UnitName, remapped: &UnitName, original: &[u8], output: &[u8]) {
        if !self.finer && !(self.slim && original == output) {
            self.write(remapped, None, output);
        }
    }
}

fn is_plain_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// First of `unitload_dump`, `unitload_dump1` … `unitload_dump10` that does
/// not exist yet, created.
fn choose_dump_dir(parent: &Path) -> Option<PathBuf> {
    for suffix in 0..=MAX_DUMP_DIR_SUFFIX {
        let candidate = if suffix == 0 {
            parent.join(DUMP_DIR_NAME)
        } else {
            parent.join(format!("{}{}", DUMP_DIR_NAME, suffix))
        };
        if candidate.exists() {
            continue;
        }
        return match std::fs::create_dir_all(&candidate) {
            Ok(()) => Some(candidate),
            Err(e) => {
                tracing::warn!(dir = %candidate.display(), error = %e, "could not create dump directory");
                None
            }
        };
    }

    tracing::info!(parent = %parent.display(), "all dump directories exist, saving disabled");
    None
}

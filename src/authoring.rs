//! Offline authoring helpers behind the `--build-slices`, `--init-progress`
//! and `--clear-progress` command line flags.
//!
//! - `slices.txt` lists the start frame of every slice, one integer per line.
//!   [`build_slices`] turns it into the slice table of `scene.json`, keeping
//!   the rules of slices that were already authored.
//! - [`init_progress`] registers every slice of a scene in the progress file
//!   as not completed, [`clear_progress`] forgets them again.

use std::error::Error;
use std::path::Path;

use log::{error, info, warn};

use crate::resources::progress::ProgressStore;
use crate::resources::scene::{
    SCENE_MANIFEST, SceneManifest, default_slice_name, scan_scene, scene_name,
};
use crate::resources::slicetable::Slice;

pub const SLICE_BOUNDARIES_FILE: &str = "slices.txt";

/// Parse newline separated start frames. Blank lines are skipped, malformed
/// lines are logged and skipped.
pub fn parse_slice_boundaries(text: &str) -> Vec<u32> {
    let mut starts = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<u32>() {
            Ok(start) => starts.push(start),
            Err(e) => error!(
                "{}:{}: invalid slice start '{}': {}",
                SLICE_BOUNDARIES_FILE,
                number + 1,
                line,
                e
            ),
        }
    }
    starts
}

pub fn read_slice_boundaries(path: &Path) -> Result<Vec<u32>, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(parse_slice_boundaries(&text))
}

/// Derive slice `i` as `starts[i]..=starts[i + 1] - 1`.
///
/// Slices already present in `existing` keep their rules and only get the new
/// frame range. New slices auto-pass into the next slice and retry themselves
/// on failure; the final slice is terminal.
pub fn derive_slices(
    scene: &str,
    starts: &[u32],
    existing: &[Slice],
    region_count: usize,
) -> Result<Vec<Slice>, String> {
    let count = starts.len().saturating_sub(1);
    if region_count == 0 && count > 1 {
        warn!(
            "Scene '{}' has no hotspot regions; its {} slices will not validate until ButtonFrames folders are added",
            scene, count
        );
    }
    let mut slices = Vec::with_capacity(count);
    for (i, pair) in starts.windows(2).enumerate() {
        let (first, next_start) = (pair[0], pair[1]);
        if next_start <= first {
            return Err(format!(
                "Slice starts must increase: {} is followed by {}",
                first, next_start
            ));
        }
        let last = next_start - 1;
        let slice = match existing.get(i) {
            Some(authored) => Slice {
                first_frame: first,
                last_frame: last,
                ..authored.clone()
            },
            None => {
                let mut slice = Slice::new(default_slice_name(scene, i), first, last);
                if i + 1 == count {
                    slice.is_last_slice = true;
                } else {
                    slice.next_slice = vec![i + 1; region_count];
                    slice.fail_slice = i;
                }
                slice
            }
        };
        slices.push(slice);
    }
    if existing.len() > count {
        warn!(
            "Dropping {} authored slice(s) past the last boundary",
            existing.len() - count
        );
    }
    Ok(slices)
}

/// Rebuild the slice table of the scene in `scene_dir` from its `slices.txt`.
/// Returns the number of slices written.
pub fn build_slices(scene_dir: &Path) -> Result<usize, Box<dyn Error>> {
    let assets = scan_scene(scene_dir)?;
    let starts = read_slice_boundaries(&scene_dir.join(SLICE_BOUNDARIES_FILE))?;
    let manifest_path = assets.manifest_path();
    let mut manifest = if manifest_path.exists() {
        SceneManifest::load_from_file(&manifest_path)?
    } else {
        SceneManifest::default()
    };
    manifest.slices = derive_slices(&assets.name, &starts, &manifest.slices, assets.regions.len())?;
    manifest.fill_slice_names(&assets.name);
    manifest.save_to_file(&manifest_path)?;
    info!(
        "Wrote {} slices to {}",
        manifest.slices.len(),
        manifest_path.display()
    );
    Ok(manifest.slices.len())
}

fn slice_names(scene_dir: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let name = scene_name(scene_dir)?;
    let mut manifest = SceneManifest::load_from_file(scene_dir.join(SCENE_MANIFEST))?;
    manifest.fill_slice_names(&name);
    Ok(manifest.slices.into_iter().map(|s| s.name).collect())
}

/// Add every slice of the scene to the progress file as not completed.
/// Returns the number of keys added.
pub fn init_progress(scene_dir: &Path, progress_path: &Path) -> Result<usize, Box<dyn Error>> {
    let names = slice_names(scene_dir)?;
    let mut store = ProgressStore::load(progress_path);
    let added = store.ensure_keys(names.iter().map(String::as_str));
    store.flush()?;
    info!(
        "Progress file {} now tracks {} slices ({} added)",
        progress_path.display(),
        store.total(),
        added
    );
    Ok(added)
}

/// Remove every slice of the scene from the progress file.
/// Returns the number of keys removed.
pub fn clear_progress(scene_dir: &Path, progress_path: &Path) -> Result<usize, Box<dyn Error>> {
    let names = slice_names(scene_dir)?;
    let mut store = ProgressStore::load(progress_path);
    let removed = store.remove(names.iter().map(String::as_str));
    store.flush()?;
    info!(
        "Removed {} slice(s) from {}",
        removed,
        progress_path.display()
    );
    Ok(removed)
}

//! TypeScript bindings for the snapshot types a UI consumes.

use crate::boundary::BoundaryMode;
use crate::config::HighlightColor;
use crate::highlight::{HighlightGranularity, HighlightKind};
use crate::session::{HighlightSpanView, ReadAloudSnapshot};
use crate::speech::{PauseSource, PlaybackState};
use crate::voice::{Voice, VoiceInstallStatus, VoiceNotification};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<String> {
    let name = T::name();
    T::export_all_to(out_dir).with_context(|| format!("Failed to export {name}"))?;
    Ok(name)
}

/// Write every exported type plus an `index.ts` re-exporting them. Stale
/// `.ts` files in `out_dir` are removed first.
pub fn export_ts_bindings(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for entry in
        fs::read_dir(out_dir).with_context(|| format!("Failed to list {}", out_dir.display()))?
    {
        let path = entry.context("Failed to read entry")?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }

    let names = [
        export_single_type::<ReadAloudSnapshot>(out_dir)?,
        export_single_type::<HighlightSpanView>(out_dir)?,
        export_single_type::<HighlightKind>(out_dir)?,
        export_single_type::<HighlightGranularity>(out_dir)?,
        export_single_type::<HighlightColor>(out_dir)?,
        export_single_type::<BoundaryMode>(out_dir)?,
        export_single_type::<PlaybackState>(out_dir)?,
        export_single_type::<PauseSource>(out_dir)?,
        export_single_type::<Voice>(out_dir)?,
        export_single_type::<VoiceInstallStatus>(out_dir)?,
        export_single_type::<VoiceNotification>(out_dir)?,
    ];

    let index_content: String = names
        .iter()
        .map(|name| format!("export type {{ {name} }} from \"./{name}\";\n"))
        .collect();
    let index_path = out_dir.join("index.ts");
    fs::write(&index_path, index_content)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;

    Ok(())
}

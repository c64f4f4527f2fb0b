use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

/// Write rendered output to a file atomically so a reader never sees a
/// partial report.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write output to {}", path.display()))?;
    if !content.ends_with('\n') {
        file.write_all(b"\n")
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
    }

    file.commit()
        .with_context(|| format!("Failed to save output to {}", path.display()))?;

    Ok(())
}

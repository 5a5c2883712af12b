/// The three one-shot pipelines.  Each one loads its input completely before
/// touching the output directory, so a failed load writes nothing.
pub mod car_price;
pub mod iris;
pub mod unemployment;

use std::path::PathBuf;

fn list_outputs(f: &mut std::fmt::Formatter<'_>, outputs: &[PathBuf]) -> std::fmt::Result {
    for path in outputs {
        writeln!(f, "  wrote {}", path.display())?;
    }
    Ok(())
}

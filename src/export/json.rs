use crate::core::payments::TaskPayment;
use crate::errors::AppResult;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn write_json(path: &Path, details: &[TaskPayment]) -> AppResult<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, details)?;
    Ok(())
}

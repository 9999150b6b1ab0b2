use std::env;
use std::path::PathBuf;

use pgcensus_core::{Report, validate_report};
use pgcensus_report::{render_report, write_workbook};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut report_path: Option<PathBuf> = None;
    let mut out_dir = PathBuf::from(".");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-dir" => {
                out_dir = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or("missing --out-dir value")?;
            }
            _ => {
                if report_path.is_none() {
                    report_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let report_path = report_path.ok_or("missing path to a run's report.json")?;
    let artifact: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path)?)?;
    let report: Report = serde_json::from_value(artifact["report"].clone())?;
    validate_report(&report)?;

    let rendered = render_report(&report);
    let path = out_dir.join(&rendered.file_name);
    write_workbook(&rendered, &path)?;

    println!("workbook_path={}", path.display());
    Ok(())
}

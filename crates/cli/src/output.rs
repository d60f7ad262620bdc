use crate::error::CliError;
use engine_config::report::summary::RunReport;

fn report_json(report: &RunReport) -> Result<String, CliError> {
    serde_json::to_string_pretty(report).map_err(CliError::JsonSerialize)
}

pub async fn write_report(report: &RunReport, path: String) -> Result<(), CliError> {
    let json = report_json(report)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_report(report: &RunReport) -> Result<(), CliError> {
    println!("{}", report_json(report)?);
    Ok(())
}

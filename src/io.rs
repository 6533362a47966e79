use crate::model::{MemberRow, ScheduleRequest};
use crate::scheduler::Solution;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Lecture d'une requête JSON (`schedule`, `option`, `numSolutions`).
pub fn load_request<P: AsRef<Path>>(path: P) -> anyhow::Result<ScheduleRequest> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let request: ScheduleRequest = serde_json::from_slice(&data)
        .with_context(|| format!("parsing request {}", path.display()))?;
    Ok(request)
}

/// Import de grille depuis CSV: header `name,1,2,...`, une case par jour (vide = à décider)
pub fn import_grid_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<MemberRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    if headers.get(0).map(str::trim) != Some("name") {
        bail!("grid header must start with `name`");
    }

    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid grid row {} (empty name)", line + 1);
        }
        let mut days: Vec<String> = rec.iter().skip(1).map(|c| c.trim().to_string()).collect();
        while days.last().is_some_and(String::is_empty) {
            days.pop();
        }
        out.push(MemberRow {
            name: name.to_string(),
            days,
        });
    }
    Ok(out)
}

/// Export CSV des plannings: header `schedule,name,1,2,...` (schedule = index 1-based)
pub fn export_schedules_csv<P: AsRef<Path>>(path: P, schedules: &[Solution]) -> anyhow::Result<()> {
    let num_days = schedules
        .iter()
        .flat_map(|s| s.rows.iter().map(|r| r.days.len()))
        .max()
        .unwrap_or(0);

    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    let mut header = vec!["schedule".to_string(), "name".to_string()];
    header.extend((1..=num_days).map(|d| d.to_string()));
    w.write_record(&header)?;

    for (index, solution) in schedules.iter().enumerate() {
        let schedule = (index + 1).to_string();
        for row in &solution.rows {
            let mut record = vec![schedule.as_str(), row.name.as_str()];
            record.extend((0..num_days).map(|d| row.days.get(d).map_or("", String::as_str)));
            w.write_record(&record)?;
        }
    }
    w.flush()?;
    Ok(())
}

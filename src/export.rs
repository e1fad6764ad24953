use std::io::Write;

use chrono::{NaiveDate, SecondsFormat};

use crate::models::Incident;

pub const HEADER: [&str; 8] = [
    "ID",
    "Type",
    "Location",
    "Severity",
    "Status",
    "Timestamp",
    "Reporter",
    "Coordinates",
];

/// Writes one row per incident. The coordinates column always contains a
/// comma, so the writer always quotes it.
pub fn write_csv<W: Write>(incidents: &[Incident], writer: W) -> anyhow::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv.write_record(HEADER)?;

    for incident in incidents {
        let timestamp = incident
            .reported_at
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let coordinates = format!("{},{}", incident.position.lat, incident.position.lon);
        let hazard_type = incident.hazard_type.to_string();
        let severity = incident.severity.to_string();
        let status = incident.status.to_string();
        let record: [&str; 8] = [
            incident.id.as_str(),
            hazard_type.as_str(),
            incident.location.as_deref().unwrap_or(""),
            severity.as_str(),
            status.as_str(),
            timestamp.as_str(),
            incident.reporter.as_str(),
            coordinates.as_str(),
        ];
        csv.write_record(record)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn to_csv_string(incidents: &[Incident]) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    write_csv(incidents, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn default_file_name(today: NaiveDate) -> String {
    format!("reports-{}.csv", today.format("%Y-%m-%d"))
}

//! CSV parsing and report rendering.
//!
//! Exports quote every field and double embedded quotes. Import is
//! deliberately forgiving about row content (defaults, not failures) but
//! strict about the header row: a missing Name or Phone column aborts the
//! whole operation before any write, naming the missing requirement.

use ascend_core::{AppError, AppResult};
use ascend_domain::metrics::employee_performance;
use ascend_domain::{Activity, Employee, InterestLevel, Lead, Prospect, ProspectStatus, UserProfile};
use chrono::{DateTime, Utc};

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|error| AppError::Internal(format!("csv flush failed: {error}")))?;
    String::from_utf8(bytes).map_err(|error| AppError::Internal(format!("csv not UTF-8: {error}")))
}

fn write_row(writer: &mut csv::Writer<Vec<u8>>, fields: &[String]) -> AppResult<()> {
    writer
        .write_record(fields)
        .map_err(|error| AppError::Internal(format!("csv row write failed: {error}")))
}

fn display_name(employees: &[Employee], id: Option<&ascend_core::EmployeeId>) -> String {
    let Some(id) = id else {
        return "Unassigned".to_owned();
    };

    employees
        .iter()
        .find(|employee| &employee.id == id)
        .map(|employee| employee.full_name.clone())
        .unwrap_or_else(|| "Unknown".to_owned())
}

/// All-prospects report.
pub fn export_prospects_csv(prospects: &[Prospect], employees: &[Employee]) -> AppResult<String> {
    let mut writer = writer();
    write_row(
        &mut writer,
        &[
            "Name".to_owned(),
            "Phone".to_owned(),
            "Email".to_owned(),
            "Status".to_owned(),
            "Lead Source".to_owned(),
            "Assigned To".to_owned(),
            "Created At".to_owned(),
        ],
    )?;
    for prospect in prospects {
        write_row(
            &mut writer,
            &[
                prospect.name.clone(),
                prospect.phone.clone(),
                prospect.email.clone(),
                prospect.status.as_str().to_owned(),
                prospect.lead_source.as_str().to_owned(),
                display_name(employees, prospect.assigned_to.as_ref()),
                prospect
                    .created_at
                    .map(|created| created.to_rfc3339())
                    .unwrap_or_default(),
            ],
        )?;
    }

    finish(writer)
}

/// Status-count analysis report.
pub fn export_status_counts_csv(prospects: &[Prospect]) -> AppResult<String> {
    let mut writer = writer();
    write_row(&mut writer, &["Status".to_owned(), "Count".to_owned()])?;
    for (status, count) in ascend_domain::metrics::status_distribution(prospects) {
        write_row(&mut writer, &[status.as_str().to_owned(), count.to_string()])?;
    }

    finish(writer)
}

/// Lead-source analysis report.
pub fn export_source_counts_csv(prospects: &[Prospect]) -> AppResult<String> {
    let mut writer = writer();
    write_row(&mut writer, &["Lead Source".to_owned(), "Count".to_owned()])?;
    for (source, count) in ascend_domain::metrics::source_distribution(prospects) {
        write_row(&mut writer, &[source.as_str().to_owned(), count.to_string()])?;
    }

    finish(writer)
}

/// Raw-leads report.
pub fn export_leads_csv(leads: &[Lead]) -> AppResult<String> {
    let mut writer = writer();
    write_row(
        &mut writer,
        &[
            "Name".to_owned(),
            "Phone".to_owned(),
            "Email".to_owned(),
            "Location".to_owned(),
            "Date".to_owned(),
        ],
    )?;
    for lead in leads {
        write_row(
            &mut writer,
            &[
                lead.name.clone(),
                lead.phone.clone(),
                lead.email.clone(),
                lead.location.clone(),
                lead.submitted_at
                    .map(|submitted| submitted.to_rfc3339())
                    .unwrap_or_default(),
            ],
        )?;
    }

    finish(writer)
}

/// Activity-log report.
pub fn export_activities_csv(
    activities: &[Activity],
    employees: &[Employee],
) -> AppResult<String> {
    let mut writer = writer();
    write_row(
        &mut writer,
        &[
            "User".to_owned(),
            "Details".to_owned(),
            "Timestamp".to_owned(),
        ],
    )?;
    for activity in activities {
        write_row(
            &mut writer,
            &[
                display_name(employees, Some(&activity.user_id)),
                activity.details.clone(),
                activity.timestamp.to_rfc3339(),
            ],
        )?;
    }

    finish(writer)
}

/// Employee-performance report (assignments, conversions, rate).
pub fn export_performance_csv(
    employees: &[Employee],
    prospects: &[Prospect],
) -> AppResult<String> {
    let mut writer = writer();
    write_row(
        &mut writer,
        &[
            "Employee".to_owned(),
            "Total Leads Assigned".to_owned(),
            "Conversions".to_owned(),
            "Conversion Rate".to_owned(),
        ],
    )?;
    for row in employee_performance(employees, prospects) {
        write_row(
            &mut writer,
            &[
                row.name,
                row.assigned.to_string(),
                row.conversions.to_string(),
                format!("{:.1}%", row.conversion_rate_pct),
            ],
        )?;
    }

    finish(writer)
}

struct HeaderIndexes {
    name: usize,
    phone: usize,
    email: Option<usize>,
    interest: Option<usize>,
    location: Option<usize>,
}

fn header_indexes(headers: &csv::StringRecord) -> AppResult<HeaderIndexes> {
    let find = |wanted: &str| {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(wanted))
    };

    let name = find("name").ok_or_else(|| {
        AppError::ImportFormat("CSV must contain a 'Name' column".to_owned())
    })?;
    let phone = find("phone").ok_or_else(|| {
        AppError::ImportFormat("CSV must contain a 'Phone' column".to_owned())
    })?;

    Ok(HeaderIndexes {
        name,
        phone,
        email: find("email"),
        interest: find("interest"),
        location: find("location"),
    })
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|index| record.get(index))
        .map(str::trim)
        .unwrap_or_default()
        .to_owned()
}

/// Parses an import CSV into prospects stamped for the importing user.
///
/// Row defaults: status new, interest medium (anything unparsable included),
/// location "Unknown", empty email kept empty, assignment and ownership set
/// to the importer. Rows with fewer than two fields are skipped.
pub fn parse_prospects_csv(
    text: &str,
    importer: &UserProfile,
    now: DateTime<Utc>,
) -> AppResult<Vec<Prospect>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| AppError::ImportFormat(format!("CSV header row unreadable: {error}")))?
        .clone();
    let indexes = header_indexes(&headers)?;

    let mut prospects = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|error| AppError::ImportFormat(format!("CSV row unreadable: {error}")))?;
        if record.len() < 2 {
            continue;
        }

        let location = field(&record, indexes.location);
        prospects.push(Prospect {
            id: String::new(),
            name: field(&record, Some(indexes.name)),
            phone: field(&record, Some(indexes.phone)),
            email: field(&record, indexes.email),
            age: None,
            occupation: String::new(),
            instagram: String::new(),
            location: if location.is_empty() {
                "Unknown".to_owned()
            } else {
                location
            },
            status: ProspectStatus::New,
            interest_level: InterestLevel::from_loose(&field(&record, indexes.interest)),
            lead_source: ascend_domain::LeadSource::Other,
            follow_up_date: None,
            team_id: importer.team_id().cloned(),
            assigned_to: Some(importer.employee_id().clone()),
            owner_id: Some(importer.employee_id().clone()),
            created_by: Some(importer.employee_id().clone()),
            created_at: Some(now),
            updated_at: Some(now),
            notes: "Imported via CSV".to_owned(),
        });
    }

    Ok(prospects)
}

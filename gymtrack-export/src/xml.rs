/// XML rendering of the usage log
///
/// ```text
/// <?xml version="1.0" encoding="utf-8"?>
/// <GymUsageData>
///   <UsageEntry>
///     <user_name>Sam</user_name>
///     ...
///     <age>35</age>
///     <age_group>30–44</age_group>
///   </UsageEntry>
/// </GymUsageData>
/// ```
///
/// Missing values are written as empty elements. The whole document is built
/// in memory so a failure never leaves a half-written file behind.

use crate::{
    age::{calculate_age, AgeGroup},
    error::ExportError,
    query::UsageExportRow,
};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

pub const ROOT_ELEMENT: &str = "GymUsageData";
pub const ENTRY_ELEMENT: &str = "UsageEntry";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Element name and text for each field of one entry, in document order
fn entry_fields(row: &UsageExportRow, today: NaiveDate) -> [(&'static str, String); 11] {
    let age = row.dob.and_then(|dob| calculate_age(dob, today));

    [
        ("user_name", row.user_name.clone()),
        ("email", row.email.clone()),
        ("sex", row.sex.clone().unwrap_or_default()),
        ("dob", row.dob.map(|d| d.to_string()).unwrap_or_default()),
        ("equipment_name", row.equipment_name.clone()),
        ("equipment_type", row.equipment_type.clone()),
        ("usage_date", format_timestamp(row.usage_date)),
        (
            "end_usage_date",
            row.end_usage_date.map(format_timestamp).unwrap_or_default(),
        ),
        (
            "hours_used",
            row.hours_used.map(|h| format!("{:.2}", h)).unwrap_or_default(),
        ),
        (
            "age",
            age.map(|a| a.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        ),
        ("age_group", AgeGroup::from_age(age).label().to_string()),
    ]
}

fn write_field(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<(), ExportError> {
    if value.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

/// Renders `rows` into a UTF-8 XML document
///
/// Ages are computed as of `today`.
pub fn render_usage_xml(rows: &[UsageExportRow], today: NaiveDate) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;

    for row in rows {
        writer.write_event(Event::Start(BytesStart::new(ENTRY_ELEMENT)))?;
        for (name, value) in entry_fields(row, today) {
            write_field(&mut writer, name, &value)?;
        }
        writer.write_event(Event::End(BytesEnd::new(ENTRY_ELEMENT)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;

    let mut document = writer.into_inner();
    document.push(b'\n');
    Ok(document)
}

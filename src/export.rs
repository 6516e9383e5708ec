use crate::models::booking::BookingRecord;

/// Render a snapshot as the downloadable booking summary: header
/// `Date,Desk,Booked By`, one row per booking, in snapshot order. The header
/// is written explicitly so an empty snapshot still exports a valid table.
pub fn to_csv(records: &[BookingRecord]) -> Result<String, String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(["Date", "Desk", "Booked By"])
        .map_err(|err| format!("failed to write CSV header: {}", err))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| format!("failed to encode CSV row: {}", err))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| format!("failed to finish CSV: {}", err))?;
    String::from_utf8(bytes).map_err(|err| format!("CSV was not UTF-8: {}", err))
}

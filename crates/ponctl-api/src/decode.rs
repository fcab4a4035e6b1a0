// Response decoding
//
// UNM answers arrive as a fixed text envelope: a block of header lines,
// tab-separated data rows, then a short footer. The offsets below are a
// property of the vendor's envelope, not something the device reports,
// so undersized input is rejected loudly instead of sliced blindly.

use tracing::trace;

use crate::error::{Error, FormatError};
use crate::models::{OnuSummary, OpticalInfo};

/// Non-empty lines preceding the data rows of an `LST-OMDDM` response.
pub const HEADER_LINES: usize = 8;
/// Non-empty lines following the data rows.
pub const FOOTER_LINES: usize = 2;
/// Minimum fields in an optical data row.
pub const OPTICAL_COLUMNS: usize = 13;
/// Exact field count of an `LST-ONU` row.
pub const ONU_LIST_COLUMNS: usize = 12;
/// First field of the `LST-ONU` column-title row.
pub const LIST_HEADER_TOKEN: &str = "OLTID";

const ERROR_MARKER: &str = "EADD=";

/// Scan a response for the server error marker.
///
/// `EADD=<message>` with a non-empty message (rest of the line, trimmed)
/// is a device-side failure even though the exchange itself succeeded.
pub fn check_response(response: &str) -> Result<(), Error> {
    let Some(start) = response.find(ERROR_MARKER) else {
        return Ok(());
    };

    let tail = &response[start + ERROR_MARKER.len()..];
    let message = tail.split('\n').next().unwrap_or_default().trim();

    if message.is_empty() {
        return Ok(());
    }
    Err(Error::from_server_message(message.to_owned()))
}

/// Non-empty, trimmed lines with carriage returns removed.
fn content_lines(response: &str) -> Vec<&str> {
    response
        .split('\n')
        .map(|line| line.trim_matches(|c: char| c == '\r' || c.is_whitespace()))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Decode the measurement row of an `LST-OMDDM` response.
pub fn decode_optical_info(response: &str) -> Result<OpticalInfo, Error> {
    let lines = content_lines(response);

    if lines.len() <= HEADER_LINES {
        return Err(FormatError::InsufficientData {
            found: lines.len(),
            required: HEADER_LINES,
        }
        .into());
    }

    let data_end = lines.len().saturating_sub(FOOTER_LINES);
    let Some(row) = lines
        .get(HEADER_LINES..data_end)
        .and_then(|rows| rows.first())
    else {
        return Err(FormatError::InsufficientData {
            found: lines.len(),
            required: HEADER_LINES + FOOTER_LINES,
        }
        .into());
    };

    let fields: Vec<&str> = row.split('\t').collect();
    let [
        onu_id,
        rx_power,
        rx_power_status,
        tx_power,
        tx_power_status,
        tx_bias,
        tx_bias_status,
        temperature,
        temperature_status,
        voltage,
        voltage_status,
        peer_tx_power,
        peer_rx_power,
        ..,
    ] = fields.as_slice()
    else {
        return Err(FormatError::MissingColumns {
            expected: OPTICAL_COLUMNS,
            found: fields.len(),
        }
        .into());
    };

    Ok(OpticalInfo {
        onu_id: (*onu_id).to_owned(),
        rx_power: (*rx_power).to_owned(),
        rx_power_status: (*rx_power_status).to_owned(),
        tx_power: (*tx_power).to_owned(),
        tx_power_status: (*tx_power_status).to_owned(),
        tx_bias: (*tx_bias).to_owned(),
        tx_bias_status: (*tx_bias_status).to_owned(),
        temperature: (*temperature).to_owned(),
        temperature_status: (*temperature_status).to_owned(),
        voltage: (*voltage).to_owned(),
        voltage_status: (*voltage_status).to_owned(),
        peer_tx_power: (*peer_tx_power).to_owned(),
        peer_rx_power: (*peer_rx_power).to_owned(),
    })
}

/// Decode every ONU row of an `LST-ONU` response.
///
/// Rows that do not have exactly twelve fields, and the column-title row,
/// are skipped. `filter` keeps only rows whose name or description
/// contains it, ignoring case. Never fails: a bad row costs only itself.
pub fn decode_onu_list(response: &str, filter: Option<&str>) -> Vec<OnuSummary> {
    let filter = filter
        .map(str::to_lowercase)
        .filter(|needle| !needle.is_empty());

    response
        .split('\n')
        .enumerate()
        .filter_map(|(line_no, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let row = parse_onu_row(line);
            if row.is_none() {
                trace!(line_no, "skipping header or malformed ONU row");
            }
            row
        })
        .filter(|onu| {
            filter.as_deref().is_none_or(|needle| {
                onu.name.to_lowercase().contains(needle)
                    || onu.description.to_lowercase().contains(needle)
            })
        })
        .collect()
}

fn parse_onu_row(line: &str) -> Option<OnuSummary> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    let [
        olt_id,
        pon_id,
        onu_no,
        name,
        description,
        onu_type,
        ip,
        auth_type,
        mac,
        loid,
        password,
        software_version,
    ] = fields.as_slice()
    else {
        return None;
    };

    if *olt_id == LIST_HEADER_TOKEN {
        return None;
    }

    Some(OnuSummary {
        olt_id: (*olt_id).to_owned(),
        pon_id: (*pon_id).to_owned(),
        onu_no: (*onu_no).to_owned(),
        name: (*name).to_owned(),
        description: (*description).to_owned(),
        onu_type: (*onu_type).to_owned(),
        ip: (*ip).to_owned(),
        auth_type: (*auth_type).to_owned(),
        mac: (*mac).to_owned(),
        loid: (*loid).to_owned(),
        password: (*password).to_owned(),
        software_version: (*software_version).to_owned(),
    })
}

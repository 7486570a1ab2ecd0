//! X-Plane UDP datagram codecs.
//!
//! All multi-byte fields are little-endian.
//!
//! | Message | Layout |
//! |---------|--------|
//! | `RREF` request  | `"RREF\0"` + i32 frequency + i32 client index + dataref path, NUL-padded to 400 |
//! | `RREF` response | `"RREF,"` + repeated (i32 index, f32 value) records |
//! | `DREF` write    | `"DREF\0"` + f32 value + dataref path, NUL-padded to 500 |
//! | `CMND` execute  | `"CMND\0"` + command path |
//! | `BECN` beacon   | `"BECN\0"` + version/role/port header + computer name |

use crate::error::SimulatorError;

pub const RREF_PATH_LEN: usize = 400;
pub const DREF_PATH_LEN: usize = 500;
const HEADER_LEN: usize = 5;
const RREF_RECORD_LEN: usize = 8;

/// Unsubscribe frequency for `RREF` requests.
pub const RREF_FREQ_OFF: i32 = 0;

fn checked_path(path: &str, max_len: usize) -> Result<&[u8], SimulatorError> {
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        return Err(SimulatorError::BadDataref {
            path: path.to_string(),
            reason: "empty path",
        });
    }
    if bytes.len() >= max_len {
        return Err(SimulatorError::BadDataref {
            path: path.to_string(),
            reason: "path too long",
        });
    }
    if bytes.contains(&0) {
        return Err(SimulatorError::BadDataref {
            path: path.to_string(),
            reason: "embedded NUL",
        });
    }
    Ok(bytes)
}

/// Encode an `RREF` subscription request. `frequency` is updates per
/// second; zero unsubscribes the index.
pub fn encode_rref_request(
    frequency: i32,
    index: i32,
    dataref: &str,
) -> Result<Vec<u8>, SimulatorError> {
    let path = checked_path(dataref, RREF_PATH_LEN)?;
    let mut datagram = Vec::with_capacity(HEADER_LEN + 8 + RREF_PATH_LEN);
    datagram.extend_from_slice(b"RREF\0");
    datagram.extend_from_slice(&frequency.to_le_bytes());
    datagram.extend_from_slice(&index.to_le_bytes());
    datagram.extend_from_slice(path);
    datagram.resize(HEADER_LEN + 8 + RREF_PATH_LEN, 0);
    Ok(datagram)
}

/// One subscribed value in an `RREF` response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RrefRecord {
    pub index: i32,
    pub value: f32,
}

/// Whether a datagram is an `RREF` response.
pub fn is_rref_response(data: &[u8]) -> bool {
    data.len() >= HEADER_LEN && &data[..4] == b"RREF"
}

/// Parse the records of an `RREF` response datagram. Trailing bytes that
/// do not form a whole record are rejected.
pub fn parse_rref_response(data: &[u8]) -> Result<Vec<RrefRecord>, SimulatorError> {
    if !is_rref_response(data) {
        return Err(SimulatorError::MalformedDatagram {
            message_type: "RREF",
            reason: "missing header",
        });
    }
    let body = &data[HEADER_LEN..];
    if body.len() % RREF_RECORD_LEN != 0 {
        return Err(SimulatorError::MalformedDatagram {
            message_type: "RREF",
            reason: "truncated record",
        });
    }
    Ok(body
        .chunks_exact(RREF_RECORD_LEN)
        .map(|record| RrefRecord {
            index: i32::from_le_bytes([record[0], record[1], record[2], record[3]]),
            value: f32::from_le_bytes([record[4], record[5], record[6], record[7]]),
        })
        .collect())
}

/// Encode a `DREF` dataref write.
pub fn encode_dref_write(value: f32, dataref: &str) -> Result<Vec<u8>, SimulatorError> {
    let path = checked_path(dataref, DREF_PATH_LEN)?;
    let mut datagram = Vec::with_capacity(HEADER_LEN + 4 + DREF_PATH_LEN);
    datagram.extend_from_slice(b"DREF\0");
    datagram.extend_from_slice(&value.to_le_bytes());
    datagram.extend_from_slice(path);
    datagram.resize(HEADER_LEN + 4 + DREF_PATH_LEN, 0);
    Ok(datagram)
}

/// Encode a `CMND` command execution.
pub fn encode_cmnd(command: &str) -> Result<Vec<u8>, SimulatorError> {
    let path = checked_path(command, DREF_PATH_LEN)?;
    let mut datagram = Vec::with_capacity(HEADER_LEN + path.len());
    datagram.extend_from_slice(b"CMND\0");
    datagram.extend_from_slice(path);
    Ok(datagram)
}

/// A discovery beacon announced by a running simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub major_version: u8,
    pub minor_version: u8,
    pub application_host_id: i32,
    pub version_number: i32,
    pub role: u32,
    pub port: u16,
    pub computer_name: String,
}

/// Parse a `BECN` multicast datagram.
pub fn parse_beacon(data: &[u8]) -> Result<Beacon, SimulatorError> {
    let malformed = |reason| SimulatorError::MalformedDatagram {
        message_type: "BECN",
        reason,
    };
    if data.len() < HEADER_LEN || &data[..4] != b"BECN" {
        return Err(malformed("missing header"));
    }
    let body = &data[HEADER_LEN..];
    if body.len() < 16 {
        return Err(malformed("short body"));
    }
    let computer_name = body[16..]
        .split(|b| *b == 0)
        .next()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();
    Ok(Beacon {
        major_version: body[0],
        minor_version: body[1],
        application_host_id: i32::from_le_bytes([body[2], body[3], body[4], body[5]]),
        version_number: i32::from_le_bytes([body[6], body[7], body[8], body[9]]),
        role: u32::from_le_bytes([body[10], body[11], body[12], body[13]]),
        port: u16::from_le_bytes([body[14], body[15]]),
        computer_name,
    })
}

use serde::{Deserialize, Serialize};

use crate::domain::{CrossRecord, SessionId, StockRecord, VialStatus};

/// A serial port the scan backend can listen on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub index: usize,
    pub device: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartScanRequest {
    pub port_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartScanResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopScanRequest {
    pub session_id: SessionId,
}

/// Status observation committed against the record identified by
/// `unique_id`. An empty comment is omitted rather than sent as "".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipRequest {
    pub unique_id: String,
    pub status: VialStatus,
    pub flip_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipAck {
    pub message: String,
}

/// One print run over the cart: identifiers and per-identifier quantities in
/// cart order, plus trailing blank label positions on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelBatchRequest {
    pub unique_ids: Vec<String>,
    pub quantities: Vec<u32>,
    pub blank_spaces: u32,
}

/// Push events delivered by the scan backend while a session is listening.
/// `NotRecognized` carries no payload: the code decoded but matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ScanEvent {
    StockScanned(StockRecord),
    CrossScanned(CrossRecord),
    NotRecognized,
}

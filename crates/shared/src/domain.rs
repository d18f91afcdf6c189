use chrono::Local;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(SessionId);

/// Observation recorded against a vial or cross when it is flipped.
/// Serialized as the strings the flip form and the label generator use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VialStatus {
    #[default]
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "Showing Issues")]
    ShowingIssues,
    #[serde(rename = "Needs refresh")]
    NeedsRefresh,
}

impl VialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VialStatus::Healthy => "Healthy",
            VialStatus::ShowingIssues => "Showing Issues",
            VialStatus::NeedsRefresh => "Needs refresh",
        }
    }
}

/// Minute-precision local wall-clock format, no timezone offset. Matches the
/// datetime-local form field the operator sees and edits.
pub const FLIP_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn local_flip_time_now() -> String {
    Local::now().format(FLIP_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "trayID")]
    pub tray_id: String,
    #[serde(rename = "trayPosition")]
    pub tray_position: String,
    #[serde(rename = "uniqueID")]
    pub unique_id: String,
    #[serde(rename = "seriesID")]
    pub series_id: String,
    #[serde(rename = "replicateID")]
    pub replicate_id: String,
    pub name: String,
    pub genotype: String,
    pub status: VialStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRecord {
    #[serde(rename = "trayID")]
    pub tray_id: String,
    #[serde(rename = "trayPosition")]
    pub tray_position: String,
    #[serde(rename = "uniqueID")]
    pub unique_id: String,
    #[serde(rename = "maleGenotype")]
    pub male_genotype: String,
    #[serde(rename = "femaleGenotype")]
    pub female_genotype: String,
    pub name: String,
    pub status: VialStatus,
}

/// A record resolved from a scanned QR code. Stock vials and crosses carry
/// different attributes but share the identity used for flip commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedRecord {
    Stock(StockRecord),
    Cross(CrossRecord),
}

impl ScannedRecord {
    /// The only field guaranteed non-empty; identifies the record in flip
    /// commits.
    pub fn unique_id(&self) -> &str {
        match self {
            ScannedRecord::Stock(stock) => &stock.unique_id,
            ScannedRecord::Cross(cross) => &cross.unique_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ScannedRecord::Stock(stock) => &stock.name,
            ScannedRecord::Cross(cross) => &cross.name,
        }
    }

    pub fn status(&self) -> VialStatus {
        match self {
            ScannedRecord::Stock(stock) => stock.status,
            ScannedRecord::Cross(cross) => cross.status,
        }
    }
}

/// One row of the label cart. `uid` is the identity key: re-adding a uid
/// already in the cart bumps its quantity instead of inserting a new row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub uid: String,
    pub identifier: String,
    pub name: String,
    pub quantity: u32,
}

use serde::{Deserialize, Serialize};

/// What the analysis boundary returns: a list of motivational-driver labels
/// plus a short summary. The shape is the external contract; nothing here
/// interprets it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DriverReport {
    pub motivations: Vec<String>,
    pub summary: String,
}

/// The parsed result of an `OPTIONS` capability probe (supplemental to the core protocol;
/// informational only — the state machine never consults it).
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    pub versions: Vec<String>,
    pub extensions: Vec<String>,
    pub max_size: Option<u64>,
}

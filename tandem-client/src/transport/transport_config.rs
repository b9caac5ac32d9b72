pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";

#[derive(Debug, Clone)]
pub struct TurnServer {
    pub url: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Configuration for WebRTC
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub stun_servers: Vec<String>,
    pub turn: Option<TurnServer>,
    pub ice_candidate_pool_size: u8,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                DEFAULT_STUN_ADDR.to_owned(),
                DEFAULT_STUN_ADDR_2.to_owned(),
                DEFAULT_STUN_ADDR_3.to_owned(),
                DEFAULT_STUN_ADDR_4.to_owned(),
            ],
            turn: None,
            ice_candidate_pool_size: 10,
        }
    }
}

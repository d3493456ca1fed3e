use serde::Serialize;

/// Nivel de ocupación derivado del número total de reservas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Congestion {
    Low,
    Moderate,
    High,
}

impl Congestion {
    pub const MODERATE_FROM: usize = 15;
    pub const HIGH_FROM: usize = 30;

    pub fn from_count(count: usize) -> Self {
        if count >= Self::HIGH_FROM {
            Congestion::High
        } else if count >= Self::MODERATE_FROM {
            Congestion::Moderate
        } else {
            Congestion::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Congestion::Low => "空いています",
            Congestion::Moderate => "やや混雑",
            Congestion::High => "非常に混雑",
        }
    }
}

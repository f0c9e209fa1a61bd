use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlates a chat submission with the backend completion that resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    User,
    Assistant,
}

/// One entry in the append-only conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: MessageSender,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: MessageSender::User,
            sent_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: MessageSender::Assistant,
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Moderate => "Moderate Risk",
            RiskTier::High => "High Risk",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskTier::Low => "Maintain regular checkups and a heart-healthy lifestyle.",
            RiskTier::Moderate => {
                "Consider more frequent monitoring and discuss preventive options with your doctor."
            }
            RiskTier::High => "Immediate consultation with a cardiologist is recommended.",
        }
    }
}

/// Reported family history of early cardiovascular disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyHistory {
    None,
    OneParent,
    BothParents,
}

impl FamilyHistory {
    pub const ALL: [FamilyHistory; 3] = [
        FamilyHistory::None,
        FamilyHistory::OneParent,
        FamilyHistory::BothParents,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            FamilyHistory::None => 0,
            FamilyHistory::OneParent => 1,
            FamilyHistory::BothParents => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FamilyHistory::None => "No family history",
            FamilyHistory::OneParent => "One parent affected",
            FamilyHistory::BothParents => "Both parents affected",
        }
    }
}

/// APOE e4 carrier status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApoeStatus {
    NonCarrier,
    OneE4Allele,
    TwoE4Alleles,
}

impl ApoeStatus {
    pub const ALL: [ApoeStatus; 3] = [
        ApoeStatus::NonCarrier,
        ApoeStatus::OneE4Allele,
        ApoeStatus::TwoE4Alleles,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            ApoeStatus::NonCarrier => 0,
            ApoeStatus::OneE4Allele => 1,
            ApoeStatus::TwoE4Alleles => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApoeStatus::NonCarrier => "Non-carrier",
            ApoeStatus::OneE4Allele => "One e4 allele",
            ApoeStatus::TwoE4Alleles => "Two e4 alleles",
        }
    }
}

/// Presence of the 9p21 risk variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant9p21 {
    Absent,
    Present,
}

impl Variant9p21 {
    pub const ALL: [Variant9p21; 2] = [Variant9p21::Absent, Variant9p21::Present];

    pub fn ordinal(self) -> u8 {
        match self {
            Variant9p21::Absent => 0,
            Variant9p21::Present => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant9p21::Absent => "Not detected",
            Variant9p21::Present => "Detected",
        }
    }
}

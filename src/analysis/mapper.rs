use crate::analysis::tables::{
    lookup, CONCLUSION_TABLE, FALLBACK_CONCLUSION, OBSERVATION_TABLE, RISK_TABLE,
};
use crate::models::ClassLabel;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const UNKNOWN_SENTINEL: &str = "Unknown";

/// 风险分数：0-100 的整数，或无法映射时的 "Unknown"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskScore {
    Score(u8),
    Unknown,
}

impl RiskScore {
    pub fn value(self) -> Option<u8> {
        match self {
            RiskScore::Score(score) => Some(score),
            RiskScore::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        self == RiskScore::Unknown
    }
}

impl Serialize for RiskScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RiskScore::Score(score) => serializer.serialize_u8(*score),
            RiskScore::Unknown => serializer.serialize_str(UNKNOWN_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for RiskScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Score(u8),
            Sentinel(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Score(score) if score <= 100 => Ok(RiskScore::Score(score)),
            Raw::Score(score) => Err(D::Error::custom(format!(
                "risk score out of range: {}",
                score
            ))),
            Raw::Sentinel(s) if s == UNKNOWN_SENTINEL => Ok(RiskScore::Unknown),
            Raw::Sentinel(s) => Err(D::Error::custom(format!("unexpected risk score '{}'", s))),
        }
    }
}

/// 返回给调用方的分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub risk_score: RiskScore,
    pub observations: Vec<String>,
    pub conclusion: String,
}

impl AnalysisResult {
    /// 标签无法识别时的兜底结果
    pub fn unknown() -> Self {
        Self {
            risk_score: RiskScore::Unknown,
            observations: Vec::new(),
            conclusion: FALLBACK_CONCLUSION.to_string(),
        }
    }
}

/// 分类标签到临床注释的映射，纯函数，无副作用
pub struct RiskMapper;

impl RiskMapper {
    pub fn analyze(label: ClassLabel) -> AnalysisResult {
        let risk_score = lookup(&RISK_TABLE, label)
            .map(RiskScore::Score)
            .unwrap_or(RiskScore::Unknown);
        let observations = lookup(&OBSERVATION_TABLE, label)
            .map(|items| items.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        let conclusion = lookup(&CONCLUSION_TABLE, label).unwrap_or(FALLBACK_CONCLUSION);

        AnalysisResult {
            risk_score,
            observations,
            conclusion: conclusion.to_string(),
        }
    }

    /// 按标签名称映射；不在已知类别中的名称返回兜底结果
    pub fn analyze_name(name: &str) -> AnalysisResult {
        match name.parse::<ClassLabel>() {
            Ok(label) => Self::analyze(label),
            Err(e) => {
                tracing::warn!("Falling back to unknown analysis: {}", e);
                AnalysisResult::unknown()
            }
        }
    }
}

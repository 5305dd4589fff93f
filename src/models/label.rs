use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 心律失常类别
///
/// 变体顺序即模型输出向量的下标顺序，不可随意调整。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassLabel {
    LeftBundleBranchBlock,
    Normal,
    PrematureAtrialContraction,
    PrematureVentricularContraction,
    RightBundleBranchBlock,
    VentricularFibrillation,
}

impl ClassLabel {
    pub const COUNT: usize = 6;

    /// 按输出下标排列的全部类别
    pub const ALL: [ClassLabel; Self::COUNT] = [
        ClassLabel::LeftBundleBranchBlock,
        ClassLabel::Normal,
        ClassLabel::PrematureAtrialContraction,
        ClassLabel::PrematureVentricularContraction,
        ClassLabel::RightBundleBranchBlock,
        ClassLabel::VentricularFibrillation,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::LeftBundleBranchBlock => "Left Bundle Branch Block",
            ClassLabel::Normal => "Normal",
            ClassLabel::PrematureAtrialContraction => "Premature Atrial Contraction",
            ClassLabel::PrematureVentricularContraction => "Premature Ventricular Contractions",
            ClassLabel::RightBundleBranchBlock => "Right Bundle Branch Block",
            ClassLabel::VentricularFibrillation => "Ventricular Fibrillation",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown arrhythmia label '{}'", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for ClassLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.name() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

impl Serialize for ClassLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, label) in ClassLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(ClassLabel::from_index(i), Some(*label));
        }
        assert_eq!(ClassLabel::from_index(ClassLabel::COUNT), None);
    }

    #[test]
    fn names_parse_back() {
        for label in ClassLabel::ALL {
            assert_eq!(label.name().parse::<ClassLabel>(), Ok(label));
        }
        assert_eq!(
            "Atrial Flutter".parse::<ClassLabel>(),
            Err(UnknownLabel("Atrial Flutter".to_string()))
        );
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&ClassLabel::RightBundleBranchBlock).unwrap();
        assert_eq!(json, "\"Right Bundle Branch Block\"");
    }
}

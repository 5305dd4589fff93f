use crate::models::ClassLabel;
use crate::utils::error::EcgError;
use crate::Result;
use std::collections::HashSet;

pub const FALLBACK_CONCLUSION: &str = "No conclusion available.";

/// 风险分数 (0-100)
pub(crate) static RISK_TABLE: [(ClassLabel, u8); 6] = [
    (ClassLabel::Normal, 10),
    (ClassLabel::PrematureAtrialContraction, 45),
    (ClassLabel::RightBundleBranchBlock, 50),
    (ClassLabel::PrematureVentricularContraction, 75),
    (ClassLabel::LeftBundleBranchBlock, 80),
    (ClassLabel::VentricularFibrillation, 95),
];

/// 观察要点，按展示顺序排列
pub(crate) static OBSERVATION_TABLE: [(ClassLabel, &[&str]); 6] = [
    (
        ClassLabel::Normal,
        &["No abnormalities detected.", "Stable heartbeat."],
    ),
    (
        ClassLabel::PrematureAtrialContraction,
        &["Irregular early beats from atria.", "Potential mild arrhythmia."],
    ),
    (
        ClassLabel::PrematureVentricularContraction,
        &["Extra heartbeats originating from ventricles.", "Monitor for frequency."],
    ),
    (
        ClassLabel::LeftBundleBranchBlock,
        &["Delayed signal in left ventricle.", "May indicate underlying heart disease."],
    ),
    (
        ClassLabel::RightBundleBranchBlock,
        &["Signal delay in right ventricle.", "Could be benign or signal pulmonary condition."],
    ),
    (
        ClassLabel::VentricularFibrillation,
        &["Chaotic electrical activity.", "Requires immediate attention."],
    ),
];

/// 结论
pub(crate) static CONCLUSION_TABLE: [(ClassLabel, &str); 6] = [
    (
        ClassLabel::Normal,
        "ECG shows normal rhythm with no signs of arrhythmia.",
    ),
    (
        ClassLabel::PrematureAtrialContraction,
        "PACs observed. Usually benign but monitor if frequent.",
    ),
    (
        ClassLabel::PrematureVentricularContraction,
        "PVCs present. Could be benign or related to underlying issues.",
    ),
    (
        ClassLabel::LeftBundleBranchBlock,
        "LBBB detected. Further evaluation may be necessary.",
    ),
    (
        ClassLabel::RightBundleBranchBlock,
        "RBBB observed. May not require treatment if asymptomatic.",
    ),
    (
        ClassLabel::VentricularFibrillation,
        "V-Fib detected. Medical emergency — consult cardiologist immediately.",
    ),
];

pub(crate) fn lookup<T: Copy>(table: &[(ClassLabel, T)], label: ClassLabel) -> Option<T> {
    table
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, value)| *value)
}

/// 校验三张表与 `ClassLabel::ALL` 的键集完全一致，且内容合法
pub fn validate_tables() -> Result<()> {
    check_keys("risk", RISK_TABLE.iter().map(|(label, _)| *label))?;
    check_keys("observation", OBSERVATION_TABLE.iter().map(|(label, _)| *label))?;
    check_keys("conclusion", CONCLUSION_TABLE.iter().map(|(label, _)| *label))?;

    for (label, score) in RISK_TABLE.iter() {
        if *score > 100 {
            return Err(EcgError::Config(format!(
                "Risk score for '{}' out of range: {}",
                label, score
            )));
        }
    }
    for (label, observations) in OBSERVATION_TABLE.iter() {
        if observations.is_empty() || observations.iter().any(|o| o.trim().is_empty()) {
            return Err(EcgError::Config(format!("Empty observation for '{}'", label)));
        }
    }
    for (label, conclusion) in CONCLUSION_TABLE.iter() {
        if conclusion.trim().is_empty() {
            return Err(EcgError::Config(format!("Empty conclusion for '{}'", label)));
        }
    }

    Ok(())
}

fn check_keys(table: &str, keys: impl Iterator<Item = ClassLabel>) -> Result<()> {
    let mut seen = HashSet::new();
    for label in keys {
        if !seen.insert(label) {
            return Err(EcgError::Config(format!(
                "Duplicate entry for '{}' in {} table",
                label, table
            )));
        }
    }

    let missing: Vec<&str> = ClassLabel::ALL
        .iter()
        .filter(|label| !seen.contains(*label))
        .map(|label| label.name())
        .collect();
    if !missing.is_empty() {
        return Err(EcgError::Config(format!(
            "{} table is missing entries for: {}",
            table,
            missing.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_tables_are_valid() {
        validate_tables().unwrap();
    }

    #[test]
    fn detects_missing_and_duplicate_keys() {
        let missing = ClassLabel::ALL.iter().copied().skip(1);
        match check_keys("risk", missing) {
            Err(EcgError::Config(msg)) => assert!(msg.contains("Left Bundle Branch Block")),
            other => panic!("expected config error, got {:?}", other),
        }

        let duplicated = ClassLabel::ALL
            .iter()
            .copied()
            .chain(std::iter::once(ClassLabel::Normal));
        assert!(matches!(
            check_keys("conclusion", duplicated),
            Err(EcgError::Config(_))
        ));
    }

    #[test]
    fn lookup_finds_every_label() {
        for label in ClassLabel::ALL {
            assert!(lookup(&RISK_TABLE, label).is_some());
            assert!(lookup(&OBSERVATION_TABLE, label).is_some());
            assert!(lookup(&CONCLUSION_TABLE, label).is_some());
        }
    }
}

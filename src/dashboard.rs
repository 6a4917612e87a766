//! Admin risk dashboard
//!
//! Groups stored quiz progress by trainer and labels every record with its
//! risk level. Trainers without any progress records are left out.
//!
//! Levels come from [`RiskLevel::from_score`], the same four buckets the
//! scorer returns (breakpoints 25/50/75). This replaces the older admin
//! page's three-bucket scale (Low < 40, Medium < 70, else High), so a stored
//! risk of 25.0 now shows as Medium rather than Low.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::RiskLevel;

pub const UNKNOWN_COURSE: &str = "Unknown Course";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// `None` when the course was deleted
    pub course_name: Option<String>,
    pub score: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProgress {
    pub student_name: String,
    pub records: Vec<ProgressRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerRoster {
    pub trainer_name: String,
    pub students: Vec<StudentProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRiskRow {
    pub student_name: String,
    pub course_name: String,
    pub score: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerRiskSummary {
    pub trainer_name: String,
    pub students: Vec<StudentRiskRow>,
    pub level_counts: BTreeMap<RiskLevel, usize>,
    pub mean_risk: f64,
}

impl TrainerRiskSummary {
    /// Rows at `High` or above, highest risk first
    pub fn at_risk(&self) -> Vec<&StudentRiskRow> {
        let mut rows: Vec<&StudentRiskRow> = self
            .students
            .iter()
            .filter(|r| r.risk_level >= RiskLevel::High)
            .collect();
        rows.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        rows
    }

    pub fn highest_level(&self) -> Option<RiskLevel> {
        self.students.iter().map(|r| r.risk_level).max()
    }
}

/// One summary per trainer with at least one progress record, in roster order.
pub fn build_risk_dashboard(rosters: &[TrainerRoster]) -> Vec<TrainerRiskSummary> {
    rosters.iter().filter_map(summarize_trainer).collect()
}

fn summarize_trainer(roster: &TrainerRoster) -> Option<TrainerRiskSummary> {
    let students: Vec<StudentRiskRow> = roster
        .students
        .iter()
        .flat_map(|student| {
            student.records.iter().map(move |record| StudentRiskRow {
                student_name: student.student_name.clone(),
                course_name: record
                    .course_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_COURSE.to_string()),
                score: record.score,
                risk_score: record.risk_score,
                risk_level: RiskLevel::from_score(record.risk_score),
            })
        })
        .collect();

    if students.is_empty() {
        return None;
    }

    let mut level_counts: BTreeMap<RiskLevel, usize> =
        RiskLevel::ALL.into_iter().map(|l| (l, 0)).collect();
    for row in &students {
        *level_counts.entry(row.risk_level).or_insert(0) += 1;
    }
    let mean_risk = students.iter().map(|r| r.risk_score).sum::<f64>() / students.len() as f64;

    Some(TrainerRiskSummary {
        trainer_name: roster.trainer_name.clone(),
        students,
        level_counts,
        mean_risk,
    })
}

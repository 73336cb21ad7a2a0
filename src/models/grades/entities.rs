use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::models::common::define_string_enum;

define_string_enum! {
    /// 等级成绩
    #[ts(export, export_to = "grade.ts")]
    pub enum LetterGrade {
        A => "A",
        B => "B",
        C => "C",
        D => "D",
        F => "F",
    }
}

impl LetterGrade {
    /// 百分制换算：A≥90，B≥80，C≥70，D≥60，其余为 F
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            LetterGrade::A
        } else if percentage >= 80.0 {
            LetterGrade::B
        } else if percentage >= 70.0 {
            LetterGrade::C
        } else if percentage >= 60.0 {
            LetterGrade::D
        } else {
            LetterGrade::F
        }
    }

    pub fn grade_point(&self) -> f64 {
        match self {
            LetterGrade::A => 4.0,
            LetterGrade::B => 3.0,
            LetterGrade::C => 2.0,
            LetterGrade::D => 1.0,
            LetterGrade::F => 0.0,
        }
    }
}

/// 得分占满分的百分比
pub fn percentage(score: f64, max_score: f64) -> f64 {
    if max_score <= 0.0 {
        return 0.0;
    }
    score * 100.0 / max_score
}

// 成绩实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct Grade {
    pub id: i64,
    pub school_id: i64,
    pub student_id: i64,
    pub teacher_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub subject: String,
    pub term: String,
    pub score: f64,
    pub max_score: f64,
    pub letter: LetterGrade,
    pub grade_point: f64,
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 单科平均
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct SubjectAverage {
    pub subject: String,
    pub count: usize,
    pub average_percentage: f64,
    pub letter: LetterGrade,
    pub grade_point: f64,
}

/// 学生成绩汇总
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeSummary {
    pub student_id: i64,
    pub term: Option<String>,
    pub subjects: Vec<SubjectAverage>,
    /// 各科平均对应绩点的均值，无成绩时为 None
    pub gpa: Option<f64>,
}

impl GradeSummary {
    /// 按科目聚合：先求每科平均百分比，再换算绩点，GPA 为各科绩点均值
    pub fn from_grades(student_id: i64, term: Option<String>, grades: &[Grade]) -> Self {
        let mut by_subject: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for grade in grades {
            by_subject
                .entry(grade.subject.as_str())
                .or_default()
                .push(percentage(grade.score, grade.max_score));
        }

        let subjects: Vec<SubjectAverage> = by_subject
            .into_iter()
            .map(|(subject, values)| {
                let average = values.iter().sum::<f64>() / values.len() as f64;
                let letter = LetterGrade::from_percentage(average);
                SubjectAverage {
                    subject: subject.to_string(),
                    count: values.len(),
                    average_percentage: round2(average),
                    letter,
                    grade_point: letter.grade_point(),
                }
            })
            .collect();

        let gpa = if subjects.is_empty() {
            None
        } else {
            Some(round2(
                subjects.iter().map(|s| s.grade_point).sum::<f64>() / subjects.len() as f64,
            ))
        };

        Self {
            student_id,
            term,
            subjects,
            gpa,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(subject: &str, score: f64, max_score: f64) -> Grade {
        let letter = LetterGrade::from_percentage(percentage(score, max_score));
        Grade {
            id: 0,
            school_id: 1,
            student_id: 7,
            teacher_id: None,
            assignment_id: None,
            subject: subject.to_string(),
            term: "2025-T1".to_string(),
            score,
            max_score,
            letter,
            grade_point: letter.grade_point(),
            comment: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_letter_boundaries() {
        assert_eq!(LetterGrade::from_percentage(100.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(90.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(89.99), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(80.0), LetterGrade::B);
        assert_eq!(LetterGrade::from_percentage(70.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::D);
        assert_eq!(LetterGrade::from_percentage(59.9), LetterGrade::F);
        assert_eq!(LetterGrade::B.grade_point(), 3.0);
    }

    #[test]
    fn test_percentage_with_zero_max() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(45.0, 50.0), 90.0);
    }

    #[test]
    fn test_summary_averages_per_subject() {
        let grades = vec![
            grade("math", 95.0, 100.0),
            grade("math", 85.0, 100.0),
            grade("history", 30.0, 50.0),
        ];
        let summary = GradeSummary::from_grades(7, None, &grades);
        assert_eq!(summary.subjects.len(), 2);

        let history = &summary.subjects[0];
        assert_eq!(history.subject, "history");
        assert_eq!(history.average_percentage, 60.0);
        assert_eq!(history.letter, LetterGrade::D);

        let math = &summary.subjects[1];
        assert_eq!(math.count, 2);
        assert_eq!(math.average_percentage, 90.0);
        assert_eq!(math.letter, LetterGrade::A);

        // (4.0 + 1.0) / 2
        assert_eq!(summary.gpa, Some(2.5));
    }

    #[test]
    fn test_summary_without_grades() {
        let summary = GradeSummary::from_grades(7, Some("T1".into()), &[]);
        assert!(summary.subjects.is_empty());
        assert_eq!(summary.gpa, None);
    }
}

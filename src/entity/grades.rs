//! 成绩实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub school_id: i64,
    pub student_id: i64,
    pub teacher_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub subject: String,
    pub term: String,
    #[sea_orm(column_type = "Double")]
    pub score: f64,
    #[sea_orm(column_type = "Double")]
    pub max_score: f64,
    pub letter: String,
    #[sea_orm(column_type = "Double")]
    pub grade_point: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_grade(self) -> crate::models::grades::entities::Grade {
        use crate::models::grades::entities::{Grade, LetterGrade, percentage};

        let letter = self
            .letter
            .parse()
            .unwrap_or_else(|_| LetterGrade::from_percentage(percentage(self.score, self.max_score)));

        Grade {
            id: self.id,
            school_id: self.school_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            assignment_id: self.assignment_id,
            subject: self.subject,
            term: self.term,
            score: self.score,
            max_score: self.max_score,
            letter,
            grade_point: self.grade_point,
            comment: self.comment,
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}

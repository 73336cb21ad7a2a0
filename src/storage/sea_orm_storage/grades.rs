//! 成绩存储操作

use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::grades::{ActiveModel, Column, Entity as Grades};
use crate::errors::Result;
use crate::models::{
    common::normalize_page,
    grades::{
        entities::{Grade, LetterGrade, percentage},
        requests::{GradeListParams, GradeUpdate, NewGrade},
        responses::GradeListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 录入成绩，等级与绩点由分数换算
    pub async fn create_grade_impl(&self, new: NewGrade) -> Result<Grade> {
        let now = now_ts();
        let letter = LetterGrade::from_percentage(percentage(new.score, new.max_score));

        let model = ActiveModel {
            school_id: Set(new.school_id),
            student_id: Set(new.student_id),
            teacher_id: Set(new.teacher_id),
            assignment_id: Set(new.assignment_id),
            subject: Set(new.subject),
            term: Set(new.term),
            score: Set(new.score),
            max_score: Set(new.max_score),
            letter: Set(letter.to_string()),
            grade_point: Set(letter.grade_point()),
            comment: Set(new.comment),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("录入成绩失败"))?;
        Ok(result.into_grade())
    }

    pub async fn get_grade_by_id_impl(&self, id: i64) -> Result<Option<Grade>> {
        let result = Grades::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询成绩失败"))?;

        Ok(result.map(|m| m.into_grade()))
    }

    /// 分页列出成绩
    pub async fn list_grades_with_pagination_impl(
        &self,
        school_id: Option<i64>,
        params: GradeListParams,
    ) -> Result<GradeListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = Grades::find();

        if let Some(school_id) = school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }
        if let Some(student_id) = params.student_id {
            select = select.filter(Column::StudentId.eq(student_id));
        }
        if let Some(assignment_id) = params.assignment_id {
            select = select.filter(Column::AssignmentId.eq(assignment_id));
        }
        if let Some(subject) = params.subject {
            select = select.filter(Column::Subject.eq(subject));
        }
        if let Some(term) = params.term {
            select = select.filter(Column::Term.eq(term));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let (grades, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询成绩列表失败"))?;

        Ok(GradeListResponse {
            items: grades.into_iter().map(|m| m.into_grade()).collect(),
            pagination,
        })
    }

    /// 学生全部成绩（可按学期）
    pub async fn list_student_grades_impl(
        &self,
        student_id: i64,
        term: Option<&str>,
    ) -> Result<Vec<Grade>> {
        let mut select = Grades::find().filter(Column::StudentId.eq(student_id));
        if let Some(term) = term {
            select = select.filter(Column::Term.eq(term));
        }

        let grades = select
            .order_by_asc(Column::Subject)
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err("查询学生成绩失败"))?;

        Ok(grades.into_iter().map(|m| m.into_grade()).collect())
    }

    /// 更新成绩并重新换算等级
    pub async fn update_grade_impl(&self, id: i64, update: GradeUpdate) -> Result<Option<Grade>> {
        let Some(existing) = Grades::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询成绩失败"))?
        else {
            return Ok(None);
        };

        let letter = LetterGrade::from_percentage(percentage(update.score, update.max_score));

        let mut model = existing.into_active_model();
        model.score = Set(update.score);
        model.max_score = Set(update.max_score);
        model.letter = Set(letter.to_string());
        model.grade_point = Set(letter.grade_point());
        model.updated_at = Set(now_ts());

        if let Some(subject) = update.subject {
            model.subject = Set(subject);
        }
        if let Some(term) = update.term {
            model.term = Set(term);
        }
        if let Some(comment) = update.comment {
            model.comment = Set(Some(comment));
        }

        let result = model.update(&self.db).await.map_err(db_err("更新成绩失败"))?;
        Ok(Some(result.into_grade()))
    }

    pub async fn delete_grade_impl(&self, id: i64) -> Result<bool> {
        let result = Grades::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除成绩失败"))?;

        Ok(result.rows_affected > 0)
    }
}

//! 班级存储操作

use super::{SeaOrmStorage, db_err, fetch_page, now_ts};
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::entity::{student_profiles, users};
use crate::errors::Result;
use crate::models::{
    common::normalize_page,
    classes::{
        entities::Class,
        requests::{ClassListParams, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    users::entities::User,
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set, ExprTrait, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(&self, school_id: i64, req: CreateClassRequest) -> Result<Class> {
        let now = now_ts();

        let model = ActiveModel {
            school_id: Set(school_id),
            name: Set(req.name),
            grade_level: Set(req.grade_level),
            class_teacher_id: Set(req.class_teacher_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_err("创建班级失败"))?;
        Ok(result.into_class())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询班级失败"))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 分页列出班级
    pub async fn list_classes_with_pagination_impl(
        &self,
        school_id: Option<i64>,
        params: ClassListParams,
    ) -> Result<ClassListResponse> {
        let (page, size) = normalize_page(params.page, params.size);

        let mut select = Classes::find();

        if let Some(school_id) = school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }

        if let Some(ref grade_level) = params.grade_level {
            select = select.filter(Column::GradeLevel.eq(grade_level.clone()));
        }

        if let Some(ref search) = params.search
            && !search.trim().is_empty()
        {
            select = select.filter(Expr::col(Column::Name).like(like_contains(search)));
        }

        select = select.order_by_asc(Column::Name).order_by_asc(Column::Id);

        let (classes, pagination) = fetch_page(&self.db, select, page, size)
            .await
            .map_err(db_err("查询班级列表失败"))?;

        Ok(ClassListResponse {
            items: classes.into_iter().map(|m| m.into_class()).collect(),
            pagination,
        })
    }

    /// 学校全部班级（导入时按名称匹配）
    pub async fn list_school_classes_impl(&self, school_id: i64) -> Result<Vec<Class>> {
        let classes = Classes::find()
            .filter(Column::SchoolId.eq(school_id))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err("查询班级列表失败"))?;

        Ok(classes.into_iter().map(|m| m.into_class()).collect())
    }

    /// 更新班级信息
    pub async fn update_class_impl(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        let Some(existing) = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询班级失败"))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        model.updated_at = Set(now_ts());

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(grade_level) = update.grade_level {
            model.grade_level = Set(Some(grade_level));
        }
        if let Some(teacher_id) = update.class_teacher_id {
            model.class_teacher_id = Set(Some(teacher_id));
        }

        let result = model.update(&self.db).await.map_err(db_err("更新班级失败"))?;
        Ok(Some(result.into_class()))
    }

    /// 删除班级（学生资料中的班级引用置空）
    pub async fn delete_class_impl(&self, class_id: i64) -> Result<bool> {
        student_profiles::Entity::update_many()
            .col_expr(
                student_profiles::Column::ClassId,
                Expr::value(Option::<i64>::None),
            )
            .filter(student_profiles::Column::ClassId.eq(class_id))
            .exec(&self.db)
            .await
            .map_err(db_err("解除学生班级关联失败"))?;

        let result = Classes::delete_by_id(class_id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除班级失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 班级学生
    pub async fn list_class_students_impl(&self, class_id: i64) -> Result<Vec<User>> {
        let student_ids: Vec<i64> = student_profiles::Entity::find()
            .select_only()
            .column(student_profiles::Column::UserId)
            .filter(student_profiles::Column::ClassId.eq(class_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询班级学生失败"))?;

        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let students = users::Entity::find()
            .filter(users::Column::Id.is_in(student_ids))
            .order_by_asc(users::Column::FullName)
            .all(&self.db)
            .await
            .map_err(db_err("查询班级学生失败"))?;

        Ok(students.into_iter().map(|m| m.into_user()).collect())
    }
}

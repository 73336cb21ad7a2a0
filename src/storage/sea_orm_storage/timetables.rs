//! 课程表存储操作

use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::timetables::{ActiveModel, Column, Entity as Timetables};
use crate::errors::Result;
use crate::models::timetables::{
    entities::TimetableEntry,
    requests::{TimetableListParams, TimetableSlot},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

impl SeaOrmStorage {
    pub async fn create_timetable_entry_impl(&self, slot: TimetableSlot) -> Result<TimetableEntry> {
        let now = now_ts();

        let model = ActiveModel {
            school_id: Set(slot.school_id),
            class_id: Set(slot.class_id),
            teacher_id: Set(slot.teacher_id),
            subject: Set(slot.subject),
            day_of_week: Set(slot.day_of_week),
            period: Set(slot.period),
            start_time: Set(slot.start_time),
            end_time: Set(slot.end_time),
            room: Set(slot.room),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_err("创建课程表条目失败"))?;
        Ok(result.into_entry())
    }

    pub async fn get_timetable_entry_impl(&self, id: i64) -> Result<Option<TimetableEntry>> {
        let result = Timetables::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询课程表条目失败"))?;

        Ok(result.map(|m| m.into_entry()))
    }

    /// 按星期、节次排序列出课程表
    pub async fn list_timetable_entries_impl(
        &self,
        school_id: Option<i64>,
        params: TimetableListParams,
    ) -> Result<Vec<TimetableEntry>> {
        let mut select = Timetables::find();

        if let Some(school_id) = school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }
        if let Some(class_id) = params.class_id {
            select = select.filter(Column::ClassId.eq(class_id));
        }
        if let Some(teacher_id) = params.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }
        if let Some(day) = params.day_of_week {
            select = select.filter(Column::DayOfWeek.eq(day));
        }

        let entries = select
            .order_by_asc(Column::DayOfWeek)
            .order_by_asc(Column::Period)
            .order_by_asc(Column::ClassId)
            .all(&self.db)
            .await
            .map_err(db_err("查询课程表失败"))?;

        Ok(entries.into_iter().map(|m| m.into_entry()).collect())
    }

    /// 以合并后的完整值覆盖条目
    pub async fn update_timetable_entry_impl(
        &self,
        id: i64,
        slot: TimetableSlot,
    ) -> Result<Option<TimetableEntry>> {
        let Some(existing) = Timetables::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询课程表条目失败"))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        model.teacher_id = Set(slot.teacher_id);
        model.subject = Set(slot.subject);
        model.day_of_week = Set(slot.day_of_week);
        model.period = Set(slot.period);
        model.start_time = Set(slot.start_time);
        model.end_time = Set(slot.end_time);
        model.room = Set(slot.room);
        model.updated_at = Set(now_ts());

        let result = model
            .update(&self.db)
            .await
            .map_err(db_err("更新课程表条目失败"))?;
        Ok(Some(result.into_entry()))
    }

    pub async fn delete_timetable_entry_impl(&self, id: i64) -> Result<bool> {
        let result = Timetables::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除课程表条目失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 教师在同一时段是否已有课程
    pub async fn teacher_slot_taken_impl(
        &self,
        teacher_id: i64,
        day_of_week: i32,
        period: i32,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let mut select = Timetables::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::DayOfWeek.eq(day_of_week))
            .filter(Column::Period.eq(period));
        if let Some(exclude_id) = exclude_id {
            select = select.filter(Column::Id.ne(exclude_id));
        }

        let count = select
            .count(&self.db)
            .await
            .map_err(db_err("查询教师课时失败"))?;
        Ok(count > 0)
    }
}

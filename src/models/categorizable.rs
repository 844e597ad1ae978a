use chrono::NaiveDateTime;
use diesel::prelude::*;

/// Insertable row of the polymorphic `categorizables` join table.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::categorizables)]
pub struct NewCategorizable<'a> {
    pub categorizable_id: i32,
    pub categorizable_type: &'a str,
    pub category_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

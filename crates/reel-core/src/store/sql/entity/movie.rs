use sea_orm::entity::prelude::*;

/// Movie row. Genres live in [`super::movie_genre`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    pub year: i32,

    pub director: String,

    /// Minutes. Stored wide so any `u32` fits.
    pub duration: i64,

    pub poster: String,

    pub rate: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

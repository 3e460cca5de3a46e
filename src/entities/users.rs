use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lower-cased; all lookups and uniqueness checks use this form.
    #[sea_orm(unique)]
    pub username: String,

    /// Stored lower-cased for case-insensitive uniqueness.
    #[sea_orm(unique)]
    pub email: String,

    pub full_name: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    pub avatar_url: String,

    pub cover_image_url: Option<String>,

    /// The single currently-valid refresh token. Null means no session.
    pub refresh_token: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::videos::Entity")]
    Videos,
}

impl Related<super::videos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Videos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

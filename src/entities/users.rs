use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub location: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// 1 = admin, 2 = musician, 3 = employer
    pub role_id: i32,

    pub activated: bool,

    pub activation_hash: Option<String>,

    pub activation_sent_at: Option<String>,

    pub reset_hash: Option<String>,

    pub reset_sent_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::gigs::Entity")]
    Gigs,
    #[sea_orm(has_many = "super::remember_tokens::Entity")]
    RememberTokens,
    #[sea_orm(has_many = "super::applications::Entity")]
    Applications,
}

impl Related<super::gigs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gigs.def()
    }
}

impl Related<super::remember_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RememberTokens.def()
    }
}

impl Related<super::applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::*;

use crate::{
    entities::{users, RoleEnum, UserEntity},
    errors::ApiResult,
    services::database::DatabaseConnection,
};

pub struct UserService;

impl UserService {
    /// 用户是否为管理员，用户不存在或已停用时视为否
    pub async fn is_admin(db: &DatabaseConnection, user_id: i32) -> ApiResult<bool> {
        let user = UserEntity::find_by_id(user_id)
            .filter(users::Column::Role.eq(RoleEnum::Admin))
            .filter(users::Column::IsActive.eq(true))
            .one(db.as_ref())
            .await?;

        Ok(user.is_some())
    }
}

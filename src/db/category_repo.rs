use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::entities::category;
use super::entities::prelude::Category;

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<category::Model>, sea_orm::DbErr> {
    Category::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
}

pub async fn insert(
    db: &DatabaseConnection,
    name: &str,
) -> Result<category::Model, sea_orm::DbErr> {
    let model = category::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    model.insert(db).await
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, sea_orm::DbErr> {
    let result = Category::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

pub async fn exists(db: &DatabaseConnection, id: i32) -> Result<bool, sea_orm::DbErr> {
    let count = Category::find()
        .filter(category::Column::Id.eq(id))
        .count(db)
        .await?;
    Ok(count > 0)
}

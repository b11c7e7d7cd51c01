use sea_orm::DatabaseConnection;

use crate::{
    db::{category_repo, entities::category, todo_repo},
    error::AppError,
};

const NAME_MAX_CHARS: usize = 100;

pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>, AppError> {
    Ok(category_repo::list_all(db).await?)
}

pub async fn create_category(
    db: &DatabaseConnection,
    name: Option<String>,
) -> Result<category::Model, AppError> {
    let name = validate_name(name.as_deref())?;
    Ok(category_repo::insert(db, &name).await?)
}

/// Deleting a category is blocked while any todo item still references it;
/// the caller must reassign or delete dependents first.
pub async fn delete_category(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    if !category_repo::exists(db, id).await? {
        return Err(AppError::not_found("Category not found"));
    }
    if todo_repo::count_by_category(db, id).await? > 0 {
        return Err(AppError::conflict(
            "Category still has todo items attached",
        ));
    }
    category_repo::delete(db, id).await?;
    Ok(())
}

fn validate_name(name: Option<&str>) -> Result<String, AppError> {
    let trimmed = name.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Category name is required"));
    }
    if trimmed.chars().count() > NAME_MAX_CHARS {
        return Err(AppError::bad_request(
            "Category name must be at most 100 characters",
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        assert!(validate_name(None).is_err());
        assert!(validate_name(Some("")).is_err());
        assert!(validate_name(Some("   ")).is_err());
    }

    #[test]
    fn name_is_capped_at_100_characters() {
        assert!(validate_name(Some(&"x".repeat(101))).is_err());
        assert_eq!(validate_name(Some(&"x".repeat(100))).unwrap(), "x".repeat(100));
        assert_eq!(validate_name(Some(" Work ")).unwrap(), "Work");
    }
}

#[allow(unused_imports)]
pub mod prelude {
    pub use super::category::Entity as Category;
    pub use super::todo_item::Entity as TodoItem;
}

pub mod category {
    use sea_orm::entity::prelude::*;

    #[sea_orm::model]
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "categories")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        #[sea_orm(has_many)]
        pub todos: HasMany<super::todo_item::Entity>,
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod todo_item {
    use sea_orm::entity::prelude::*;

    #[sea_orm::model]
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "todo_items")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        #[sea_orm(default_value = false)]
        pub is_completed: bool,
        #[sea_orm(default_expr = "Expr::current_timestamp()")]
        pub created_at: DateTimeWithTimeZone,
        pub due_time: Option<DateTimeWithTimeZone>,
        #[sea_orm(indexed)]
        pub category_id: Option<i32>,
        // Reserved column, not exposed through any endpoint.
        pub tags: Option<Json>,
        #[sea_orm(belongs_to, from = "category_id", to = "id", on_delete = "Restrict")]
        pub category: HasOne<super::category::Entity>,
    }

    impl ActiveModelBehavior for ActiveModel {}
}
